// ABOUTME: Staging pipeline errors with SNAFU context selectors.
// ABOUTME: Every remote failure names the step that produced it.

use crate::foundry::FoundryError;
use crate::poll::WaitError;
use crate::step::Step;
use crate::types::BuildGuid;
use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StageError {
    #[snafu(display("source_code_path required for lifecycle type buildpack"))]
    MissingSourcePath,

    #[snafu(display("cannot read source archive {}: {source}", path.display()))]
    ReadArchive {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("source archive {} is not a regular file", path.display()))]
    NotAFile { path: PathBuf },

    #[snafu(display("{step}: {source}"))]
    Api { step: Step, source: FoundryError },

    #[snafu(display("{step}: {source}"))]
    Wait { step: Step, source: WaitError },

    #[snafu(display("{step}: build {build} finished staging without a droplet"))]
    MissingDroplet { step: Step, build: BuildGuid },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorKind {
    /// Rejected locally before any remote call.
    Validation,
    /// A platform call failed.
    Remote,
    /// A package or build job did not finish in time.
    Timeout,
    /// A package or build job reached a failed state.
    JobFailed,
    /// A resource disappeared while being waited on.
    NotFound,
    Cancelled,
}

impl StageError {
    pub fn kind(&self) -> StageErrorKind {
        match self {
            StageError::MissingSourcePath
            | StageError::ReadArchive { .. }
            | StageError::NotAFile { .. } => StageErrorKind::Validation,
            StageError::Api { source, .. } if source.is_not_found() => StageErrorKind::NotFound,
            StageError::Api { .. } => StageErrorKind::Remote,
            StageError::Wait { source, .. } => match source {
                WaitError::Timeout { .. } => StageErrorKind::Timeout,
                WaitError::Failed { .. } => StageErrorKind::JobFailed,
                WaitError::NotFound { .. } => StageErrorKind::NotFound,
                WaitError::Refresh { .. } => StageErrorKind::Remote,
                WaitError::Cancelled { .. } => StageErrorKind::Cancelled,
            },
            StageError::MissingDroplet { .. } => StageErrorKind::JobFailed,
        }
    }

    /// The step that failed, if the failure was remote.
    pub fn step(&self) -> Option<&Step> {
        match self {
            StageError::Api { step, .. }
            | StageError::Wait { step, .. }
            | StageError::MissingDroplet { step, .. } => Some(step),
            _ => None,
        }
    }
}
