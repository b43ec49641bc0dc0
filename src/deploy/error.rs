// ABOUTME: Rollout and reconciliation errors with SNAFU context selectors.
// ABOUTME: Errors name their failed step; kind() classifies them for callers.

use crate::foundry::FoundryError;
use crate::poll::WaitError;
use crate::step::Step;
use crate::types::AppGuid;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DeployError {
    #[snafu(display("{step}: {source}"))]
    Api { step: Step, source: FoundryError },

    #[snafu(display("{step}: {source}"))]
    Wait { step: Step, source: WaitError },

    #[snafu(display("{step}: application {app} no longer exists"))]
    AppGone { step: Step, app: AppGuid },

    #[snafu(display("rollout failed after {attempts} attempt(s): {source}"))]
    AttemptsExhausted {
        attempts: u32,
        source: Box<DeployError>,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// A platform call failed.
    Remote,
    /// A deployment or process did not settle in time.
    Timeout,
    /// The deployment finalized with a reason other than deployed.
    DeploymentFailed,
    /// Every instance of a process crashed.
    Crashed,
    /// A resource other than the application disappeared.
    NotFound,
    /// The application itself is gone; local tracking should be dropped.
    AppGone,
    Cancelled,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Api { source, .. } if source.is_not_found() => DeployErrorKind::NotFound,
            DeployError::Api { .. } => DeployErrorKind::Remote,
            DeployError::Wait { step, source } => match source {
                WaitError::Timeout { .. } => DeployErrorKind::Timeout,
                WaitError::Failed { .. } if *step == Step::WaitProcessStable => {
                    DeployErrorKind::Crashed
                }
                WaitError::Failed { .. } => DeployErrorKind::DeploymentFailed,
                WaitError::NotFound { .. } => DeployErrorKind::NotFound,
                WaitError::Refresh { .. } => DeployErrorKind::Remote,
                WaitError::Cancelled { .. } => DeployErrorKind::Cancelled,
            },
            DeployError::AppGone { .. } => DeployErrorKind::AppGone,
            DeployError::AttemptsExhausted { source, .. } => source.kind(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == DeployErrorKind::Cancelled
    }

    /// The error of the final attempt, looking through retry exhaustion.
    pub fn last_error(&self) -> &DeployError {
        match self {
            DeployError::AttemptsExhausted { source, .. } => source.last_error(),
            other => other,
        }
    }

    /// The step that failed.
    pub fn step(&self) -> &Step {
        match self {
            DeployError::Api { step, .. }
            | DeployError::Wait { step, .. }
            | DeployError::AppGone { step, .. } => step,
            DeployError::AttemptsExhausted { source, .. } => source.step(),
        }
    }
}

/// Map a failed application read: not-found means the application is gone.
pub(crate) fn app_read_error(step: Step, app: &AppGuid, source: FoundryError) -> DeployError {
    if source.is_not_found() {
        DeployError::AppGone {
            step,
            app: app.clone(),
        }
    } else {
        DeployError::Api { step, source }
    }
}
