// ABOUTME: Errors of a full application update.
// ABOUTME: Wraps validation, staging and rollout failures without losing their kind.

use super::validate::ValidationError;
use crate::deploy::{DeployError, DeployErrorKind};
use crate::foundry::FoundryError;
use crate::stage::{StageError, StageErrorKind};
use crate::step::Step;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LifecycleError {
    #[snafu(display("invalid configuration for {app}: {source}"))]
    Invalid {
        app: String,
        source: ValidationError,
    },

    #[snafu(display("{step}: {source}"))]
    Api { step: Step, source: FoundryError },

    #[snafu(context(false), display("staging failed: {source}"))]
    Stage { source: StageError },

    #[snafu(context(false), display("{source}"))]
    Deploy { source: DeployError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleErrorKind {
    Validation,
    Remote,
    Stage(StageErrorKind),
    Deploy(DeployErrorKind),
}

impl LifecycleError {
    pub fn kind(&self) -> LifecycleErrorKind {
        match self {
            LifecycleError::Invalid { .. } => LifecycleErrorKind::Validation,
            LifecycleError::Api { .. } => LifecycleErrorKind::Remote,
            LifecycleError::Stage { source } => LifecycleErrorKind::Stage(source.kind()),
            LifecycleError::Deploy { source } => LifecycleErrorKind::Deploy(source.kind()),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.kind(),
            LifecycleErrorKind::Stage(StageErrorKind::Cancelled)
                | LifecycleErrorKind::Deploy(DeployErrorKind::Cancelled)
        )
    }

    /// True when the application disappeared part way through.
    pub fn is_app_gone(&self) -> bool {
        self.kind() == LifecycleErrorKind::Deploy(DeployErrorKind::AppGone)
    }
}
