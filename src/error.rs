// ABOUTME: Application-wide error types for cfrollout.
// ABOUTME: Uses thiserror; step-tagged pipeline errors are wrapped, not flattened.

use crate::deploy::DeployError;
use crate::foundry::FoundryError;
use crate::lifecycle::LifecycleError;
use crate::stage::StageError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown application: {0}")]
    UnknownApp(String),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("cannot read secret file {path}: {source}")]
    SecretFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("applied record {path} is unreadable: {source}")]
    CorruptRecord {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Foundry(#[from] FoundryError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// True when the operation stopped because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Interrupted => true,
            Error::Stage(e) => e.kind() == crate::stage::StageErrorKind::Cancelled,
            Error::Deploy(e) => e.is_cancelled(),
            Error::Lifecycle(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
