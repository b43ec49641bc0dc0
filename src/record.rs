// ABOUTME: Local record of what was last applied to each application.
// ABOUTME: Stored as JSON under .cfrollout/state and dropped when an app is gone.

use crate::error::{Error, Result};
use crate::lifecycle::AppliedInputs;
use crate::types::{AppGuid, DeploymentGuid, DropletGuid};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const STATE_DIR: &str = ".cfrollout/state";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRecord {
    pub app: String,
    pub app_guid: AppGuid,
    #[serde(default)]
    pub droplet: Option<DropletGuid>,
    #[serde(default)]
    pub deployment: Option<DeploymentGuid>,
    pub inputs: AppliedInputs,
    pub applied_by: String,
    pub applied_at: DateTime<Utc>,
}

impl AppliedRecord {
    /// A record stamped with this host and the current time.
    pub fn new(
        app: impl Into<String>,
        app_guid: AppGuid,
        droplet: Option<DropletGuid>,
        deployment: Option<DeploymentGuid>,
        inputs: AppliedInputs,
    ) -> Self {
        Self {
            app: app.into(),
            app_guid,
            droplet,
            deployment,
            inputs,
            applied_by: gethostname::gethostname().to_string_lossy().into_owned(),
            applied_at: Utc::now(),
        }
    }
}

/// Directory of applied records, one file per application.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The store below a project directory.
    pub fn in_project(root: &Path) -> Self {
        Self::new(root.join(STATE_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, app: &str) -> PathBuf {
        self.dir.join(format!("{app}.json"))
    }

    pub fn load(&self, app: &str) -> Result<Option<AppliedRecord>> {
        let path = self.path_for(app);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| Error::CorruptRecord { path, source })
    }

    pub fn save(&self, record: &AppliedRecord) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(record)
            .map_err(|source| Error::CorruptRecord {
                path: self.path_for(&record.app),
                source,
            })?;
        std::fs::write(self.path_for(&record.app), json)?;
        tracing::debug!(app = %record.app, dir = %self.dir.display(), "applied record saved");
        Ok(())
    }

    /// Remove the record for `app`; a missing record is not an error.
    pub fn forget(&self, app: &str) -> Result<bool> {
        match std::fs::remove_file(self.path_for(app)) {
            Ok(()) => {
                tracing::info!(app, "applied record removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
