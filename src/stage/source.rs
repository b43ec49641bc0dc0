// ABOUTME: Where a droplet is staged from: a local archive or a docker image.
// ABOUTME: Archive sources are validated and read before anything remote happens.

use super::error::{NotAFileSnafu, ReadArchiveSnafu, StageError};
use crate::foundry::RegistryCredentials;
use crate::types::DockerImage;
use bytes::Bytes;
use snafu::{ResultExt, ensure};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// A zip archive uploaded as package bits.
    Archive { path: PathBuf },
    /// A docker image the platform pulls itself.
    Image {
        image: DockerImage,
        credentials: Option<RegistryCredentials>,
    },
}

impl SourceSpec {
    pub fn archive(path: impl Into<PathBuf>) -> Self {
        SourceSpec::Archive { path: path.into() }
    }

    pub fn image(image: DockerImage) -> Self {
        SourceSpec::Image {
            image,
            credentials: None,
        }
    }
}

/// Check that `path` names a readable regular file and load it.
pub async fn read_archive(path: &Path) -> Result<Bytes, StageError> {
    ensure!(
        !path.as_os_str().is_empty(),
        super::error::MissingSourcePathSnafu
    );

    let metadata = tokio::fs::metadata(path).await.context(ReadArchiveSnafu { path })?;
    ensure!(metadata.is_file(), NotAFileSnafu { path });

    let bits = tokio::fs::read(path).await.context(ReadArchiveSnafu { path })?;
    tracing::debug!(path = %path.display(), size = bits.len(), "read source archive");
    Ok(Bytes::from(bits))
}
