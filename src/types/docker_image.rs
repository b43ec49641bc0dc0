// ABOUTME: Docker image references as accepted by docker-lifecycle packages.
// ABOUTME: Validates shape but keeps the user's spelling, since the platform pulls it verbatim.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DockerImageError {
    #[error("docker image cannot be empty")]
    Empty,

    #[error("docker image contains whitespace: {0:?}")]
    Whitespace(String),

    #[error("invalid docker image reference: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerImage {
    raw: String,
    repository_end: usize,
}

impl DockerImage {
    pub fn parse(input: &str) -> Result<Self, DockerImageError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(DockerImageError::Empty);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(DockerImageError::Whitespace(raw.to_string()));
        }
        if raw.starts_with('/') || raw.ends_with('/') || raw.ends_with(':') || raw.ends_with('@')
        {
            return Err(DockerImageError::InvalidFormat(raw.to_string()));
        }

        // The repository ends at the digest marker, or at a colon that
        // follows the last path separator (a colon before it is a registry port).
        let before_digest = raw.find('@').unwrap_or(raw.len());
        let last_slash = raw[..before_digest].rfind('/').map_or(0, |i| i + 1);
        let repository_end = raw[last_slash..before_digest]
            .find(':')
            .map_or(before_digest, |i| last_slash + i);

        if repository_end == 0 {
            return Err(DockerImageError::InvalidFormat(raw.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            repository_end,
        })
    }

    /// Registry, namespace, and name without tag or digest.
    pub fn repository(&self) -> &str {
        &self.raw[..self.repository_end]
    }

    pub fn tag(&self) -> Option<&str> {
        let rest = &self.raw[self.repository_end..];
        let rest = rest.split('@').next().unwrap_or_default();
        rest.strip_prefix(':')
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for DockerImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
