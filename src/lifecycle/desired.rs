// ABOUTME: Desired application configuration and the inputs recorded after applying it.
// ABOUTME: Secrets are stored as SHA-256 fingerprints, never in clear text.

use crate::foundry::{AppState, Lifecycle, RegistryCredentials};
use crate::stage::SourceSpec;
use crate::types::{AppGuid, DockerImage, LifecycleType};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// How the application is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleSpec {
    Buildpack {
        buildpacks: Vec<String>,
        stack: Option<String>,
        source_path: Option<PathBuf>,
        source_hash: Option<String>,
    },
    Docker {
        image: Option<DockerImage>,
        credentials: Option<RegistryCredentials>,
    },
    Kpack,
}

impl LifecycleSpec {
    pub fn kind(&self) -> LifecycleType {
        match self {
            LifecycleSpec::Buildpack { .. } => LifecycleType::Buildpack,
            LifecycleSpec::Docker { .. } => LifecycleType::Docker,
            LifecycleSpec::Kpack => LifecycleType::Kpack,
        }
    }

    /// The lifecycle the platform application should carry.
    pub fn to_lifecycle(&self) -> Lifecycle {
        match self {
            LifecycleSpec::Buildpack {
                buildpacks, stack, ..
            } => Lifecycle {
                kind: LifecycleType::Buildpack,
                buildpacks: buildpacks.clone(),
                stack: stack.clone(),
            },
            other => Lifecycle {
                kind: other.kind(),
                buildpacks: Vec::new(),
                stack: None,
            },
        }
    }

    /// What a droplet would be staged from, if anything is configured.
    pub fn source(&self) -> Option<SourceSpec> {
        match self {
            LifecycleSpec::Buildpack {
                source_path: Some(path),
                ..
            } => Some(SourceSpec::archive(path)),
            LifecycleSpec::Docker {
                image: Some(image),
                credentials,
            } => Some(SourceSpec::Image {
                image: image.clone(),
                credentials: credentials.clone(),
            }),
            _ => None,
        }
    }
}

/// What an application should look like after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredApp {
    pub guid: AppGuid,
    pub name: String,
    pub lifecycle: LifecycleSpec,
    pub environment: BTreeMap<String, String>,
    pub state: AppState,
}

impl DesiredApp {
    pub fn inputs(&self) -> AppliedInputs {
        let mut inputs = AppliedInputs {
            lifecycle: self.lifecycle.kind(),
            environment: self
                .environment
                .iter()
                .map(|(k, v)| (k.clone(), fingerprint(v)))
                .collect(),
            ..AppliedInputs::default()
        };
        match &self.lifecycle {
            LifecycleSpec::Buildpack {
                buildpacks,
                stack,
                source_path,
                source_hash,
            } => {
                inputs.buildpacks = buildpacks.clone();
                inputs.stack = stack.clone();
                inputs.source_path = source_path.clone();
                inputs.source_hash = source_hash.clone();
            }
            LifecycleSpec::Docker { image, credentials } => {
                inputs.docker_image = image.as_ref().map(|i| i.to_string());
                inputs.docker_credentials = credentials
                    .as_ref()
                    .map(|c| format!("{}:{}", c.username, fingerprint(&c.password)));
            }
            LifecycleSpec::Kpack => {}
        }
        inputs
    }
}

/// The staging-relevant inputs of the last successful update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedInputs {
    pub lifecycle: LifecycleType,
    #[serde(default)]
    pub buildpacks: Vec<String>,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub source_path: Option<PathBuf>,
    #[serde(default)]
    pub source_hash: Option<String>,
    #[serde(default)]
    pub docker_image: Option<String>,
    /// `username:sha256(password)`.
    #[serde(default)]
    pub docker_credentials: Option<String>,
    /// Variable name to sha256 of its value.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

/// Hex SHA-256 of `value`.
pub fn fingerprint(value: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(value.as_ref()))
}
