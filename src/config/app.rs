// ABOUTME: Per-application configuration entries.
// ABOUTME: Converts an entry into the desired state the lifecycle manager applies.

use super::deserialize::{
    deserialize_app_guid, deserialize_app_name, deserialize_docker_image_option,
};
use super::env_value::{EnvValue, resolve_env_map};
use crate::error::{Error, Result};
use crate::foundry::{AppState, RegistryCredentials};
use crate::lifecycle::{DesiredApp, LifecycleSpec};
use crate::stability::ZeroInstancePolicy;
use crate::types::{AppGuid, DockerImage, LifecycleType};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Also names the applied record file, so it must be a plain file stem.
    #[serde(deserialize_with = "deserialize_app_name")]
    pub name: String,

    #[serde(deserialize_with = "deserialize_app_guid")]
    pub guid: AppGuid,

    #[serde(default)]
    pub lifecycle: LifecycleType,

    #[serde(default)]
    pub buildpacks: Vec<String>,

    #[serde(default)]
    pub stack: Option<String>,

    /// Zip archive of the application source, relative to the project directory.
    #[serde(default)]
    pub source_code_path: Option<PathBuf>,

    #[serde(default)]
    pub source_code_hash: Option<String>,

    #[serde(default, deserialize_with = "deserialize_docker_image_option")]
    pub docker_image: Option<DockerImage>,

    #[serde(default)]
    pub docker_username: Option<String>,

    #[serde(default)]
    pub docker_password: Option<EnvValue>,

    #[serde(default)]
    pub environment: BTreeMap<String, EnvValue>,

    #[serde(default = "default_state")]
    pub state: AppState,

    #[serde(default)]
    pub zero_instances: ZeroInstancePolicy,
}

fn default_state() -> AppState {
    AppState::Started
}

impl AppConfig {
    /// Registry credentials, which need both a username and a password.
    pub fn registry_credentials(&self) -> Result<Option<RegistryCredentials>> {
        match (&self.docker_username, &self.docker_password) {
            (None, None) => Ok(None),
            (Some(username), Some(password)) => Ok(Some(RegistryCredentials {
                username: username.clone(),
                password: password.resolve()?,
            })),
            _ => Err(Error::InvalidConfig(format!(
                "{}: docker_username and docker_password must be set together",
                self.name
            ))),
        }
    }

    /// Resolve secrets and paths into the state to apply.
    ///
    /// Relative source paths are taken from `root`.
    pub fn desired(&self, root: &Path) -> Result<DesiredApp> {
        let lifecycle = match self.lifecycle {
            LifecycleType::Buildpack => {
                if self.docker_image.is_some() {
                    return Err(Error::InvalidConfig(format!(
                        "{}: docker_image requires lifecycle docker",
                        self.name
                    )));
                }
                LifecycleSpec::Buildpack {
                    buildpacks: self.buildpacks.clone(),
                    stack: self.stack.clone(),
                    source_path: self.source_code_path.as_ref().map(|p| root.join(p)),
                    source_hash: self.source_code_hash.clone(),
                }
            }
            LifecycleType::Docker => LifecycleSpec::Docker {
                image: self.docker_image.clone(),
                credentials: self.registry_credentials()?,
            },
            LifecycleType::Kpack => LifecycleSpec::Kpack,
        };

        Ok(DesiredApp {
            guid: self.guid.clone(),
            name: self.name.clone(),
            lifecycle,
            environment: resolve_env_map(&self.environment)?,
            state: self.state,
        })
    }
}
