// ABOUTME: Configuration types and parsing for cfrollout.yml.
// ABOUTME: Handles YAML parsing, secret resolution, and application lookup.

mod api;
mod app;
mod deserialize;
mod env_value;
mod init;
mod timeouts;

pub use api::ApiConfig;
pub use app::AppConfig;
pub use env_value::{EnvValue, resolve_env_map};
pub use init::init_config;
pub use timeouts::{RetryConfig, TimeoutsConfig, update_settings};

use crate::error::{Error, Result};
use crate::lifecycle::UpdateSettings;
use deserialize::deserialize_apps;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "cfrollout.yml";
pub const CONFIG_FILENAME_ALT: &str = "cfrollout.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".cfrollout/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(deserialize_with = "deserialize_apps")]
    pub apps: NonEmpty<AppConfig>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading configuration");
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn app(&self, name: &str) -> Result<&AppConfig> {
        self.apps
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::UnknownApp(name.to_string()))
    }

    /// Apps selected by name, or all of them.
    pub fn select(&self, name: Option<&str>) -> Result<Vec<&AppConfig>> {
        match name {
            Some(name) => self.app(name).map(|a| vec![a]),
            None => Ok(self.apps.iter().collect()),
        }
    }

    pub fn update_settings(&self, app: &AppConfig) -> UpdateSettings {
        update_settings(&self.timeouts, &self.retry, app.zero_instances)
    }
}
