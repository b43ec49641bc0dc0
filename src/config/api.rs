// ABOUTME: API endpoint configuration.
// ABOUTME: The token is usually read from the environment rather than the file.

use super::env_value::EnvValue;
use crate::error::Result;
use crate::foundry::SessionConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub url: String,

    #[serde(default = "default_token")]
    pub token: EnvValue,

    #[serde(default)]
    pub skip_ssl_validation: bool,
}

fn default_token() -> EnvValue {
    EnvValue::FromEnv {
        var: "CF_TOKEN".to_string(),
        default: None,
    }
}

impl ApiConfig {
    pub fn session_config(&self) -> Result<SessionConfig> {
        Ok(SessionConfig::new(&self.url, self.token.resolve()?)
            .skip_ssl_validation(self.skip_ssl_validation))
    }
}
