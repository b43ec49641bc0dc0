// ABOUTME: Application lifecycle types understood by the platform.
// ABOUTME: Buildpack and docker are staged by cfrollout; kpack is recognised only.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleType {
    #[default]
    Buildpack,
    Docker,
    Kpack,
}

impl LifecycleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleType::Buildpack => "buildpack",
            LifecycleType::Docker => "docker",
            LifecycleType::Kpack => "kpack",
        }
    }
}

impl fmt::Display for LifecycleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
