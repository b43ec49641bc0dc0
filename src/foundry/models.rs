// ABOUTME: Domain models for platform resources: packages, builds, droplets, deployments.
// ABOUTME: Also processes, instances, applications, and request payloads sent to the API.

use crate::diagnostics::Diagnostics;
use crate::step::Step;
use crate::types::{
    AppGuid, BuildGuid, DeploymentGuid, DockerImage, DropletGuid, LifecycleType, PackageGuid,
    ProcessGuid,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A response value plus the warnings the platform attached to it.
#[derive(Debug, Clone)]
pub struct Reply<T> {
    pub value: T,
    pub warnings: Vec<String>,
}

impl<T> Reply<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<String>) -> Self {
        Self { value, warnings }
    }

    /// Move the warnings into `diag` under `step` and hand back the value.
    pub fn record(self, diag: &mut Diagnostics, step: &Step) -> T {
        diag.platform_warnings(step, self.warnings);
        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Bits,
    Docker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageState {
    AwaitingUpload,
    ProcessingUpload,
    Copying,
    Ready,
    Failed,
    Expired,
    #[serde(other)]
    Unknown,
}

impl PackageState {
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            PackageState::AwaitingUpload | PackageState::ProcessingUpload | PackageState::Copying
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub guid: PackageGuid,
    pub kind: PackageType,
    pub state: PackageState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildState {
    Staging,
    Staged,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
    pub guid: BuildGuid,
    pub state: BuildState,
    /// Set once the build has produced a droplet.
    pub droplet: Option<DropletGuid>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Droplet {
    pub guid: DropletGuid,
    pub buildpacks: Vec<String>,
    pub stack: Option<String>,
    pub image: Option<String>,
}

/// Deployment progress as reported by the platform.
///
/// Older platforms report `DEPLOYED` and `CANCELED` as values rather than
/// reasons; both are terminal and treated as finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatusValue {
    Active,
    Deploying,
    Finalized,
    Deployed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl DeploymentStatusValue {
    pub fn is_finalized(&self) -> bool {
        matches!(
            self,
            DeploymentStatusValue::Finalized
                | DeploymentStatusValue::Deployed
                | DeploymentStatusValue::Canceled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStatus {
    pub value: DeploymentStatusValue,
    pub reason: String,
}

pub const DEPLOYED_REASON: &str = "DEPLOYED";

impl DeploymentStatus {
    pub fn succeeded(&self) -> bool {
        match self.value {
            DeploymentStatusValue::Deployed => true,
            DeploymentStatusValue::Finalized => self.reason.eq_ignore_ascii_case(DEPLOYED_REASON),
            _ => false,
        }
    }

    /// The reason to report for a finalized deployment that did not succeed.
    pub fn failure_reason(&self) -> &str {
        match self.value {
            DeploymentStatusValue::Canceled if self.reason.is_empty() => "CANCELED",
            _ if self.reason.is_empty() => "unknown",
            _ => &self.reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub guid: DeploymentGuid,
    pub droplet: Option<DropletGuid>,
    pub status: DeploymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub guid: ProcessGuid,
    pub process_type: String,
    /// Desired instance count.
    pub instances: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceState {
    Running,
    Crashed,
    Starting,
    Down,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInstance {
    pub index: u32,
    pub state: InstanceState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppState {
    Started,
    Stopped,
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppState::Started => f.write_str("STARTED"),
            AppState::Stopped => f.write_str("STOPPED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Lifecycle {
    pub kind: LifecycleType,
    #[serde(default)]
    pub buildpacks: Vec<String>,
    #[serde(default)]
    pub stack: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub guid: AppGuid,
    pub name: String,
    pub state: AppState,
    pub lifecycle: Lifecycle,
}

/// Credentials for a private docker registry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What a new package is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSource {
    /// Bits uploaded after creation.
    Bits,
    /// An image the platform pulls itself.
    Docker {
        image: DockerImage,
        credentials: Option<RegistryCredentials>,
    },
}

impl PackageSource {
    pub fn kind(&self) -> PackageType {
        match self {
            PackageSource::Bits => PackageType::Bits,
            PackageSource::Docker { .. } => PackageType::Docker,
        }
    }
}

/// Environment variable changes; `None` removes the variable.
pub type EnvironmentPatch = BTreeMap<String, Option<String>>;
