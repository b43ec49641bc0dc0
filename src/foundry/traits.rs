// ABOUTME: Composable capability traits for the Cloud Foundry v3 API.
// ABOUTME: Packages, builds, droplets, deployments, processes, and applications.

use super::error::FoundryError;
use super::models::{
    Application, Build, Deployment, Droplet, EnvironmentPatch, Lifecycle, Package, PackageSource,
    Process, ProcessInstance, Reply,
};
use crate::types::{AppGuid, BuildGuid, DeploymentGuid, DropletGuid, PackageGuid, ProcessGuid};
use async_trait::async_trait;
use bytes::Bytes;

pub type FoundryResult<T> = Result<Reply<T>, FoundryError>;

/// Package creation and upload.
#[async_trait]
pub trait PackageOps: Send + Sync {
    async fn create_package(&self, app: &AppGuid, source: &PackageSource)
    -> FoundryResult<Package>;

    /// Upload the archive bytes of a bits package. The size sent is `bits.len()`.
    async fn upload_package_bits(&self, package: &PackageGuid, bits: Bytes)
    -> FoundryResult<Package>;

    async fn get_package(&self, package: &PackageGuid) -> FoundryResult<Package>;
}

/// Staging builds.
#[async_trait]
pub trait BuildOps: Send + Sync {
    async fn create_build(&self, package: &PackageGuid) -> FoundryResult<Build>;

    async fn get_build(&self, build: &BuildGuid) -> FoundryResult<Build>;
}

/// Droplets and the application's current droplet.
#[async_trait]
pub trait DropletOps: Send + Sync {
    async fn get_droplet(&self, droplet: &DropletGuid) -> FoundryResult<Droplet>;

    /// `None` when the application has never had a droplet assigned.
    async fn get_current_droplet(&self, app: &AppGuid) -> FoundryResult<Option<Droplet>>;

    async fn set_current_droplet(&self, app: &AppGuid, droplet: &DropletGuid)
    -> FoundryResult<()>;
}

/// Rolling deployments.
#[async_trait]
pub trait DeploymentOps: Send + Sync {
    async fn create_deployment(
        &self,
        app: &AppGuid,
        droplet: &DropletGuid,
    ) -> FoundryResult<Deployment>;

    async fn get_deployment(&self, deployment: &DeploymentGuid) -> FoundryResult<Deployment>;

    /// Processes created by the deployment, with their desired instance counts.
    async fn get_new_processes(&self, deployment: &DeploymentGuid) -> FoundryResult<Vec<Process>>;
}

/// Processes and their running instances.
#[async_trait]
pub trait ProcessOps: Send + Sync {
    async fn get_application_processes(&self, app: &AppGuid) -> FoundryResult<Vec<Process>>;

    async fn get_process(&self, process: &ProcessGuid) -> FoundryResult<Process>;

    async fn get_process_instances(
        &self,
        process: &ProcessGuid,
    ) -> FoundryResult<Vec<ProcessInstance>>;
}

/// Application reads, run state, and settings.
#[async_trait]
pub trait AppOps: Send + Sync {
    async fn get_application(&self, app: &AppGuid) -> FoundryResult<Application>;

    async fn start_application(&self, app: &AppGuid) -> FoundryResult<Application>;

    async fn stop_application(&self, app: &AppGuid) -> FoundryResult<Application>;

    async fn update_lifecycle(&self, app: &AppGuid, lifecycle: &Lifecycle)
    -> FoundryResult<Application>;

    async fn update_environment(&self, app: &AppGuid, patch: &EnvironmentPatch)
    -> FoundryResult<()>;
}

/// Everything the staging and rollout engine needs from the platform.
pub trait Foundry: PackageOps + BuildOps + DropletOps + DeploymentOps + ProcessOps + AppOps {}

impl<T> Foundry for T where
    T: PackageOps + BuildOps + DropletOps + DeploymentOps + ProcessOps + AppOps
{
}
