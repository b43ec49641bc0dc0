// ABOUTME: Client seam for the Cloud Foundry v3 control-plane API.
// ABOUTME: Capability traits, domain models, the session, and the HTTP implementation.

mod error;
mod http;
mod models;
mod session;
mod traits;
mod wire;

pub use error::FoundryError;
pub use http::HttpFoundry;
pub use models::{
    AppState, Application, Build, BuildState, DEPLOYED_REASON, Deployment, DeploymentStatus,
    DeploymentStatusValue, Droplet, EnvironmentPatch, InstanceState, Lifecycle, Package,
    PackageSource, PackageState, PackageType, Process, ProcessInstance, RegistryCredentials, Reply,
};
pub use session::{Session, SessionConfig};
pub use traits::{
    AppOps, BuildOps, DeploymentOps, DropletOps, Foundry, FoundryResult, PackageOps, ProcessOps,
};
