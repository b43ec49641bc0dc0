// ABOUTME: Rollout state markers for the type state pattern.
// ABOUTME: Each state carries exactly the data the next transition needs.

use crate::foundry::Process;
use crate::types::DeploymentGuid;

/// Nothing created yet.
/// Available actions: `create()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Requested;

/// Deployment created and rolling.
/// Available actions: `await_finalized()`
#[derive(Debug, Clone)]
pub struct Deploying {
    pub(crate) deployment: DeploymentGuid,
}

/// Deployment finalized with reason DEPLOYED.
/// Available actions: `discover_processes()`
#[derive(Debug, Clone)]
pub struct Finalized {
    pub(crate) deployment: DeploymentGuid,
}

/// New processes known.
/// Available actions: `stabilize()`
#[derive(Debug, Clone)]
pub struct Discovered {
    pub(crate) deployment: DeploymentGuid,
    pub(crate) processes: Vec<Process>,
}

/// Every new process is stable.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Stabilized {
    pub(crate) deployment: DeploymentGuid,
}
