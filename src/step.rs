// ABOUTME: Named remote steps used to tag errors and platform warnings.
// ABOUTME: Every call against the platform runs under exactly one of these names.

use crate::types::DropletGuid;
use std::fmt;

/// A named unit of remote work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CreateBitsPackage,
    UploadBits,
    WaitPackageReady,
    CreateBuild,
    WaitBuildStaged,
    GetBuild,
    GetBuiltDroplet,
    CreateDockerPackage,
    CreateDockerBuild,
    WaitDockerBuildStaged,
    GetDockerBuild,
    GetBuiltDockerDroplet,
    CreateDeployment(DropletGuid),
    WaitDeployment,
    GetNewApplicationProcesses,
    WaitProcessStable,
    GetApplicationProcesses,
    GetApplication,
    GetApplicationStateDuringDeployment,
    StartApplication,
    StopApplication,
    SetCurrentDroplet,
    GetCurrentDroplet,
    GetDesiredDropletForDeployment,
    UpdateEnvironment,
    UpdateAppLifecycleType,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::CreateBitsPackage => "create-bits-package",
            Step::UploadBits => "upload-bits",
            Step::WaitPackageReady => "wait-package-ready",
            Step::CreateBuild => "create-build",
            Step::WaitBuildStaged => "wait-build-staged",
            Step::GetBuild => "get-build",
            Step::GetBuiltDroplet => "get-built-droplet",
            Step::CreateDockerPackage => "create-docker-package",
            Step::CreateDockerBuild => "create-docker-build",
            Step::WaitDockerBuildStaged => "wait-docker-build-staged",
            Step::GetDockerBuild => "get-docker-build",
            Step::GetBuiltDockerDroplet => "get-built-docker-droplet",
            Step::CreateDeployment(_) => "create-deployment",
            Step::WaitDeployment => "wait-deployment",
            Step::GetNewApplicationProcesses => "get-new-application-processes",
            Step::WaitProcessStable => "wait-process-stable",
            Step::GetApplicationProcesses => "get-application-processes",
            Step::GetApplication => "get-application",
            Step::GetApplicationStateDuringDeployment => "get-application-state-during-deployment",
            Step::StartApplication => "start-application",
            Step::StopApplication => "stop-application",
            Step::SetCurrentDroplet => "set-current-droplet",
            Step::GetCurrentDroplet => "get-current-droplet",
            Step::GetDesiredDropletForDeployment => "get-desired-droplet-for-deployment",
            Step::UpdateEnvironment => "update-environment",
            Step::UpdateAppLifecycleType => "update-app-lifecycle-type",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::CreateDeployment(droplet) => write!(f, "{} droplet:{}", self.name(), droplet),
            _ => f.write_str(self.name()),
        }
    }
}
