// ABOUTME: JSON documents exchanged with the /v3 API and their conversion to models.
// ABOUTME: Only the fields cfrollout reads are declared; everything else is ignored.

use super::models::{
    AppState, Application, Build, BuildState, Deployment, DeploymentStatus,
    DeploymentStatusValue, Droplet, InstanceState, Lifecycle, Package, PackageState, PackageType,
    Process, ProcessInstance,
};
use crate::types::{Guid, LifecycleType, ProcessGuid};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GuidRef {
    pub guid: String,
}

#[derive(Debug, Deserialize)]
pub struct List<T> {
    #[serde(default = "Vec::new")]
    pub resources: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct PackageDoc {
    guid: String,
    #[serde(rename = "type")]
    kind: PackageType,
    state: PackageState,
}

impl From<PackageDoc> for Package {
    fn from(doc: PackageDoc) -> Self {
        Package {
            guid: Guid::new(doc.guid),
            kind: doc.kind,
            state: doc.state,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BuildDoc {
    guid: String,
    state: BuildState,
    #[serde(default)]
    droplet: Option<GuidRef>,
    #[serde(default)]
    error: Option<String>,
}

impl From<BuildDoc> for Build {
    fn from(doc: BuildDoc) -> Self {
        Build {
            guid: Guid::new(doc.guid),
            state: doc.state,
            droplet: doc.droplet.map(|d| Guid::new(d.guid)),
            error: doc.error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BuildpackDoc {
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct DropletDoc {
    guid: String,
    #[serde(default)]
    buildpacks: Option<Vec<BuildpackDoc>>,
    #[serde(default)]
    stack: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

impl From<DropletDoc> for Droplet {
    fn from(doc: DropletDoc) -> Self {
        Droplet {
            guid: Guid::new(doc.guid),
            buildpacks: doc
                .buildpacks
                .unwrap_or_default()
                .into_iter()
                .map(|b| b.name)
                .collect(),
            stack: doc.stack,
            image: doc.image,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusDoc {
    value: DeploymentStatusValue,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewProcessDoc {
    pub guid: String,
}

#[derive(Debug, Deserialize)]
pub struct DeploymentDoc {
    guid: String,
    status: StatusDoc,
    #[serde(default)]
    droplet: Option<GuidRef>,
    #[serde(default)]
    pub new_processes: Vec<NewProcessDoc>,
}

impl DeploymentDoc {
    pub fn new_process_guids(&self) -> Vec<ProcessGuid> {
        self.new_processes
            .iter()
            .map(|p| Guid::new(p.guid.clone()))
            .collect()
    }
}

impl From<DeploymentDoc> for Deployment {
    fn from(doc: DeploymentDoc) -> Self {
        Deployment {
            guid: Guid::new(doc.guid),
            droplet: doc.droplet.map(|d| Guid::new(d.guid)),
            status: DeploymentStatus {
                value: doc.status.value,
                reason: doc.status.reason.unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProcessDoc {
    guid: String,
    #[serde(rename = "type")]
    process_type: String,
    #[serde(default)]
    instances: u32,
}

impl From<ProcessDoc> for Process {
    fn from(doc: ProcessDoc) -> Self {
        Process {
            guid: Guid::new(doc.guid),
            process_type: doc.process_type,
            instances: doc.instances,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InstanceDoc {
    #[serde(default)]
    index: u32,
    state: InstanceState,
}

impl From<InstanceDoc> for ProcessInstance {
    fn from(doc: InstanceDoc) -> Self {
        ProcessInstance {
            index: doc.index,
            state: doc.state,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct LifecycleDataDoc {
    #[serde(default)]
    buildpacks: Vec<String>,
    #[serde(default)]
    stack: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LifecycleDoc {
    #[serde(rename = "type")]
    kind: LifecycleType,
    #[serde(default)]
    data: LifecycleDataDoc,
}

#[derive(Debug, Deserialize)]
pub struct AppDoc {
    guid: String,
    name: String,
    state: AppState,
    lifecycle: LifecycleDoc,
}

impl From<AppDoc> for Application {
    fn from(doc: AppDoc) -> Self {
        Application {
            guid: Guid::new(doc.guid),
            name: doc.name,
            state: doc.state,
            lifecycle: Lifecycle {
                kind: doc.lifecycle.kind,
                buildpacks: doc.lifecycle.data.buildpacks,
                stack: doc.lifecycle.data.stack,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorDoc {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorsDoc {
    #[serde(default)]
    pub errors: Vec<ErrorDoc>,
}
