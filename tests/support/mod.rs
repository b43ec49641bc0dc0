// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup and a scripted in-memory platform fake.

use async_trait::async_trait;
use bytes::Bytes;
use cfrollout::foundry::{
    AppOps, AppState, Application, Build, BuildOps, BuildState, Deployment, DeploymentOps,
    DeploymentStatus, DeploymentStatusValue, Droplet, DropletOps, EnvironmentPatch, FoundryError,
    FoundryResult, InstanceState, Lifecycle, Package, PackageOps, PackageSource, PackageState,
    Process, ProcessInstance, ProcessOps, Reply,
};
use cfrollout::types::{
    AppGuid, BuildGuid, DeploymentGuid, DropletGuid, PackageGuid, ProcessGuid,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("cfrollout=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Answers handed out in order; the last one repeats forever.
pub struct Script<T> {
    queue: VecDeque<Result<T, FoundryError>>,
    last: Option<Result<T, FoundryError>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            last: None,
        }
    }
}

#[allow(dead_code)]
impl<T: Clone> Script<T> {
    pub fn of(answers: impl IntoIterator<Item = T>) -> Self {
        let mut script = Self::default();
        for answer in answers {
            script.push(answer);
        }
        script
    }

    pub fn push(&mut self, answer: T) {
        self.queue.push_back(Ok(answer));
    }

    pub fn fail(&mut self, error: FoundryError) {
        self.queue.push_back(Err(error));
    }

    /// Drop anything still queued and answer `answer` from now on.
    pub fn always(&mut self, answer: T) {
        self.queue.clear();
        self.queue.push_back(Ok(answer));
    }

    fn next(&mut self, what: &str) -> Result<T, FoundryError> {
        if let Some(answer) = self.queue.pop_front() {
            self.last = Some(answer);
        }
        self.last
            .clone()
            .unwrap_or_else(|| Err(FoundryError::InvalidRequest(format!("nothing scripted for {what}"))))
    }
}

pub struct FakeState {
    pub calls: Vec<String>,
    /// Platform warnings attached to every reply of the named method.
    pub warnings: HashMap<&'static str, Vec<String>>,
    pub app: Option<Application>,
    /// The application disappears after this many reads.
    pub vanish_after_reads: Option<usize>,
    pub current_droplet: Option<DropletGuid>,
    pub package_polls: Script<PackageState>,
    pub build_polls: Script<Build>,
    pub deployment_polls: Script<DeploymentStatus>,
    pub create_deployment_errors: VecDeque<FoundryError>,
    pub new_processes: Vec<Process>,
    pub app_processes: Vec<Process>,
    pub instance_polls: Script<Vec<InstanceState>>,
    pub env_patches: Vec<EnvironmentPatch>,
    pub lifecycles: Vec<Lifecycle>,
    pub uploads: Vec<usize>,
    pub created_deployments: Vec<DropletGuid>,
    counter: u32,
}

/// A platform with one stopped app, whose jobs all succeed on the first poll.
pub struct FakeFoundry {
    state: Mutex<FakeState>,
}

#[allow(dead_code)]
pub fn app_guid() -> AppGuid {
    AppGuid::new("app-1")
}

#[allow(dead_code)]
pub fn staged_build(droplet: &str) -> Build {
    Build {
        guid: BuildGuid::new("unset"),
        state: BuildState::Staged,
        droplet: Some(DropletGuid::new(droplet)),
        error: None,
    }
}

#[allow(dead_code)]
pub fn finalized(reason: &str) -> DeploymentStatus {
    DeploymentStatus {
        value: DeploymentStatusValue::Finalized,
        reason: reason.to_string(),
    }
}

#[allow(dead_code)]
pub fn deploying() -> DeploymentStatus {
    DeploymentStatus {
        value: DeploymentStatusValue::Active,
        reason: "DEPLOYING".to_string(),
    }
}

#[allow(dead_code)]
pub fn web_process(guid: &str, instances: u32) -> Process {
    Process {
        guid: ProcessGuid::new(guid),
        process_type: "web".to_string(),
        instances,
    }
}

impl Default for FakeFoundry {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl FakeFoundry {
    pub fn new() -> Self {
        let web = web_process("proc-1", 2);
        let state = FakeState {
            calls: Vec::new(),
            warnings: HashMap::new(),
            app: Some(Application {
                guid: app_guid(),
                name: "web".to_string(),
                state: AppState::Stopped,
                lifecycle: Lifecycle::default(),
            }),
            vanish_after_reads: None,
            current_droplet: None,
            package_polls: Script::of([PackageState::Ready]),
            build_polls: Script::of([staged_build("droplet-new")]),
            deployment_polls: Script::of([finalized("DEPLOYED")]),
            create_deployment_errors: VecDeque::new(),
            new_processes: vec![web.clone()],
            app_processes: vec![web],
            instance_polls: Script::of([vec![InstanceState::Running, InstanceState::Running]]),
            env_patches: Vec::new(),
            lifecycles: Vec::new(),
            uploads: Vec::new(),
            created_deployments: Vec::new(),
            counter: 0,
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Adjust the scripted platform.
    pub fn script(&self, f: impl FnOnce(&mut FakeState)) -> &Self {
        f(&mut self.state.lock());
        self
    }

    pub fn inspect<R>(&self, f: impl FnOnce(&FakeState) -> R) -> R {
        f(&self.state.lock())
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == method).count()
    }

    fn answer<T>(&self, method: &'static str, f: impl FnOnce(&mut FakeState) -> Result<T, FoundryError>) -> FoundryResult<T> {
        let mut state = self.state.lock();
        state.calls.push(method.to_string());
        let value = f(&mut state)?;
        let warnings = state.warnings.get(method).cloned().unwrap_or_default();
        Ok(Reply::with_warnings(value, warnings))
    }
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}-{}", self.counter)
    }

    fn read_app(&mut self) -> Result<Application, FoundryError> {
        if let Some(remaining) = self.vanish_after_reads.as_mut() {
            if *remaining == 0 {
                self.app = None;
            } else {
                *remaining -= 1;
            }
        }
        self.app
            .clone()
            .ok_or_else(|| FoundryError::not_found("app app-1"))
    }

    fn set_app_state(&mut self, state: AppState) -> Result<Application, FoundryError> {
        let app = self
            .app
            .as_mut()
            .ok_or_else(|| FoundryError::not_found("app app-1"))?;
        app.state = state;
        Ok(app.clone())
    }

    fn find_process(&self, guid: &ProcessGuid) -> Option<Process> {
        self.new_processes
            .iter()
            .chain(&self.app_processes)
            .find(|p| &p.guid == guid)
            .cloned()
    }
}

#[async_trait]
impl PackageOps for FakeFoundry {
    async fn create_package(&self, _app: &AppGuid, source: &PackageSource) -> FoundryResult<Package> {
        self.answer("create_package", |s| {
            Ok(Package {
                guid: PackageGuid::new(s.next_id("package")),
                kind: source.kind(),
                state: PackageState::AwaitingUpload,
            })
        })
    }

    async fn upload_package_bits(&self, package: &PackageGuid, bits: Bytes) -> FoundryResult<Package> {
        self.answer("upload_package_bits", |s| {
            s.uploads.push(bits.len());
            Ok(Package {
                guid: package.clone(),
                kind: cfrollout::foundry::PackageType::Bits,
                state: PackageState::ProcessingUpload,
            })
        })
    }

    async fn get_package(&self, package: &PackageGuid) -> FoundryResult<Package> {
        self.answer("get_package", |s| {
            let state = s.package_polls.next("get_package")?;
            Ok(Package {
                guid: package.clone(),
                kind: cfrollout::foundry::PackageType::Bits,
                state,
            })
        })
    }
}

#[async_trait]
impl BuildOps for FakeFoundry {
    async fn create_build(&self, _package: &PackageGuid) -> FoundryResult<Build> {
        self.answer("create_build", |s| {
            Ok(Build {
                guid: BuildGuid::new(s.next_id("build")),
                state: BuildState::Staging,
                droplet: None,
                error: None,
            })
        })
    }

    async fn get_build(&self, build: &BuildGuid) -> FoundryResult<Build> {
        self.answer("get_build", |s| {
            let mut answer = s.build_polls.next("get_build")?;
            answer.guid = build.clone();
            Ok(answer)
        })
    }
}

#[async_trait]
impl DropletOps for FakeFoundry {
    async fn get_droplet(&self, droplet: &DropletGuid) -> FoundryResult<Droplet> {
        self.answer("get_droplet", |_| {
            Ok(Droplet {
                guid: droplet.clone(),
                buildpacks: Vec::new(),
                stack: None,
                image: None,
            })
        })
    }

    async fn get_current_droplet(&self, _app: &AppGuid) -> FoundryResult<Option<Droplet>> {
        self.answer("get_current_droplet", |s| {
            Ok(s.current_droplet.clone().map(|guid| Droplet {
                guid,
                buildpacks: Vec::new(),
                stack: None,
                image: None,
            }))
        })
    }

    async fn set_current_droplet(&self, _app: &AppGuid, droplet: &DropletGuid) -> FoundryResult<()> {
        self.answer("set_current_droplet", |s| {
            s.current_droplet = Some(droplet.clone());
            Ok(())
        })
    }
}

#[async_trait]
impl DeploymentOps for FakeFoundry {
    async fn create_deployment(&self, _app: &AppGuid, droplet: &DropletGuid) -> FoundryResult<Deployment> {
        self.answer("create_deployment", |s| {
            if let Some(error) = s.create_deployment_errors.pop_front() {
                return Err(error);
            }
            s.created_deployments.push(droplet.clone());
            s.current_droplet = Some(droplet.clone());
            s.set_app_state(AppState::Started)?;
            Ok(Deployment {
                guid: DeploymentGuid::new(s.next_id("deployment")),
                droplet: Some(droplet.clone()),
                status: deploying(),
            })
        })
    }

    async fn get_deployment(&self, deployment: &DeploymentGuid) -> FoundryResult<Deployment> {
        self.answer("get_deployment", |s| {
            Ok(Deployment {
                guid: deployment.clone(),
                droplet: s.created_deployments.last().cloned(),
                status: s.deployment_polls.next("get_deployment")?,
            })
        })
    }

    async fn get_new_processes(&self, _deployment: &DeploymentGuid) -> FoundryResult<Vec<Process>> {
        self.answer("get_new_processes", |s| Ok(s.new_processes.clone()))
    }
}

#[async_trait]
impl ProcessOps for FakeFoundry {
    async fn get_application_processes(&self, _app: &AppGuid) -> FoundryResult<Vec<Process>> {
        self.answer("get_application_processes", |s| Ok(s.app_processes.clone()))
    }

    async fn get_process(&self, process: &ProcessGuid) -> FoundryResult<Process> {
        self.answer("get_process", |s| {
            s.find_process(process)
                .ok_or_else(|| FoundryError::not_found(format!("process {process}")))
        })
    }

    async fn get_process_instances(&self, _process: &ProcessGuid) -> FoundryResult<Vec<ProcessInstance>> {
        self.answer("get_process_instances", |s| {
            let states = s.instance_polls.next("get_process_instances")?;
            Ok(states
                .into_iter()
                .enumerate()
                .map(|(index, state)| ProcessInstance {
                    index: index as u32,
                    state,
                })
                .collect())
        })
    }
}

#[async_trait]
impl AppOps for FakeFoundry {
    async fn get_application(&self, _app: &AppGuid) -> FoundryResult<Application> {
        self.answer("get_application", |s| s.read_app())
    }

    async fn start_application(&self, _app: &AppGuid) -> FoundryResult<Application> {
        self.answer("start_application", |s| s.set_app_state(AppState::Started))
    }

    async fn stop_application(&self, _app: &AppGuid) -> FoundryResult<Application> {
        self.answer("stop_application", |s| s.set_app_state(AppState::Stopped))
    }

    async fn update_lifecycle(&self, _app: &AppGuid, lifecycle: &Lifecycle) -> FoundryResult<Application> {
        self.answer("update_lifecycle", |s| {
            s.lifecycles.push(lifecycle.clone());
            let app = s
                .app
                .as_mut()
                .ok_or_else(|| FoundryError::not_found("app app-1"))?;
            app.lifecycle = lifecycle.clone();
            Ok(app.clone())
        })
    }

    async fn update_environment(&self, _app: &AppGuid, patch: &EnvironmentPatch) -> FoundryResult<()> {
        self.answer("update_environment", |s| {
            s.env_patches.push(patch.clone());
            Ok(())
        })
    }
}
