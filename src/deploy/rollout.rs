// ABOUTME: One rolling-deployment attempt, parameterized by its current state.
// ABOUTME: Transitions consume the rollout so steps can only run in order.

use super::error::{ApiSnafu, DeployError, WaitSnafu};
use super::state::{Deploying, Discovered, Finalized, Requested, Stabilized};
use crate::diagnostics::Diagnostics;
use crate::foundry::{DeploymentOps, FoundryError, Process, ProcessOps};
use crate::poll::{Cancellation, Poll, WaitConfig, wait_for};
use crate::stability::{ZeroInstancePolicy, wait_for_process};
use crate::step::Step;
use crate::types::{AppGuid, DeploymentGuid, DropletGuid};
use parking_lot::Mutex;
use snafu::ResultExt;

/// A deployment attempt in progress.
///
/// The state parameter `S` carries what the attempt has learned so far, so
/// for example the new processes cannot be stabilized before they have been
/// discovered.
#[derive(Debug)]
pub struct Rollout<S> {
    pub(crate) app: AppGuid,
    pub(crate) droplet: DropletGuid,
    pub(crate) attempt: u32,
    pub(crate) state: S,
}

impl Rollout<Requested> {
    pub fn new(app: AppGuid, droplet: DropletGuid, attempt: u32) -> Self {
        Rollout {
            app,
            droplet,
            attempt,
            state: Requested,
        }
    }

    /// Ask the platform for a new deployment of the droplet.
    pub async fn create<F>(
        self,
        foundry: &F,
        diag: &mut Diagnostics,
    ) -> Result<Rollout<Deploying>, DeployError>
    where
        F: DeploymentOps + ?Sized,
    {
        let step = Step::CreateDeployment(self.droplet.clone());
        let deployment = foundry
            .create_deployment(&self.app, &self.droplet)
            .await
            .context(ApiSnafu { step: step.clone() })?
            .record(diag, &step);

        tracing::info!(
            app = %self.app,
            deployment = %deployment.guid,
            attempt = self.attempt,
            "deployment created"
        );
        Ok(self.advance(Deploying {
            deployment: deployment.guid,
        }))
    }
}

impl<S> Rollout<S> {
    pub fn app(&self) -> &AppGuid {
        &self.app
    }

    pub fn droplet(&self) -> &DropletGuid {
        &self.droplet
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    fn advance<T>(self, state: T) -> Rollout<T> {
        Rollout {
            app: self.app,
            droplet: self.droplet,
            attempt: self.attempt,
            state,
        }
    }
}

impl Rollout<Deploying> {
    pub fn deployment(&self) -> &DeploymentGuid {
        &self.state.deployment
    }

    /// Poll until the deployment is finalized.
    ///
    /// A deployment finalized with any reason but DEPLOYED fails the wait.
    pub async fn await_finalized<F>(
        self,
        foundry: &F,
        wait: &WaitConfig,
        cancel: &Cancellation,
        diag: &mut Diagnostics,
    ) -> Result<Rollout<Finalized>, DeployError>
    where
        F: DeploymentOps + ?Sized,
    {
        let guid = &self.state.deployment;
        let warnings = Mutex::new(Vec::new());
        let collected = &warnings;
        let what = format!("deployment {guid}");

        let result = wait_for(&what, wait, cancel, move || async move {
            let reply = foundry.get_deployment(guid).await?;
            collected.lock().extend(reply.warnings);
            let status = reply.value.status;
            tracing::debug!(
                deployment = %guid,
                value = ?status.value,
                reason = %status.reason,
                "deployment status"
            );
            Ok::<_, FoundryError>(if !status.value.is_finalized() {
                Poll::Pending
            } else if status.succeeded() {
                Poll::Ready(())
            } else {
                Poll::Failed(status.failure_reason().to_string())
            })
        })
        .await;

        let step = Step::WaitDeployment;
        diag.platform_warnings(&step, warnings.into_inner());
        result.context(WaitSnafu { step })?;

        let deployment = self.state.deployment.clone();
        Ok(self.advance(Finalized { deployment }))
    }
}

impl Rollout<Finalized> {
    pub fn deployment(&self) -> &DeploymentGuid {
        &self.state.deployment
    }

    /// Fetch the processes the deployment created.
    pub async fn discover_processes<F>(
        self,
        foundry: &F,
        diag: &mut Diagnostics,
    ) -> Result<Rollout<Discovered>, DeployError>
    where
        F: DeploymentOps + ?Sized,
    {
        let step = Step::GetNewApplicationProcesses;
        let processes = foundry
            .get_new_processes(&self.state.deployment)
            .await
            .context(ApiSnafu { step: step.clone() })?
            .record(diag, &step);

        tracing::debug!(
            deployment = %self.state.deployment,
            count = processes.len(),
            "new processes discovered"
        );
        let deployment = self.state.deployment.clone();
        Ok(self.advance(Discovered {
            deployment,
            processes,
        }))
    }
}

impl Rollout<Discovered> {
    pub fn processes(&self) -> &[Process] {
        &self.state.processes
    }

    /// Wait for each new process in turn to become stable.
    pub async fn stabilize<F>(
        self,
        foundry: &F,
        wait: &WaitConfig,
        policy: ZeroInstancePolicy,
        cancel: &Cancellation,
        diag: &mut Diagnostics,
    ) -> Result<Rollout<Stabilized>, DeployError>
    where
        F: ProcessOps + ?Sized,
    {
        for process in &self.state.processes {
            wait_for_process(foundry, &process.guid, wait, policy, cancel, diag)
                .await
                .context(WaitSnafu {
                    step: Step::WaitProcessStable,
                })?;
        }
        let deployment = self.state.deployment.clone();
        Ok(self.advance(Stabilized { deployment }))
    }
}

impl Rollout<Stabilized> {
    /// Terminal state: the attempt succeeded.
    pub fn finish(self) -> DeploymentGuid {
        self.state.deployment
    }
}
