// ABOUTME: Drives rollout attempts with bounded retry and reconciles run state.
// ABOUTME: Entry points for deploying a droplet and for starting or stopping an app.

use super::error::{ApiSnafu, DeployError, WaitSnafu, app_read_error};
use super::retry::RetryPolicy;
use super::rollout::Rollout;
use crate::diagnostics::{Diagnostics, Warning};
use crate::foundry::{AppState, Application, Foundry};
use crate::poll::{Cancellation, WaitConfig};
use crate::stability::{ZeroInstancePolicy, wait_for_process};
use crate::step::Step;
use crate::types::{AppGuid, DeploymentGuid, DropletGuid};
use snafu::ResultExt;
use std::time::Duration;

/// Timing and policy for rollouts and reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloutSettings {
    /// Waiting for a deployment to finalize.
    pub deploy_wait: WaitConfig,
    /// Waiting for a newly deployed process to become stable.
    pub stabilize_wait: WaitConfig,
    /// Waiting for processes after an explicit start.
    pub start_wait: WaitConfig,
    pub zero_instances: ZeroInstancePolicy,
}

/// What a standalone deployment did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    Deployed(DeploymentGuid),
    /// The application was already gone before anything was deployed.
    Gone,
}

impl RolloutSettings {
    pub const STABILIZE_INTERVAL: Duration = Duration::from_secs(2);

    /// Settings bounding every wait by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            deploy_wait: WaitConfig::new(timeout),
            stabilize_wait: WaitConfig::new(timeout)
                .poll_interval(Self::STABILIZE_INTERVAL)
                .delay(Self::STABILIZE_INTERVAL),
            start_wait: WaitConfig::new(timeout),
            zero_instances: ZeroInstancePolicy::default(),
        }
    }
}

impl Default for RolloutSettings {
    fn default() -> Self {
        Self::new(Duration::from_secs(15 * 60))
    }
}

/// Rolls droplets out to applications.
pub struct Orchestrator<'a, F: ?Sized> {
    foundry: &'a F,
    settings: RolloutSettings,
    cancel: Cancellation,
}

impl<'a, F> Orchestrator<'a, F>
where
    F: Foundry + ?Sized,
{
    pub fn new(foundry: &'a F, settings: RolloutSettings, cancel: Cancellation) -> Self {
        Self {
            foundry,
            settings,
            cancel,
        }
    }

    pub fn settings(&self) -> &RolloutSettings {
        &self.settings
    }

    /// Roll `droplet` out to `app`, retrying whole attempts per `policy`.
    ///
    /// Every attempt creates a new deployment. Cancellation is returned at
    /// once; any other failure starts the next attempt immediately until the
    /// budget is spent, then the last failure is returned.
    pub async fn deploy(
        &self,
        app: &AppGuid,
        droplet: &DropletGuid,
        policy: &RetryPolicy,
        diag: &mut Diagnostics,
    ) -> Result<DeploymentGuid, DeployError> {
        let max = policy.max_attempts();
        let mut attempt = 1;
        loop {
            let error = match self.attempt(app, droplet, attempt, diag).await {
                Ok(deployment) => {
                    tracing::info!(%app, %droplet, %deployment, attempt, "rollout complete");
                    return Ok(deployment);
                }
                Err(error) => error,
            };

            if error.is_cancelled() {
                return Err(error);
            }
            if attempt >= max {
                tracing::warn!(%app, %droplet, attempts = attempt, "rollout attempts exhausted");
                return Err(DeployError::AttemptsExhausted {
                    attempts: attempt,
                    source: Box::new(error),
                });
            }

            tracing::warn!(%app, attempt, max, error = %error, "rollout attempt failed; retrying");
            diag.warn(Warning::retried_attempt(
                error.step().to_string(),
                format!("attempt {attempt} of {max} failed: {error}"),
            ));
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        app: &AppGuid,
        droplet: &DropletGuid,
        attempt: u32,
        diag: &mut Diagnostics,
    ) -> Result<DeploymentGuid, DeployError> {
        let foundry = self.foundry;
        let settings = &self.settings;

        let rollout = Rollout::new(app.clone(), droplet.clone(), attempt)
            .create(foundry, diag)
            .await?
            .await_finalized(foundry, &settings.deploy_wait, &self.cancel, diag)
            .await?
            .discover_processes(foundry, diag)
            .await?
            .stabilize(
                foundry,
                &settings.stabilize_wait,
                settings.zero_instances,
                &self.cancel,
                diag,
            )
            .await?;

        Ok(rollout.finish())
    }

    /// Bring `app` to `desired` run state.
    ///
    /// Starting only happens when a droplet is available; after a start,
    /// every process of the application must become stable.
    pub async fn reconcile(
        &self,
        app: &AppGuid,
        desired: AppState,
        desired_droplet: Option<&DropletGuid>,
        diag: &mut Diagnostics,
    ) -> Result<Application, DeployError> {
        let step = Step::GetApplication;
        let current = self
            .foundry
            .get_application(app)
            .await
            .map_err(|source| app_read_error(step.clone(), app, source))?
            .record(diag, &step);

        if current.state == desired {
            tracing::debug!(%app, state = %desired, "application already in desired state");
            return Ok(current);
        }

        match desired {
            AppState::Stopped => {
                let step = Step::StopApplication;
                let stopped = self
                    .foundry
                    .stop_application(app)
                    .await
                    .context(ApiSnafu { step: step.clone() })?
                    .record(diag, &step);
                tracing::info!(%app, "application stopped");
                Ok(stopped)
            }
            AppState::Started => {
                if desired_droplet.is_none() {
                    tracing::info!(%app, "no droplet to run; leaving application stopped");
                    return Ok(current);
                }

                self.start_and_wait(app, diag).await
            }
        }
    }

    async fn start_and_wait(
        &self,
        app: &AppGuid,
        diag: &mut Diagnostics,
    ) -> Result<Application, DeployError> {
        let step = Step::StartApplication;
        let started = self
            .foundry
            .start_application(app)
            .await
            .context(ApiSnafu { step: step.clone() })?
            .record(diag, &step);

        let step = Step::GetApplicationProcesses;
        let processes = self
            .foundry
            .get_application_processes(app)
            .await
            .context(ApiSnafu { step: step.clone() })?
            .record(diag, &step);

        for process in &processes {
            wait_for_process(
                self.foundry,
                &process.guid,
                &self.settings.start_wait,
                self.settings.zero_instances,
                &self.cancel,
                diag,
            )
            .await
            .context(WaitSnafu {
                step: Step::WaitProcessStable,
            })?;
        }
        tracing::info!(%app, processes = processes.len(), "application started");
        Ok(started)
    }

    /// Deploy an existing droplet and make sure the application ends up running.
    pub async fn deploy_and_start(
        &self,
        app: &AppGuid,
        droplet: &DropletGuid,
        policy: &RetryPolicy,
        diag: &mut Diagnostics,
    ) -> Result<DeployOutcome, DeployError> {
        let step = Step::GetDesiredDropletForDeployment;
        self.foundry
            .get_droplet(droplet)
            .await
            .context(ApiSnafu { step: step.clone() })?
            .record(diag, &step);

        let step = Step::GetApplication;
        match self.foundry.get_application(app).await {
            Ok(reply) => {
                reply.record(diag, &step);
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(%app, "application no longer exists");
                return Ok(DeployOutcome::Gone);
            }
            Err(source) => return Err(DeployError::Api { step, source }),
        }

        let deployment = self.deploy(app, droplet, policy, diag).await?;

        let step = Step::GetApplicationStateDuringDeployment;
        let current = self
            .foundry
            .get_application(app)
            .await
            .map_err(|source| app_read_error(step.clone(), app, source))?
            .record(diag, &step);

        if current.state != AppState::Started {
            self.start_and_wait(app, diag).await?;
        }
        Ok(DeployOutcome::Deployed(deployment))
    }
}
