// ABOUTME: Applies a desired application configuration end to end.
// ABOUTME: Decides whether to restage and redeploy, then reconciles run state.

use super::desired::{AppliedInputs, DesiredApp};
use super::error::{ApiSnafu, InvalidSnafu, LifecycleError};
use super::plan::{StagingPlan, plan_environment, plan_staging};
use super::validate::validate_environment;
use crate::deploy::{Orchestrator, RetryPolicy, RolloutSettings};
use crate::diagnostics::Diagnostics;
use crate::foundry::{AppState, Foundry};
use crate::poll::{Cancellation, WaitConfig};
use crate::stage::{SourceSpec, Stager, read_archive};
use crate::step::Step;
use crate::types::{DeploymentGuid, DropletGuid};
use snafu::ResultExt;
use std::time::Duration;

/// Timing and retry settings for updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSettings {
    pub stage_wait: WaitConfig,
    pub rollout: RolloutSettings,
    pub retry: RetryPolicy,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            stage_wait: WaitConfig::new(Duration::from_secs(15 * 60)),
            rollout: RolloutSettings::default(),
            retry: RetryPolicy::interactive(),
        }
    }
}

/// What a successful update did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedUpdate {
    pub inputs: AppliedInputs,
    /// The droplet the application now runs, if it has one.
    pub droplet: Option<DropletGuid>,
    pub deployment: Option<DeploymentGuid>,
    pub staged: bool,
    pub state: AppState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied(AppliedUpdate),
    /// The application no longer exists on the platform.
    Gone,
}

pub struct LifecycleManager<'a, F: ?Sized> {
    foundry: &'a F,
    settings: UpdateSettings,
    cancel: Cancellation,
}

impl<'a, F> LifecycleManager<'a, F>
where
    F: Foundry + ?Sized,
{
    pub fn new(foundry: &'a F, settings: UpdateSettings, cancel: Cancellation) -> Self {
        Self {
            foundry,
            settings,
            cancel,
        }
    }

    /// Bring the application in line with `desired`.
    ///
    /// `previous` is what the last successful update applied; `None` treats
    /// every input as changed. Nothing remote happens when validation fails
    /// or the source archive cannot be read.
    pub async fn update(
        &self,
        desired: &DesiredApp,
        previous: Option<&AppliedInputs>,
        diag: &mut Diagnostics,
    ) -> Result<UpdateOutcome, LifecycleError> {
        let app = &desired.guid;
        let invalid = || InvalidSnafu {
            app: desired.name.clone(),
        };
        validate_environment(&desired.environment).context(invalid())?;
        let plan = plan_staging(previous, desired).context(invalid())?;
        let bits = match &plan {
            StagingPlan::Stage(SourceSpec::Archive { path }) => Some(read_archive(path).await?),
            _ => None,
        };

        let step = Step::GetApplication;
        let current_app = match self.foundry.get_application(app).await {
            Ok(reply) => reply.record(diag, &step),
            Err(e) if e.is_not_found() => {
                tracing::info!(%app, name = %desired.name, "application no longer exists");
                return Ok(UpdateOutcome::Gone);
            }
            Err(source) => return Err(LifecycleError::Api { step, source }),
        };
        tracing::debug!(%app, state = %current_app.state, "current application");

        if let Some(patch) = plan_environment(previous, desired) {
            let step = Step::UpdateEnvironment;
            self.foundry
                .update_environment(app, &patch)
                .await
                .context(ApiSnafu { step: step.clone() })?
                .record(diag, &step);
            tracing::info!(%app, variables = patch.len(), "environment updated");
        }

        let step = Step::GetCurrentDroplet;
        let current = self
            .foundry
            .get_current_droplet(app)
            .await
            .context(ApiSnafu { step: step.clone() })?
            .record(diag, &step)
            .map(|d| d.guid);

        let staged = plan.is_stage();
        let desired_droplet = match plan {
            StagingPlan::Keep => current.clone(),
            StagingPlan::Stage(source) => {
                let step = Step::UpdateAppLifecycleType;
                self.foundry
                    .update_lifecycle(app, &desired.lifecycle.to_lifecycle())
                    .await
                    .context(ApiSnafu { step: step.clone() })?
                    .record(diag, &step);

                let stager = Stager::new(self.foundry, self.settings.stage_wait, self.cancel.clone());
                let droplet = match bits {
                    Some(bits) => stager.stage_bits(app, bits, diag).await?,
                    None => stager.stage(app, &source, diag).await?,
                };
                tracing::info!(%app, droplet = %droplet.guid, "staged new droplet");
                Some(droplet.guid)
            }
        };

        let orchestrator =
            Orchestrator::new(self.foundry, self.settings.rollout, self.cancel.clone());
        let mut deployment = None;
        if let Some(droplet) = desired_droplet.as_ref().filter(|d| Some(*d) != current.as_ref()) {
            if desired.state == AppState::Started {
                deployment = Some(
                    orchestrator
                        .deploy(app, droplet, &self.settings.retry, diag)
                        .await?,
                );
            } else {
                let step = Step::SetCurrentDroplet;
                self.foundry
                    .set_current_droplet(app, droplet)
                    .await
                    .context(ApiSnafu { step: step.clone() })?
                    .record(diag, &step);
                tracing::info!(%app, %droplet, "current droplet set without deployment");
            }
        }

        let reconciled = orchestrator
            .reconcile(app, desired.state, desired_droplet.as_ref(), diag)
            .await?;

        Ok(UpdateOutcome::Applied(AppliedUpdate {
            inputs: desired.inputs(),
            droplet: desired_droplet,
            deployment,
            staged,
            state: reconciled.state,
        }))
    }
}
