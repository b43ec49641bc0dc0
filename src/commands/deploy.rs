// ABOUTME: Deploy command implementation.
// ABOUTME: Rolls an existing droplet out with bounded retry and starts the app.

use super::{connect, report_warnings};
use cfrollout::config::Config;
use cfrollout::deploy::{DeployErrorKind, DeployOutcome, Orchestrator};
use cfrollout::diagnostics::Diagnostics;
use cfrollout::error::{Error, Result};
use cfrollout::output::Output;
use cfrollout::poll::Cancellation;
use cfrollout::record::{AppliedRecord, RecordStore};
use cfrollout::types::DropletGuid;

pub async fn deploy(
    config: &Config,
    name: &str,
    droplet: &str,
    store: &RecordStore,
    output: &mut Output,
    cancel: Cancellation,
) -> Result<()> {
    let app = config.app(name)?;
    let droplet =
        DropletGuid::parse(droplet).map_err(|e| Error::InvalidConfig(format!("droplet: {e}")))?;

    output.start_timer();
    output.progress(&format!("Deploying droplet {droplet} to {name}"));
    let foundry = connect(config, output)?;
    let mut diag = Diagnostics::default();

    let orchestrator = Orchestrator::new(
        &foundry,
        config.timeouts.rollout(app.zero_instances),
        cancel,
    );
    let result = orchestrator
        .deploy_and_start(&app.guid, &droplet, &config.retry.deployment_policy(), &mut diag)
        .await;
    report_warnings(output, &diag);

    let deployment = match result {
        Ok(DeployOutcome::Deployed(deployment)) => deployment,
        Ok(DeployOutcome::Gone) => {
            store.forget(name)?;
            output.progress(&format!("  ✗ {name} no longer exists; local record removed"));
            return Ok(());
        }
        Err(e) => {
            if e.kind() == DeployErrorKind::AppGone {
                store.forget(name)?;
            }
            return Err(e.into());
        }
    };

    // Only an existing record knows which inputs produced the app.
    if let Some(previous) = store.load(name)? {
        store.save(&AppliedRecord::new(
            name,
            app.guid.clone(),
            Some(droplet),
            Some(deployment.clone()),
            previous.inputs,
        ))?;
    }

    output.success(&format!("Deployment {deployment} complete"));
    Ok(())
}
