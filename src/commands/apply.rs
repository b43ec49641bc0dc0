// ABOUTME: Apply command implementation.
// ABOUTME: Runs a full lifecycle update per application and keeps the applied records.

use super::{connect, report_warnings};
use cfrollout::config::{AppConfig, Config};
use cfrollout::diagnostics::Diagnostics;
use cfrollout::error::Result;
use cfrollout::foundry::HttpFoundry;
use cfrollout::lifecycle::{LifecycleManager, UpdateOutcome};
use cfrollout::output::Output;
use cfrollout::poll::Cancellation;
use cfrollout::record::{AppliedRecord, RecordStore};
use std::path::Path;

pub async fn apply(
    config: &Config,
    name: Option<&str>,
    root: &Path,
    store: &RecordStore,
    output: &mut Output,
    cancel: Cancellation,
) -> Result<()> {
    let apps = config.select(name)?;

    output.start_timer();
    let foundry = connect(config, output)?;
    for app in apps {
        apply_one(config, app, root, store, &foundry, output, cancel.clone()).await?;
    }
    output.success("Apply complete!");
    Ok(())
}

async fn apply_one(
    config: &Config,
    app: &AppConfig,
    root: &Path,
    store: &RecordStore,
    foundry: &HttpFoundry,
    output: &Output,
    cancel: Cancellation,
) -> Result<()> {
    output.progress(&format!("Applying {} ({})", app.name, app.guid));
    let desired = app.desired(root)?;

    // A record for a different GUID says nothing about this app.
    let previous = store
        .load(&app.name)?
        .filter(|r| r.app_guid == app.guid)
        .map(|r| r.inputs);

    let mut diag = Diagnostics::default();
    let manager = LifecycleManager::new(foundry, config.update_settings(app), cancel);
    let result = manager.update(&desired, previous.as_ref(), &mut diag).await;
    report_warnings(output, &diag);

    match result {
        Ok(UpdateOutcome::Applied(update)) => {
            store.save(&AppliedRecord::new(
                &app.name,
                app.guid.clone(),
                update.droplet.clone(),
                update.deployment.clone(),
                update.inputs,
            ))?;
            let droplet = update
                .droplet
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "none".to_string());
            output.progress(&format!(
                "  ✓ {} is {} on droplet {droplet}{}",
                app.name,
                update.state,
                if update.staged { " (restaged)" } else { "" }
            ));
            Ok(())
        }
        Ok(UpdateOutcome::Gone) => {
            store.forget(&app.name)?;
            output.progress(&format!(
                "  ✗ {} no longer exists; local record removed",
                app.name
            ));
            Ok(())
        }
        Err(e) => {
            if e.is_app_gone() {
                store.forget(&app.name)?;
            }
            Err(e.into())
        }
    }
}
