// ABOUTME: Stage command implementation.
// ABOUTME: Builds a droplet from the configured archive or image without deploying it.

use super::{connect, report_warnings};
use cfrollout::config::Config;
use cfrollout::diagnostics::Diagnostics;
use cfrollout::error::{Error, Result};
use cfrollout::output::Output;
use cfrollout::poll::Cancellation;
use cfrollout::stage::Stager;
use std::path::Path;

pub async fn stage(
    config: &Config,
    name: &str,
    root: &Path,
    output: &mut Output,
    cancel: Cancellation,
) -> Result<()> {
    let app = config.app(name)?;
    let desired = app.desired(root)?;
    let source = desired.lifecycle.source().ok_or_else(|| {
        Error::InvalidConfig(format!(
            "{name}: lifecycle {} has nothing to stage",
            desired.lifecycle.kind()
        ))
    })?;

    output.start_timer();
    output.progress(&format!("Staging {name} ({})", app.guid));
    let foundry = connect(config, output)?;
    let mut diag = Diagnostics::default();

    let stager = Stager::new(&foundry, config.timeouts.stage_wait(), cancel);
    let result = stager.stage(&app.guid, &source, &mut diag).await;
    report_warnings(output, &diag);

    let droplet = result?;
    output.success(&format!("Staged droplet {}", droplet.guid));
    Ok(())
}
