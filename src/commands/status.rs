// ABOUTME: Status command implementation.
// ABOUTME: Lists configured applications with their last applied record; no API calls.

use cfrollout::config::Config;
use cfrollout::error::Result;
use cfrollout::output::Output;
use cfrollout::record::RecordStore;
use serde::Serialize;

#[derive(Serialize)]
struct AppStatus<'a> {
    app: &'a str,
    guid: &'a str,
    lifecycle: String,
    desired_state: String,
    droplet: Option<String>,
    deployment: Option<String>,
    applied_at: Option<String>,
    applied_by: Option<String>,
}

pub fn status(config: &Config, store: &RecordStore, output: &Output) -> Result<()> {
    output.progress(&format!("API: {}", config.api.url));

    for app in config.apps.iter() {
        let record = store.load(&app.name)?.filter(|r| r.app_guid == app.guid);
        let status = AppStatus {
            app: &app.name,
            guid: app.guid.as_str(),
            lifecycle: app.lifecycle.to_string(),
            desired_state: app.state.to_string(),
            droplet: record.as_ref().and_then(|r| r.droplet.as_ref().map(|d| d.to_string())),
            deployment: record
                .as_ref()
                .and_then(|r| r.deployment.as_ref().map(|d| d.to_string())),
            applied_at: record.as_ref().map(|r| r.applied_at.to_rfc3339()),
            applied_by: record.as_ref().map(|r| r.applied_by.clone()),
        };

        let human = match &record {
            Some(r) => format!(
                "{} ({}): {} {}, droplet {}, applied {} by {}",
                status.app,
                status.guid,
                status.lifecycle,
                status.desired_state,
                status.droplet.as_deref().unwrap_or("none"),
                r.applied_at.format("%Y-%m-%d %H:%M:%S UTC"),
                r.applied_by
            ),
            None => format!(
                "{} ({}): {} {}, never applied",
                status.app, status.guid, status.lifecycle, status.desired_state
            ),
        };
        output.data(&human, &status);
    }
    Ok(())
}
