// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates cfrollout.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::AppGuid;

use super::CONFIG_FILENAME;

const PLACEHOLDER_GUID: &str = "00000000-0000-0000-0000-000000000000";

pub fn init_config(
    dir: &Path,
    app: Option<&str>,
    guid: Option<&str>,
    api: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let guid = match guid {
        Some(g) => AppGuid::parse(g).map_err(|e| Error::InvalidConfig(e.to_string()))?,
        None => AppGuid::new(PLACEHOLDER_GUID),
    };
    let app = app.unwrap_or("my-app");
    if app.trim().is_empty() {
        return Err(Error::InvalidConfig("application name cannot be empty".into()));
    }

    let yaml = generate_template_yaml(
        api.unwrap_or("https://api.sys.example.com"),
        app,
        &guid,
    );
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(api: &str, app: &str, guid: &AppGuid) -> String {
    format!(
        r#"api:
  url: {api}
  # Bearer token; read from CF_TOKEN when omitted
  token:
    env: CF_TOKEN
  skip_ssl_validation: false

timeouts:
  stage: 15m
  deploy: 15m
  start: 15m

retry:
  update_attempts: 5
  deployment_attempts: 3

apps:
  - name: {app}
    guid: {guid}
    lifecycle: buildpack
    source_code_path: app.zip
    # source_code_hash: <hash of app.zip>
    state: STARTED
"#
    )
}
