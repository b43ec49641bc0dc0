// ABOUTME: Command module aggregator for the cfrollout CLI.
// ABOUTME: Holds the shared connection and warning-report helpers.

mod apply;
mod deploy;
mod stage;
mod status;

pub use apply::apply;
pub use deploy::deploy;
pub use stage::stage;
pub use status::status;

use cfrollout::config::Config;
use cfrollout::diagnostics::Diagnostics;
use cfrollout::error::Result;
use cfrollout::foundry::{HttpFoundry, Session};
use cfrollout::output::Output;
use std::sync::Arc;

/// Open the API session described by the configuration.
fn connect(config: &Config, output: &Output) -> Result<HttpFoundry> {
    let session = Session::open(config.api.session_config()?)?;
    output.progress(&format!("  → Using API {}", config.api.url));
    Ok(HttpFoundry::new(Arc::new(session)))
}

fn report_warnings(output: &Output, diag: &Diagnostics) {
    for warning in diag.warnings() {
        output.warning(warning);
    }
}
