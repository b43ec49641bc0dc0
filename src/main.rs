// ABOUTME: Entry point for the cfrollout CLI application.
// ABOUTME: Parses arguments, wires Ctrl-C to cancellation, and dispatches commands.

mod cli;
mod commands;

use cfrollout::config::{self, Config};
use cfrollout::error::Result;
use cfrollout::output::{Output, OutputMode};
use cfrollout::poll::{Cancellation, cancellation};
use cfrollout::record::RecordStore;
use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let (handle, cancel) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            handle.cancel();
        }
    });

    let mut output = Output::new(OutputMode::from_flags(cli.quiet, cli.json));
    if let Err(e) = run(cli.command, &mut output, cancel).await {
        output.error(&e.to_string());
        std::process::exit(if e.is_cancelled() { 130 } else { 1 });
    }
}

async fn run(command: Commands, output: &mut Output, cancel: Cancellation) -> Result<()> {
    let cwd = env::current_dir()?;
    let store = RecordStore::in_project(&cwd);

    match command {
        Commands::Init {
            app,
            guid,
            api,
            force,
        } => {
            config::init_config(
                &cwd,
                app.as_deref(),
                guid.as_deref(),
                api.as_deref(),
                force,
            )?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Stage { app } => {
            let config = Config::discover(&cwd)?;
            commands::stage(&config, &app, &cwd, output, cancel).await
        }
        Commands::Deploy { app, droplet } => {
            let config = Config::discover(&cwd)?;
            commands::deploy(&config, &app, &droplet, &store, output, cancel).await
        }
        Commands::Apply { app } => {
            let config = Config::discover(&cwd)?;
            commands::apply(&config, app.as_deref(), &cwd, &store, output, cancel).await
        }
        Commands::Status => {
            let config = Config::discover(&cwd)?;
            commands::status(&config, &store, output)
        }
    }
}
