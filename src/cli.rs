// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cfrollout")]
#[command(about = "Staging and zero-downtime rolling deployments for Cloud Foundry v3")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new cfrollout.yml configuration file
    Init {
        /// Application name
        #[arg(long)]
        app: Option<String>,

        /// Application GUID
        #[arg(long)]
        guid: Option<String>,

        /// API URL
        #[arg(long)]
        api: Option<String>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Stage the configured source of an application into a droplet
    Stage {
        /// Application name (defined in config)
        app: String,
    },

    /// Roll an existing droplet out to an application
    Deploy {
        /// Application name (defined in config)
        app: String,

        /// Droplet GUID to deploy
        #[arg(long)]
        droplet: String,
    },

    /// Apply the configuration: restage, redeploy, start or stop as needed
    Apply {
        /// Only this application (default: all)
        app: Option<String>,
    },

    /// Show configured applications and what was last applied
    Status,
}
