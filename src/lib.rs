// ABOUTME: Library root for cfrollout - staging and rolling deployments on Cloud Foundry v3.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod foundry;
pub mod lifecycle;
pub mod output;
pub mod poll;
pub mod record;
pub mod stability;
pub mod stage;
pub mod step;
pub mod types;
