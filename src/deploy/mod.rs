// ABOUTME: Rolling deployment orchestration using the type state pattern.
// ABOUTME: Exports rollout states, the orchestrator, retry policy, and errors.

mod error;
mod orchestrator;
mod retry;
mod rollout;
mod state;

pub use error::{DeployError, DeployErrorKind};
pub use orchestrator::{DeployOutcome, Orchestrator, RolloutSettings};
pub use retry::RetryPolicy;
pub use rollout::Rollout;
pub use state::{Deploying, Discovered, Finalized, Requested, Stabilized};
