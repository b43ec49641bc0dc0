// ABOUTME: Application lifecycle management: change detection and full updates.
// ABOUTME: Exports the desired-state types, planners, and the update manager.

mod desired;
mod error;
mod manager;
mod plan;
mod validate;

pub use desired::{AppliedInputs, DesiredApp, LifecycleSpec, fingerprint};
pub use error::{LifecycleError, LifecycleErrorKind};
pub use manager::{AppliedUpdate, LifecycleManager, UpdateOutcome, UpdateSettings};
pub use plan::{StagingPlan, plan_environment, plan_staging};
pub use validate::{ValidationError, validate_environment};
