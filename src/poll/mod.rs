// ABOUTME: Job polling primitives used by staging, rollout, and reconciliation.
// ABOUTME: Exports the typed poll result, wait configuration, and cancellation.

mod cancel;
mod wait;

pub use cancel::{CancelHandle, Cancellation, cancellation};
pub use wait::{Poll, WaitConfig, WaitError, wait_for};
