// ABOUTME: Generic state-change watcher over asynchronous platform jobs.
// ABOUTME: Polls a refresh function until ready, failed, timed out, or cancelled.

use super::cancel::Cancellation;
use crate::foundry::FoundryError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// One observation of the thing being waited on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll<T> {
    /// Still in a pending state; poll again.
    Pending,
    /// Reached a success state.
    Ready(T),
    /// Reached a state that can never become success.
    Failed(String),
}

/// Timing for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Bound on the whole wait, initial delay included.
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Pause before the first refresh.
    pub delay: Duration,
    /// Consecutive not-found refreshes tolerated; one more fails the wait.
    pub not_found_checks: u32,
}

impl WaitConfig {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 2;

    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Self::DEFAULT_INTERVAL,
            delay: Self::DEFAULT_INTERVAL,
            not_found_checks: Self::DEFAULT_NOT_FOUND_CHECKS,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("timeout while waiting for {what} after {timeout:?}")]
    Timeout { what: String, timeout: Duration },

    #[error("{what} failed: {reason}")]
    Failed { what: String, reason: String },

    #[error("{what} not found after {checks} consecutive checks")]
    NotFound { what: String, checks: u32 },

    #[error("error refreshing {what}: {source}")]
    Refresh {
        what: String,
        #[source]
        source: FoundryError,
    },

    #[error("cancelled while waiting for {what}")]
    Cancelled { what: String },
}

impl WaitError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitError::Cancelled { .. })
    }
}

enum Tick<T> {
    Cancelled,
    Elapsed,
    Refreshed(T),
}

/// Wait until `refresh` reports [`Poll::Ready`].
///
/// The first refresh happens after `config.delay`; later ones are spaced by
/// `config.poll_interval`. A refresh still in flight at the deadline is
/// abandoned. A not-found refresh error is tolerated up to
/// `config.not_found_checks` times in a row; any other refresh error, or a
/// [`Poll::Failed`], ends the wait immediately.
pub async fn wait_for<T, F, Fut>(
    what: &str,
    config: &WaitConfig,
    cancel: &Cancellation,
    mut refresh: F,
) -> Result<T, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Poll<T>, FoundryError>>,
{
    let deadline = Instant::now() + config.timeout;
    let timeout = || WaitError::Timeout {
        what: what.to_string(),
        timeout: config.timeout,
    };
    let cancelled = || WaitError::Cancelled {
        what: what.to_string(),
    };

    if !config.delay.is_zero() {
        let wake = deadline.min(Instant::now() + config.delay);
        if pause_until(wake, cancel).await {
            return Err(cancelled());
        }
    }

    let mut not_found = 0u32;
    let mut polls = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        if Instant::now() >= deadline {
            tracing::warn!(what, polls, "wait timed out");
            return Err(timeout());
        }

        polls += 1;
        tracing::debug!(what, poll = polls, "refreshing");
        let tick = tokio::select! {
            _ = cancel.cancelled() => Tick::Cancelled,
            result = tokio::time::timeout_at(deadline, refresh()) => match result {
                Ok(outcome) => Tick::Refreshed(outcome),
                Err(_) => Tick::Elapsed,
            },
        };

        match tick {
            Tick::Cancelled => return Err(cancelled()),
            Tick::Elapsed => {
                tracing::warn!(what, polls, "wait timed out during refresh");
                return Err(timeout());
            }
            Tick::Refreshed(Ok(Poll::Ready(value))) => {
                tracing::info!(what, polls, "wait finished");
                return Ok(value);
            }
            Tick::Refreshed(Ok(Poll::Failed(reason))) => {
                tracing::warn!(what, %reason, "wait failed");
                return Err(WaitError::Failed {
                    what: what.to_string(),
                    reason,
                });
            }
            Tick::Refreshed(Ok(Poll::Pending)) => not_found = 0,
            Tick::Refreshed(Err(e)) if e.is_not_found() => {
                not_found += 1;
                tracing::debug!(what, not_found, "not found yet");
                if not_found > config.not_found_checks {
                    return Err(WaitError::NotFound {
                        what: what.to_string(),
                        checks: not_found,
                    });
                }
            }
            Tick::Refreshed(Err(source)) => {
                return Err(WaitError::Refresh {
                    what: what.to_string(),
                    source,
                });
            }
        }

        let wake = deadline.min(Instant::now() + config.poll_interval);
        if pause_until(wake, cancel).await {
            return Err(cancelled());
        }
    }
}

/// Sleep until `wake`; returns true if cancelled first.
async fn pause_until(wake: Instant, cancel: &Cancellation) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep_until(wake) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ready_on_first_refresh_after_delay() {
        let started = Instant::now();
        let config = WaitConfig::new(Duration::from_secs(60));
        let value = wait_for("job", &config, &Cancellation::never(), || async {
            Ok(Poll::Ready(7))
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_times_out_without_refreshing() {
        let config = WaitConfig::new(Duration::ZERO);
        let mut calls = 0;
        let err = wait_for::<(), _, _>("job", &config, &Cancellation::never(), || {
            calls += 1;
            async { Ok(Poll::Pending) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, WaitError::Timeout { .. }));
        assert_eq!(calls, 0);
    }
}
