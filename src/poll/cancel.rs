// ABOUTME: Cooperative cancellation shared by every wait loop.
// ABOUTME: Backed by a watch channel; a dropped handle never cancels.

use tokio::sync::watch;

/// Triggers cancellation for every [`Cancellation`] cloned from its pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes cancellation. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    rx: Option<watch::Receiver<bool>>,
}

/// Create a linked handle and observer.
pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, Cancellation { rx: Some(rx) })
}

impl Cancellation {
    /// An observer that is never cancelled.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is requested; pends forever otherwise.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without cancelling.
                return std::future::pending().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_wakes_waiters() {
        let (handle, cancel) = cancellation();
        let waiter = tokio::spawn({
            let cancel = cancel.clone();
            async move { cancel.cancelled().await }
        });
        handle.cancel();
        waiter.await.unwrap();
        assert!(cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_never_cancels() {
        let (handle, cancel) = cancellation();
        drop(handle);
        let outcome = tokio::time::timeout(Duration::from_secs(60), cancel.cancelled()).await;
        assert!(outcome.is_err());
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn never_is_not_cancelled() {
        assert!(!Cancellation::never().is_cancelled());
    }
}
