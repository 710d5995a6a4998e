//! # Content-Store Liveness Monitor
//!
//! A cancellable repeating probe bound to a view's lifetime. Start/stop are
//! explicit; failing to stop the monitor on unmount is a resource leak
//! across view transitions, so `Drop` also stops it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::ports::outbound::ContentGateway;

/// Polls [`ContentGateway::is_alive`] on an interval and publishes the
/// latest result. The probe is non-throwing by contract, so the monitor
/// only ever reports `true`/`false`.
pub struct LivenessMonitor {
    status: watch::Receiver<bool>,
    poller: Option<JoinHandle<()>>,
}

impl LivenessMonitor {
    /// Probe once immediately, then every `interval`, until
    /// [`stop`](Self::stop) or drop.
    pub fn start<G: ContentGateway + 'static>(gateway: Arc<G>, interval: Duration) -> Self {
        let (tx, status) = watch::channel(false);
        let poller = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let alive = gateway.is_alive().await;
                if tx.send(alive).is_err() {
                    // All receivers gone, including our own Self.
                    break;
                }
            }
        });
        Self {
            status,
            poller: Some(poller),
        }
    }

    /// The most recent probe result.
    pub fn status(&self) -> bool {
        *self.status.borrow()
    }

    /// Watch probe results as they arrive.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.status.clone()
    }

    /// Stop polling. Idempotent; the last status stays readable.
    pub fn stop(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.abort();
        }
    }

    /// Whether the poll task is still running.
    pub fn is_running(&self) -> bool {
        self.poller.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for LivenessMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
