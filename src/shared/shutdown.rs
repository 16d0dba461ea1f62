//! Session teardown signalling
//!
//! Every background task spawned for an onboarding session listens on the
//! session's `ShutdownSignal` and exits once it fires.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

/// Shutdown signal that can be cloned and shared across tasks
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: broadcast::Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Wake every waiter; later waiters return at once
    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            info!("Session shutdown signal triggered");
            let _ = self.sender.send(());
        }
    }

    /// Future resolving once shutdown is triggered, even if that already
    /// happened before the call.
    pub fn notified(&self) -> ShutdownNotified {
        ShutdownNotified {
            receiver: self.sender.subscribe(),
            triggered: self.triggered.clone(),
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// A future that resolves when shutdown is triggered
pub struct ShutdownNotified {
    receiver: broadcast::Receiver<()>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownNotified {
    pub async fn wait(mut self) {
        if self.triggered.load(Ordering::SeqCst) {
            return;
        }
        let _ = self.receiver.recv().await;
    }
}

/// Run a cleanup future, giving up after `timeout`.
///
/// Returns whether the cleanup finished in time.
pub async fn cleanup_within<F, Fut>(timeout: Duration, cleanup: F) -> bool
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    match tokio::time::timeout(timeout, cleanup()).await {
        Ok(()) => true,
        Err(_) => {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Session cleanup timed out"
            );
            false
        }
    }
}
