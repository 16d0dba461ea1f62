//! Single-slot debounce timer
//!
//! Each subsystem (local cache, remote auto-save, fee calculator, auto-fill)
//! owns one `Debouncer`. Scheduling a task cancels whatever is still waiting
//! in the slot, so only the last scheduled task of a burst runs.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

struct Pending {
    handle: JoinHandle<()>,
    /// Set once the delay elapsed and the task body started
    fired: Arc<AtomicBool>,
}

pub struct Debouncer {
    name: &'static str,
    delay: Duration,
    slot: Mutex<Option<Pending>>,
}

impl Debouncer {
    pub fn new(name: &'static str, delay: Duration) -> Self {
        Self {
            name,
            delay,
            slot: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn slot(&self) -> MutexGuard<'_, Option<Pending>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `task` after the delay, replacing any task still waiting.
    ///
    /// A task whose delay already elapsed is left to finish.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let fired = Arc::new(AtomicBool::new(false));
        let fired_flag = fired.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fired_flag.store(true, Ordering::SeqCst);
            task.await;
        });

        let previous = self.slot().replace(Pending { handle, fired });
        if let Some(previous) = previous {
            if !previous.fired.load(Ordering::SeqCst) {
                previous.handle.abort();
                trace!(debouncer = self.name, "Superseded pending task");
            }
        }
    }

    /// Drop the waiting task, if any. Returns whether one was cancelled.
    pub fn cancel(&self) -> bool {
        match self.slot().take() {
            Some(pending) if !pending.fired.load(Ordering::SeqCst) => {
                pending.handle.abort();
                trace!(debouncer = self.name, "Cancelled pending task");
                true
            }
            _ => false,
        }
    }

    /// A task is waiting for its delay to elapse
    pub fn is_pending(&self) -> bool {
        self.slot()
            .as_ref()
            .map(|p| !p.fired.load(Ordering::SeqCst) && !p.handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn rapid_schedules_run_once_with_last_value() {
        let debouncer = Debouncer::new("test", Duration::from_millis(500));
        let runs = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));

        for i in 1..=5 {
            let runs = runs.clone();
            let last = last.clone();
            debouncer.schedule(async move {
                runs.fetch_add(1, Ordering::SeqCst);
                last.store(i, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 5);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_task() {
        let debouncer = Debouncer::new("test", Duration::from_millis(300));
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        debouncer.schedule(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(debouncer.cancel());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!debouncer.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_schedules_each_run() {
        let debouncer = Debouncer::new("test", Duration::from_millis(100));
        let runs = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = runs.clone();
            debouncer.schedule(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }
}
