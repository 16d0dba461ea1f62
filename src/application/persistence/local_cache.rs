//! Local durable cache
//!
//! Writes the aggregate to the `primary` slot of a [`LocalStore`]. Ordinary
//! saves are debounced so a burst of edits costs one write; immediate saves
//! go out at once and drop whatever was still waiting. A failed write is
//! retried once after freeing the `backup` slot.
//!
//! Every snapshot carries the store revision it was taken at. Writes are
//! serialized and a snapshot older than the last one written (or than the
//! revision a `clear` was issued at) is dropped instead of written.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use crate::domain::ports::{Notification, Notifier, TracingNotifier};
use crate::domain::OnboardingData;
use crate::infrastructure::storage::{LocalStore, StorageSlot};
use crate::notifications::{LocalSaveFailedEvent, OnboardingEvent, SharedEventBus};
use crate::shared::{Debouncer, InfraResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalCacheConfig {
    pub debounce_ms: u64,
}

impl Default for LocalCacheConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

#[derive(Clone)]
struct Stamped {
    data: Arc<OnboardingData>,
    revision: u64,
}

struct CacheInner {
    store: Arc<dyn LocalStore>,
    pending: Mutex<Option<Stamped>>,
    /// Newest revision written or cleared; `None` before the first write
    written: AsyncMutex<Option<u64>>,
    events: Option<SharedEventBus>,
    notifier: Arc<dyn Notifier>,
}

impl CacheInner {
    fn take_pending(&self) -> Option<Stamped> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    fn set_pending(&self, snapshot: Stamped) {
        *self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(snapshot);
    }

    async fn write_now(&self, snapshot: &Stamped) -> InfraResult<()> {
        let mut written = self.written.lock().await;
        if written.is_some_and(|newest| snapshot.revision <= newest) {
            debug!(
                revision = snapshot.revision,
                newest = ?*written,
                "Skipped stale local snapshot"
            );
            return Ok(());
        }

        let json = serde_json::to_string(&*snapshot.data)?;
        if let Err(first) = self.store.write(StorageSlot::Primary, &json).await {
            warn!(error = %first, "Local save failed, freeing backup slot and retrying");
            if let Err(e) = self.store.remove(StorageSlot::Backup).await {
                warn!(error = %e, "Could not remove backup slot");
            }
            if let Err(second) = self.store.write(StorageSlot::Primary, &json).await {
                self.escalate(&second);
                return Err(second);
            }
        }
        *written = Some(snapshot.revision);
        debug!(
            revision = snapshot.revision,
            bytes = json.len(),
            "Local snapshot saved"
        );
        Ok(())
    }

    fn escalate(&self, e: &dyn std::fmt::Display) {
        error!(error = %e, "Local save failed after recovery, snapshot not persisted");
        if let Some(events) = &self.events {
            events.publish(OnboardingEvent::LocalSaveFailed(LocalSaveFailedEvent {
                error: e.to_string(),
            }));
        }
        self.notifier.notify(Notification::error(
            "Local save failed",
            format!("Your progress could not be stored on this device: {}", e),
        ));
    }

    async fn flush_pending(&self) -> InfraResult<()> {
        match self.take_pending() {
            Some(snapshot) => self.write_now(&snapshot).await,
            None => Ok(()),
        }
    }

    async fn read_slot(&self, slot: StorageSlot) -> Option<OnboardingData> {
        let json = match self.store.read(slot).await {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                warn!(%slot, error = %e, "Could not read local snapshot");
                return None;
            }
        };
        match serde_json::from_str(&json) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(%slot, error = %e, "Local snapshot is malformed");
                None
            }
        }
    }
}

pub struct LocalCache {
    inner: Arc<CacheInner>,
    debouncer: Debouncer,
}

impl LocalCache {
    pub fn new(store: Arc<dyn LocalStore>, config: LocalCacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                store,
                pending: Mutex::new(None),
                written: AsyncMutex::new(None),
                events: None,
                notifier: Arc::new(TracingNotifier),
            }),
            debouncer: Debouncer::new("local_cache", Duration::from_millis(config.debounce_ms)),
        }
    }

    /// Publish `LocalSaveFailed` on this bus when a write is lost
    pub fn with_events(self, events: SharedEventBus) -> Self {
        let notifier = self.inner.notifier.clone();
        self.rebuild(Some(events), notifier)
    }

    /// Tell the user through `notifier` when a write is lost
    pub fn with_notifier(self, notifier: Arc<dyn Notifier>) -> Self {
        let events = self.inner.events.clone();
        self.rebuild(events, notifier)
    }

    fn rebuild(self, events: Option<SharedEventBus>, notifier: Arc<dyn Notifier>) -> Self {
        let pending = self.inner.take_pending();
        let written = self
            .inner
            .written
            .try_lock()
            .map(|guard| *guard)
            .unwrap_or_default();
        Self {
            inner: Arc::new(CacheInner {
                store: self.inner.store.clone(),
                pending: Mutex::new(pending),
                written: AsyncMutex::new(written),
                events,
                notifier,
            }),
            debouncer: self.debouncer,
        }
    }

    /// Persist `data`, taken at store `revision`. Immediate saves write now
    /// and replace any pending debounced write; others are coalesced.
    ///
    /// A snapshot not newer than the last one written is dropped.
    pub async fn save(
        &self,
        data: Arc<OnboardingData>,
        revision: u64,
        immediate: bool,
    ) -> InfraResult<()> {
        let snapshot = Stamped { data, revision };
        if immediate {
            self.debouncer.cancel();
            self.inner.take_pending();
            return self.inner.write_now(&snapshot).await;
        }

        self.inner.set_pending(snapshot);
        let inner = self.inner.clone();
        self.debouncer.schedule(async move {
            // failures are escalated inside write_now
            let _ = inner.flush_pending().await;
        });
        Ok(())
    }

    /// Write the pending snapshot, if any, without waiting for the debounce
    pub async fn flush(&self) -> InfraResult<()> {
        self.debouncer.cancel();
        self.inner.flush_pending().await
    }

    /// A debounced write is waiting
    pub fn has_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Last good snapshot: primary, else backup, else `None`
    pub async fn load(&self) -> Option<OnboardingData> {
        if let Some(data) = self.inner.read_slot(StorageSlot::Primary).await {
            return Some(data);
        }
        let backup = self.inner.read_slot(StorageSlot::Backup).await;
        if backup.is_some() {
            info!("Restored onboarding data from backup slot");
        }
        backup
    }

    /// Copy the primary snapshot into the backup slot.
    /// Returns whether there was anything to copy.
    pub async fn create_backup(&self) -> InfraResult<bool> {
        match self.inner.store.read(StorageSlot::Primary).await? {
            Some(json) => {
                self.inner.store.write(StorageSlot::Backup, &json).await?;
                debug!("Local backup created");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Back up, then drop the primary snapshot and anything pending.
    ///
    /// Snapshots taken at or before `revision` are refused from now on, so
    /// a save that was already in flight cannot bring the data back.
    pub async fn clear(&self, revision: u64) -> InfraResult<()> {
        self.debouncer.cancel();
        self.inner.take_pending();

        let mut written = self.inner.written.lock().await;
        self.create_backup().await?;
        self.inner.store.remove(StorageSlot::Primary).await?;
        *written = Some(written.map_or(revision, |newest| newest.max(revision)));
        info!(revision, "Local onboarding data cleared");
        Ok(())
    }

    /// Stop any pending write without persisting it
    pub fn cancel(&self) -> bool {
        self.inner.take_pending();
        self.debouncer.cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn data(first_name: &str) -> Arc<OnboardingData> {
        let mut data = OnboardingData::default();
        data.contact_info.first_name = first_name.into();
        Arc::new(data)
    }

    fn cache(store: &Arc<InMemoryStore>) -> LocalCache {
        LocalCache::new(store.clone(), LocalCacheConfig::default())
    }

    #[derive(Default)]
    struct CountingNotifier(AtomicUsize);

    impl Notifier for CountingNotifier {
        fn notify(&self, _notification: Notification) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_saves_coalesce_into_one_write() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache(&store);

        for (revision, name) in (1..).zip(["J", "Ja", "Jan", "Jana"]) {
            cache.save(data(name), revision, false).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(store.write_count(), 0);
        assert!(cache.has_pending());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.write_count(), 1);
        assert_eq!(cache.load().await.unwrap().contact_info.first_name, "Jana");
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_save_supersedes_pending() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache(&store);

        cache.save(data("old"), 1, false).await.unwrap();
        cache.save(data("new"), 2, true).await.unwrap();
        assert_eq!(store.write_count(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.write_count(), 1);
        assert_eq!(cache.load().await.unwrap().contact_info.first_name, "new");
    }

    #[tokio::test]
    async fn failed_write_is_retried_after_dropping_backup() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(StorageSlot::Backup, "{}");
        let cache = cache(&store);

        store.fail_next_writes(1);
        cache.save(data("Jana"), 1, true).await.unwrap();
        assert!(store.get(StorageSlot::Backup).is_none());
        assert_eq!(cache.load().await.unwrap().contact_info.first_name, "Jana");
    }

    #[tokio::test]
    async fn double_failure_is_escalated() {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(CountingNotifier::default());
        let events = crate::notifications::create_event_bus();
        let mut subscriber = events.subscribe();
        let cache = cache(&store)
            .with_events(events.clone())
            .with_notifier(notifier.clone());

        store.fail_next_writes(2);
        assert!(cache.save(data("Jana"), 1, true).await.is_err());
        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
        let message = subscriber.recv().await.unwrap();
        assert_eq!(message.event.event_type(), "local_save_failed");
    }

    #[tokio::test]
    async fn load_falls_back_to_backup_then_none() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache(&store);
        assert!(cache.load().await.is_none());

        store.insert(StorageSlot::Primary, "{not json");
        assert!(cache.load().await.is_none());

        store.insert(
            StorageSlot::Backup,
            serde_json::to_string(&*data("Backup")).unwrap(),
        );
        assert_eq!(cache.load().await.unwrap().contact_info.first_name, "Backup");
    }

    #[tokio::test]
    async fn clear_keeps_a_backup() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache(&store);
        cache.save(data("Jana"), 1, true).await.unwrap();

        cache.clear(1).await.unwrap();
        assert!(store.get(StorageSlot::Primary).is_none());
        assert!(store.get(StorageSlot::Backup).is_some());
        assert_eq!(cache.load().await.unwrap().contact_info.first_name, "Jana");
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_pending_snapshot() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache(&store);
        cache.save(data("Jana"), 1, false).await.unwrap();

        cache.flush().await.unwrap();
        assert_eq!(store.write_count(), 1);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn older_snapshot_never_overwrites_newer() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache(&store);

        cache.save(data("new"), 5, true).await.unwrap();
        cache.save(data("old"), 3, false).await.unwrap();
        cache.flush().await.unwrap();
        cache.save(data("older"), 2, true).await.unwrap();

        assert_eq!(store.write_count(), 1);
        assert_eq!(cache.load().await.unwrap().contact_info.first_name, "new");
    }

    #[tokio::test]
    async fn concurrent_saves_keep_the_newest_revision() {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(cache(&store));

        let saves: Vec<_> = (1..=8u64)
            .rev()
            .map(|revision| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    cache
                        .save(data(&revision.to_string()), revision, true)
                        .await
                })
            })
            .collect();
        for save in saves {
            save.await.unwrap().unwrap();
        }

        assert_eq!(cache.load().await.unwrap().contact_info.first_name, "8");
    }

    #[tokio::test]
    async fn clear_refuses_snapshots_taken_before_it() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache(&store);
        cache.save(data("Jana"), 1, true).await.unwrap();

        cache.clear(3).await.unwrap();
        cache.save(data("stale"), 2, true).await.unwrap();
        cache.save(data("reset"), 3, true).await.unwrap();
        assert!(store.get(StorageSlot::Primary).is_none());

        cache.save(data("Eva"), 4, true).await.unwrap();
        assert_eq!(cache.load().await.unwrap().contact_info.first_name, "Eva");
    }
}
