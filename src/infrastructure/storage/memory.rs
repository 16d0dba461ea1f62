//! In-memory storage implementation

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{LocalStore, StorageSlot};
use crate::shared::{InfraError, InfraResult};

/// In-memory store for development and testing.
///
/// Counts successful writes and can be told to fail the next writes, which
/// is how quota or I/O failures of a real store are simulated.
#[derive(Default)]
pub struct InMemoryStore {
    slots: DashMap<StorageSlot, String>,
    writes: AtomicUsize,
    failing_writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn get(&self, slot: StorageSlot) -> Option<String> {
        self.slots.get(&slot).map(|v| v.clone())
    }

    pub fn insert(&self, slot: StorageSlot, json: impl Into<String>) {
        self.slots.insert(slot, json.into());
    }
}

#[async_trait]
impl LocalStore for InMemoryStore {
    async fn read(&self, slot: StorageSlot) -> InfraResult<Option<String>> {
        Ok(self.get(slot))
    }

    async fn write(&self, slot: StorageSlot, json: &str) -> InfraResult<()> {
        let failing = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(InfraError::Storage(format!("write to {} slot failed", slot)));
        }
        self.slots.insert(slot, json.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, slot: StorageSlot) -> InfraResult<()> {
        self.slots.remove(&slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slots_are_independent() {
        let store = InMemoryStore::new();
        store.write(StorageSlot::Primary, "{\"a\":1}").await.unwrap();
        assert_eq!(store.read(StorageSlot::Backup).await.unwrap(), None);
        assert_eq!(
            store.read(StorageSlot::Primary).await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        store.remove(StorageSlot::Primary).await.unwrap();
        store.remove(StorageSlot::Primary).await.unwrap();
        assert_eq!(store.read(StorageSlot::Primary).await.unwrap(), None);
    }

    #[tokio::test]
    async fn injected_failures_run_out() {
        let store = InMemoryStore::new();
        store.fail_next_writes(1);
        assert!(store.write(StorageSlot::Primary, "x").await.is_err());
        assert!(store.write(StorageSlot::Primary, "y").await.is_ok());
        assert_eq!(store.write_count(), 1);
    }
}
