//! JSON-file storage implementation

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{LocalStore, StorageSlot};
use crate::shared::InfraResult;

/// Stores each slot as `<slot>.json` inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, slot: StorageSlot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.key()))
    }
}

#[async_trait]
impl LocalStore for FileStore {
    async fn read(&self, slot: StorageSlot) -> InfraResult<Option<String>> {
        match fs::read_to_string(self.path_for(slot)).await {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Written to a temporary file first, then renamed over the slot
    async fn write(&self, slot: StorageSlot, json: &str) -> InfraResult<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(slot);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), bytes = json.len(), "Snapshot written");
        Ok(())
    }

    async fn remove(&self, slot: StorageSlot) -> InfraResult<()> {
        match fs::remove_file(self.path_for(slot)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_read_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("onboarding"));

        assert_eq!(store.read(StorageSlot::Primary).await.unwrap(), None);

        store.write(StorageSlot::Primary, "{}").await.unwrap();
        store.write(StorageSlot::Backup, "[]").await.unwrap();
        assert!(store.path_for(StorageSlot::Primary).exists());
        assert_eq!(store.read(StorageSlot::Primary).await.unwrap().as_deref(), Some("{}"));
        assert_eq!(store.read(StorageSlot::Backup).await.unwrap().as_deref(), Some("[]"));

        store.remove(StorageSlot::Primary).await.unwrap();
        store.remove(StorageSlot::Primary).await.unwrap();
        assert_eq!(store.read(StorageSlot::Primary).await.unwrap(), None);
        assert!(!store.dir().join("primary.json.tmp").exists());
    }
}
