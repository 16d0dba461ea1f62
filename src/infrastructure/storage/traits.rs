//! Storage trait definitions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::InfraResult;

/// Named slot of the local durable store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageSlot {
    /// Last written snapshot
    Primary,
    /// Copy taken before destructive operations
    Backup,
}

impl StorageSlot {
    pub fn key(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Backup => "backup",
        }
    }
}

impl std::fmt::Display for StorageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Local durable store holding one serialized snapshot per slot
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn read(&self, slot: StorageSlot) -> InfraResult<Option<String>>;
    async fn write(&self, slot: StorageSlot, json: &str) -> InfraResult<()>;
    /// Removing an empty slot is not an error
    async fn remove(&self, slot: StorageSlot) -> InfraResult<()>;
}
