//! Persistence manager: local durable cache and remote auto-save

mod auto_saver;
mod local_cache;

pub use auto_saver::{AutoSaveConfig, AutoSaveState, AutoSaver, SaveOutcome};
pub use local_cache::{LocalCache, LocalCacheConfig};
