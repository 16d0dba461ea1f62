//! Storage traits and implementations

mod file;
mod memory;
mod traits;

pub use file::FileStore;
pub use memory::InMemoryStore;
pub use traits::{LocalStore, StorageSlot};
