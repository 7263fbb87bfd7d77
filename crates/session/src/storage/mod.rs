//! Durable key-value storage for session tokens
//!
//! Shaped like the browser `Storage` API, except that writes and removals
//! take a batch so that related keys change together.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;

/// String key-value storage
pub trait StorageBackend: Send + Sync {
    /// Read a single entry
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write every entry, or none of them
    fn set_items(&self, items: &[(&str, &str)]) -> Result<(), StorageError>;

    /// Remove every key, or none of them; missing keys are ignored
    fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError>;
}
