//! Platform abstraction ports
//!
//! Durable key/value storage standing in for the browser's local storage.
//! Implementations live in the adapters crate (file-backed and in-memory).

/// Persistent storage abstraction (localStorage/file-based)
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait StorageProvider: Send + Sync {
    /// Save a string value with the given key
    fn save(&self, key: &str, value: &str);

    /// Load a string value by key, returns None if not found
    fn load(&self, key: &str) -> Option<String>;

    /// Remove a value by key
    fn remove(&self, key: &str);
}

/// Storage key constants
///
/// Kept in the ports layer as they define the contract for what keys are
/// shared across the application.
pub mod storage_keys {
    /// Identifier of the last selected world, as a string
    pub const SELECTED_WORLD_ID: &str = "selectedWorldId";
}
