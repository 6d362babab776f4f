//! Infrastructure layer - External adapters

pub mod config;
pub mod console;
pub mod http_client;
pub mod storage;

pub use config::AppConfig;
pub use console::{AutoConfirm, ConsoleNotifier, StdinConfirmation};
pub use http_client::HttpApiClient;
pub use storage::{FileStorageProvider, MemoryStorageProvider};

// In-memory backend fake.
// Available for integration testing from other crates as well
pub mod testing;
