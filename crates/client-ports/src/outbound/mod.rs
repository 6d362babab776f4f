//! Outbound ports - Interfaces for external services
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing application services to interact with the backend, durable storage
//! and the user without depending on concrete implementations.

pub mod api_error;
pub mod notification_port;
pub mod platform;
pub mod raw_api_port;

pub use api_error::ApiError;
pub use notification_port::{ConfirmationPort, Notice, NoticeLevel, NotificationPort};
pub use platform::{storage_keys, StorageProvider};
pub use raw_api_port::RawApiPort;

#[cfg(any(test, feature = "testing"))]
pub use notification_port::{MockConfirmationPort, MockNotificationPort};
#[cfg(any(test, feature = "testing"))]
pub use platform::MockStorageProvider;
#[cfg(any(test, feature = "testing"))]
pub use raw_api_port::MockRawApiPort;
