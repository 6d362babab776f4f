//! Raw API Port - Object-safe HTTP boundary
//!
//! Typed request/response methods are generic and therefore not object-safe.
//! The composition root stores a `RawApiPort` behind `Arc<dyn ...>` and the
//! application layer wraps it with a typed `Api` that does the serde_json
//! conversions.
//!
//! Paths are relative to the backend base URL and may carry a query string.

use async_trait::async_trait;
use serde_json::Value;

use super::ApiError;

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RawApiPort: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError>;

    async fn put_json(&self, path: &str, body: &Value) -> Result<Value, ApiError>;

    /// Empty response bodies come back as `Value::Null`
    async fn delete(&self, path: &str) -> Result<Value, ApiError>;
}
