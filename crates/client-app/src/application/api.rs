//! Typed API wrapper for application services.
//!
//! The composition root stores an object-safe `RawApiPort` implementation so
//! services never depend on adapter types. `Api` wraps that `Arc<dyn ...>`,
//! does the serde_json conversions and strips response envelopes.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use worldloom_ports::outbound::{ApiError, RawApiPort};

use crate::application::envelope;
use crate::application::ServiceError;

#[derive(Clone)]
pub struct Api {
    raw: Arc<dyn RawApiPort>,
}

impl Api {
    pub fn new(raw: Arc<dyn RawApiPort>) -> Self {
        Self { raw }
    }

    /// GET a list endpoint and normalise its envelope
    pub async fn get_list(&self, path: &str) -> Result<Vec<Value>, ServiceError> {
        let value = self.raw.get_json(path).await?;
        envelope::unwrap_list(value)
    }

    pub async fn post<B: Serialize + Send + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, ServiceError> {
        let body_value =
            serde_json::to_value(body).map_err(|e| ApiError::SerializeError(e.to_string()))?;
        let value = self.raw.post_json(path, &body_value).await?;
        envelope::unwrap_item(value)
    }

    pub async fn put<B: Serialize + Send + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, ServiceError> {
        let body_value =
            serde_json::to_value(body).map_err(|e| ApiError::SerializeError(e.to_string()))?;
        let value = self.raw.put_json(path, &body_value).await?;
        envelope::unwrap_item(value)
    }

    /// DELETE a path; an error envelope in the body still fails the call
    pub async fn delete(&self, path: &str) -> Result<(), ServiceError> {
        let value = self.raw.delete(path).await?;
        envelope::unwrap_item(value).map(|_| ())
    }
}
