//! In-memory REST backend for tests
//!
//! Implements `RawApiPort` over a map of endpoint → JSON records, following
//! the backend's conventions: list with `?world_id=..&project_id=..` filters,
//! create on the endpoint, update/delete on `{endpoint}/{id}`. Every call is
//! recorded, and failures or latency can be injected per endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use worldloom_ports::outbound::{ApiError, RawApiPort};

/// How responses are wrapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeStyle {
    /// The payload itself
    #[default]
    Bare,
    /// `{"code": 200, "data": payload}`
    CodeData,
    /// `{"data": payload}`
    Data,
    /// `{"data": {"data": payload}}`
    NestedData,
}

impl EnvelopeStyle {
    fn wrap(self, payload: Value) -> Value {
        match self {
            EnvelopeStyle::Bare => payload,
            EnvelopeStyle::CodeData => json!({"code": 200, "data": payload}),
            EnvelopeStyle::Data => json!({ "data": payload }),
            EnvelopeStyle::NestedData => json!({"data": {"data": payload}}),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Collection {
    records: Vec<Value>,
    next_id: i64,
}

struct Failure {
    method: &'static str,
    endpoint: String,
    error: ApiError,
    /// `None` fails every matching call
    remaining: Option<usize>,
}

#[derive(Default)]
struct State {
    collections: HashMap<String, Collection>,
    envelopes: HashMap<String, EnvelopeStyle>,
    latency: HashMap<String, Duration>,
    failures: Vec<Failure>,
    calls: Vec<RecordedCall>,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<State>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the records stored under `endpoint`
    pub fn seed(&self, endpoint: &str, records: Vec<Value>) -> &Self {
        let next_id = records
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1;
        self.lock().collections.insert(
            endpoint.to_string(),
            Collection { records, next_id },
        );
        self
    }

    pub fn with_envelope(&self, endpoint: &str, style: EnvelopeStyle) -> &Self {
        self.lock().envelopes.insert(endpoint.to_string(), style);
        self
    }

    /// Delay every call to `endpoint`
    pub fn set_latency(&self, endpoint: &str, delay: Duration) -> &Self {
        self.lock().latency.insert(endpoint.to_string(), delay);
        self
    }

    /// Fail every `method` call to `endpoint` with `error`
    pub fn fail(&self, method: &'static str, endpoint: &str, error: ApiError) -> &Self {
        self.push_failure(method, endpoint, error, None)
    }

    /// Fail only the next `method` call to `endpoint`
    pub fn fail_once(&self, method: &'static str, endpoint: &str, error: ApiError) -> &Self {
        self.push_failure(method, endpoint, error, Some(1))
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Records currently stored under `endpoint`
    pub fn records(&self, endpoint: &str) -> Vec<Value> {
        self.lock()
            .collections
            .get(endpoint)
            .map(|c| c.records.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Number of `method` calls whose target is `endpoint` or one of its items
    pub fn call_count(&self, method: &str, endpoint: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.method == method && endpoint_of(c.method, &c.path) == endpoint)
            .count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn push_failure(
        &self,
        method: &'static str,
        endpoint: &str,
        error: ApiError,
        remaining: Option<usize>,
    ) -> &Self {
        self.lock().failures.push(Failure {
            method,
            endpoint: endpoint.to_string(),
            error,
            remaining,
        });
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call, wait out any latency, then apply injected failures
    async fn begin(
        &self,
        method: &'static str,
        path: &str,
        body: Option<&Value>,
    ) -> Result<String, ApiError> {
        let endpoint = endpoint_of(method, path).to_string();
        let delay = {
            let mut state = self.lock();
            state.calls.push(RecordedCall {
                method,
                path: path.to_string(),
                body: body.cloned(),
            });
            state.latency.get(&endpoint).copied()
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        let position = state
            .failures
            .iter()
            .position(|f| f.method == method && f.endpoint == endpoint);
        if let Some(index) = position {
            let failure = &mut state.failures[index];
            let error = failure.error.clone();
            if let Some(remaining) = failure.remaining.as_mut() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    state.failures.remove(index);
                }
            }
            return Err(error);
        }
        Ok(endpoint)
    }

    fn envelope(&self, endpoint: &str) -> EnvelopeStyle {
        self.lock()
            .envelopes
            .get(endpoint)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RawApiPort for MockBackend {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let endpoint = self.begin("GET", path, None).await?;
        let filters: Vec<(String, String)> = match path.split_once('?') {
            Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            None => Vec::new(),
        };

        let records: Vec<Value> = self
            .records(&endpoint)
            .into_iter()
            .filter(|record| {
                filters.iter().all(|(key, expected)| {
                    record.get(key.as_str()).and_then(id_text).as_deref() == Some(expected.as_str())
                })
            })
            .collect();

        Ok(self.envelope(&endpoint).wrap(Value::Array(records)))
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let endpoint = self.begin("POST", path, Some(body)).await?;
        let mut record = as_object(body)?;

        let created = {
            let mut state = self.lock();
            let collection = state.collections.entry(endpoint.clone()).or_insert_with(|| Collection {
                records: Vec::new(),
                next_id: 1,
            });
            if !record.contains_key("id") {
                record.insert("id".into(), json!(collection.next_id));
                collection.next_id += 1;
            }
            let created = Value::Object(record);
            collection.records.push(created.clone());
            created
        };

        Ok(self.envelope(&endpoint).wrap(created))
    }

    async fn put_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let endpoint = self.begin("PUT", path, Some(body)).await?;
        let id = item_id(path);
        let mut record = as_object(body)?;

        let updated = {
            let mut state = self.lock();
            let existing = state
                .collections
                .get_mut(&endpoint)
                .and_then(|c| {
                    c.records
                        .iter_mut()
                        .find(|r| r.get("id").and_then(id_text).as_deref() == Some(id))
                })
                .ok_or(ApiError::NotFound)?;

            if let Some(original_id) = existing.get("id").cloned() {
                record.insert("id".into(), original_id);
            }
            *existing = Value::Object(record);
            existing.clone()
        };

        Ok(self.envelope(&endpoint).wrap(updated))
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        let endpoint = self.begin("DELETE", path, None).await?;
        let id = item_id(path);

        {
            let mut state = self.lock();
            let collection = state.collections.get_mut(&endpoint).ok_or(ApiError::NotFound)?;
            let before = collection.records.len();
            collection
                .records
                .retain(|r| r.get("id").and_then(id_text).as_deref() != Some(id));
            if collection.records.len() == before {
                return Err(ApiError::NotFound);
            }
        }

        Ok(match self.envelope(&endpoint) {
            EnvelopeStyle::Bare => Value::Null,
            style => style.wrap(Value::Null),
        })
    }
}

/// Collection a call targets: the path itself for GET/POST, its parent for
/// item calls
fn endpoint_of<'a>(method: &str, path: &'a str) -> &'a str {
    let path = path.split('?').next().unwrap_or(path);
    match method {
        "PUT" | "DELETE" => path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or(path),
        _ => path,
    }
}

fn item_id(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, id)| id).unwrap_or_default()
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn as_object(body: &Value) -> Result<Map<String, Value>, ApiError> {
    body.as_object()
        .cloned()
        .ok_or_else(|| ApiError::http(422, "body must be a JSON object"))
}
