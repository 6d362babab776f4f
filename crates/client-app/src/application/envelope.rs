//! Response envelope normalisation
//!
//! Endpoints answer lists as a bare array, as `{code, data}`, as `{data}` or
//! as `{data: {data}}`. Everything is unwrapped here, at the boundary, into
//! one canonical shape: `Vec<Value>` for lists, a single `Value` for items.

use serde_json::{Map, Value};

use crate::application::ServiceError;

/// Envelope codes that mean success
pub const SUCCESS_CODES: [i64; 2] = [0, 200];

/// Deepest `data` nesting that is unwrapped
const MAX_ENVELOPE_DEPTH: usize = 3;

/// Unwrap a list response.
///
/// `null` and unrecognised shapes default to an empty list with a warning;
/// a non-success envelope code is an error.
pub fn unwrap_list(value: Value) -> Result<Vec<Value>, ServiceError> {
    match unwrap_item(value)? {
        Value::Array(items) => Ok(items),
        Value::Null => {
            tracing::warn!("List response carried no data, treating as empty");
            Ok(Vec::new())
        }
        other => {
            tracing::warn!(
                "Unrecognised list response shape ({}), treating as empty",
                shape_name(&other)
            );
            Ok(Vec::new())
        }
    }
}

/// Unwrap a single-item response (create/update/delete bodies).
pub fn unwrap_item(mut value: Value) -> Result<Value, ServiceError> {
    for _ in 0..MAX_ENVELOPE_DEPTH {
        let Value::Object(map) = &value else {
            return Ok(value);
        };

        if let Some(code) = map.get("code") {
            check_code(code, map)?;
        } else if !is_data_wrapper(map) {
            return Ok(value);
        }

        value = match value {
            Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
            other => other,
        };
    }
    Ok(value)
}

/// `{data: ...}` without record identity, as opposed to a record that
/// happens to have a `data` field
fn is_data_wrapper(map: &Map<String, Value>) -> bool {
    map.contains_key("data") && !map.contains_key("id")
}

fn check_code(code: &Value, map: &Map<String, Value>) -> Result<(), ServiceError> {
    let parsed = match code {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed {
        Some(code) if SUCCESS_CODES.contains(&code) => Ok(()),
        Some(code) => Err(ServiceError::Server {
            code,
            message: envelope_message(map),
        }),
        None => Err(ServiceError::Parse(format!("unrecognised envelope code {}", code))),
    }
}

fn envelope_message(map: &Map<String, Value>) -> String {
    ["message", "msg", "error"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .unwrap_or("request failed")
        .to_string()
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
