//! World entity - the root scope every other entity belongs to

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::ids::WorldId;
use crate::resource::{FieldAccess, Resource};
use crate::value_objects::Scope;

/// Lifecycle status of a world.
///
/// Values this client does not know are kept verbatim in `Other` so an
/// unchanged edit sends back exactly what the server stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum WorldStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
    Archived,
    Other(String),
}

impl WorldStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Archived => "archived",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for WorldStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "draft" => Self::Draft,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "archived" => Self::Archived,
            _ => Self::Other(raw),
        }
    }
}

impl fmt::Display for WorldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for WorldStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WorldStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// A fictional setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub id: WorldId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_concept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorldStatus>,
    /// Text or number, sent back as received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    /// Server-owned; never sent back
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
    /// Fields this client does not model, kept so edits do not drop them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl World {
    pub fn new(id: WorldId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            world_type: None,
            core_concept: None,
            description: None,
            status: None,
            version: None,
            created_at: None,
            extra: Map::new(),
        }
    }

    pub fn with_type(mut self, world_type: impl Into<String>) -> Self {
        self.world_type = Some(world_type.into());
        self
    }

    pub fn with_status(mut self, status: WorldStatus) -> Self {
        self.status = Some(status);
        self
    }
}

impl FieldAccess for World {
    fn field_text(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(self.name.as_str()),
            "world_type" => self.world_type.as_deref(),
            "core_concept" => self.core_concept.as_deref(),
            "description" => self.description.as_deref(),
            "status" => self.status.as_ref().map(WorldStatus::as_str),
            "version" => self.version.as_ref().and_then(Value::as_str),
            other => self.extra.get(other).and_then(Value::as_str),
        }
    }
}

impl Resource for World {
    type Id = WorldId;

    fn id(&self) -> &WorldId {
        &self.id
    }

    fn from_wire(value: Value, _scope: &Scope) -> Result<Self, DomainError> {
        serde_json::from_value(value).map_err(|e| DomainError::parse(e.to_string()))
    }

    fn to_storage(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => {
                map.remove("id");
                map
            }
            _ => Map::new(),
        }
    }
}

/// Accepts RFC 3339 or `YYYY-MM-DD HH:MM:SS`; anything else reads as `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::String(text)) = raw else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&text) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    Ok(NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc()))
}
