//! Generic world-scoped entity record

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::ids::{EntityId, WorldId};
use crate::resource::{FieldAccess, Resource};
use crate::value_objects::Scope;

/// One character, location, power level, ... as stored by the backend.
///
/// Only identity and world membership are typed; the kind-specific
/// descriptive fields stay in `fields` under their storage names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub world_id: WorldId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl EntityRecord {
    pub fn new(id: EntityId, world_id: WorldId) -> Self {
        Self {
            id,
            world_id,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl FieldAccess for EntityRecord {
    fn field_text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

impl Resource for EntityRecord {
    type Id = EntityId;

    fn id(&self) -> &EntityId {
        &self.id
    }

    /// A list item without `world_id` belongs to the world it was listed under.
    fn from_wire(value: Value, scope: &Scope) -> Result<Self, DomainError> {
        let Value::Object(mut fields) = value else {
            return Err(DomainError::parse("entity record must be a JSON object"));
        };

        let id = match fields.remove("id") {
            Some(Value::Null) | None => {
                return Err(DomainError::invalid_id("entity record has no id"));
            }
            Some(raw) => serde_json::from_value::<EntityId>(raw)
                .map_err(|e| DomainError::invalid_id(e.to_string()))?,
        };

        let world_id = match fields.remove("world_id") {
            Some(Value::Null) | None => scope.world_id.clone().ok_or_else(|| {
                DomainError::invalid_id(format!("entity {} has no world_id", id))
            })?,
            Some(raw) => serde_json::from_value::<WorldId>(raw)
                .map_err(|e| DomainError::invalid_id(e.to_string()))?,
        };

        Ok(Self {
            id,
            world_id,
            fields,
        })
    }

    fn to_storage(&self) -> Map<String, Value> {
        let mut map = self.fields.clone();
        if let Ok(world_id) = serde_json::to_value(&self.world_id) {
            map.insert("world_id".to_string(), world_id);
        }
        map
    }
}
