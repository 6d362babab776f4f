//! Static description of one CRUD resource
//!
//! Every entity kind (and the world list itself) is driven through the same
//! CRUD engine. What differs between kinds lives here: endpoint, scope rule,
//! category enumeration, required fields, field remap and statistics groups.

use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::value_objects::FieldRemap;

/// How a resource's list endpoint is scoped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRule {
    /// Listed without any world parameter (worlds themselves)
    Unscoped,
    /// Listed per world; no world selected means an empty list
    World,
}

/// A named subset of categories counted together in statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatGroup {
    pub label: &'static str,
    pub members: &'static [&'static str],
}

/// Configuration that instantiates the generic CRUD engine for one kind
#[derive(Debug, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Wire / command-line key ("character", "world", ...)
    pub key: &'static str,
    /// Human-readable label, also the search `typeName`
    pub label: &'static str,
    /// REST collection path
    pub endpoint: &'static str,
    pub scope: ScopeRule,
    /// Storage field holding the display name
    pub name_field: &'static str,
    /// Storage field holding the category tag, if the kind has one
    pub category_field: Option<&'static str>,
    /// Fixed category enumeration
    pub categories: &'static [&'static str],
    pub status_field: Option<&'static str>,
    /// Storage names that must be present and non-blank on submit
    pub required_fields: &'static [&'static str],
    pub remap: FieldRemap,
    pub stat_groups: &'static [StatGroup],
}

impl ResourceSpec {
    pub fn is_world_scoped(&self) -> bool {
        self.scope == ScopeRule::World
    }

    /// Path of one record under this resource
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), id)
    }

    pub fn accepts_category(&self, value: &str) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| *c == value)
    }

    /// Check a storage-named payload before it is sent.
    ///
    /// Required fields must be present, non-null and (for text) non-blank.
    /// A category value, when given, must belong to the enumeration.
    pub fn validate_payload(&self, payload: &Map<String, Value>) -> Result<(), DomainError> {
        for field in self.required_fields {
            let present = match payload.get(*field) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.trim().is_empty(),
                Some(_) => true,
            };
            if !present {
                return Err(DomainError::missing_field(self.remap.form_name(field)));
            }
        }

        if let Some(category_field) = self.category_field {
            match payload.get(category_field) {
                None | Some(Value::Null) => {}
                Some(Value::String(value)) if value.trim().is_empty() => {}
                Some(Value::String(value)) => {
                    if !self.accepts_category(value) {
                        return Err(DomainError::unknown_category(
                            self.remap.form_name(category_field),
                            value.clone(),
                        ));
                    }
                }
                Some(other) => {
                    return Err(DomainError::validation(format!(
                        "{} must be text, got {}",
                        self.remap.form_name(category_field),
                        other
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CHARACTER_SPEC, COMMON_SKILL_SPEC, POWER_LEVEL_SPEC};
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn complete_character_passes() {
        let p = payload(json!({"name": "Kael", "character_type": "protagonist"}));
        assert!(CHARACTER_SPEC.validate_payload(&p).is_ok());
    }

    #[test]
    fn blank_name_is_missing() {
        let p = payload(json!({"name": "   ", "character_type": "protagonist"}));
        assert_eq!(
            CHARACTER_SPEC.validate_payload(&p),
            Err(DomainError::MissingField("name".to_string()))
        );
    }

    #[test]
    fn category_outside_enumeration_is_rejected() {
        let p = payload(json!({"name": "Kael", "character_type": "sidekick"}));
        assert!(matches!(
            CHARACTER_SPEC.validate_payload(&p),
            Err(DomainError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn missing_field_is_reported_by_form_name() {
        let p = payload(json!({"level": 1}));
        assert_eq!(
            POWER_LEVEL_SPEC.validate_payload(&p),
            Err(DomainError::MissingField("level_title".to_string()))
        );
    }

    #[test]
    fn remapped_category_is_reported_by_form_name() {
        let p = payload(json!({"name": "Flash Step", "skill_type": "dance"}));
        assert_eq!(
            COMMON_SKILL_SPEC.validate_payload(&p),
            Err(DomainError::unknown_category("skill_category", "dance"))
        );
    }

    #[test]
    fn numeric_zero_counts_as_present() {
        let p = payload(json!({"level": 0, "level_name": "Mortal"}));
        assert!(POWER_LEVEL_SPEC.validate_payload(&p).is_ok());
    }
}
