//! Value objects

mod entity_kind;
mod field_remap;
mod form_values;
mod resource_spec;
mod scope;

pub use entity_kind::EntityKind;
pub use field_remap::FieldRemap;
pub use form_values::FormValues;
pub use resource_spec::{ResourceSpec, ScopeRule, StatGroup};
pub use scope::Scope;
