//! Records the CRUD engine can drive
//!
//! Worlds are typed, entity records are a loose field bag; both convert to
//! and from the backend's JSON through this trait so one engine handles all
//! of them.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::value_objects::{FormValues, ResourceSpec, Scope};

/// Read access to a record's text fields by storage name
pub trait FieldAccess {
    fn field_text(&self, key: &str) -> Option<&str>;
}

/// A record listed, created, edited and deleted through a [`ResourceSpec`]
pub trait Resource: FieldAccess + Clone + fmt::Debug + Send + Sync + 'static {
    type Id: Clone + fmt::Display + fmt::Debug + PartialEq + Send + Sync + 'static;

    fn id(&self) -> &Self::Id;

    /// Decode one list item. `scope` is the scope the list was fetched under.
    fn from_wire(value: Value, scope: &Scope) -> Result<Self, DomainError>;

    /// Storage-named fields, without the record id
    fn to_storage(&self) -> Map<String, Value>;

    /// Form values for an edit form
    fn to_form(&self, spec: &ResourceSpec) -> FormValues {
        spec.remap.to_form(&self.to_storage())
    }

    /// Display name taken from the resource's name field
    fn display_name(&self, spec: &ResourceSpec) -> String {
        self.field_text(spec.name_field)
            .unwrap_or_default()
            .to_string()
    }
}
