//! Bidirectional form <-> storage field name tables
//!
//! A few entity kinds show form fields under different names than the
//! backend stores them (power levels, common skills). Both directions are
//! derived from the same pair table so the load mapping is always the exact
//! inverse of the submit mapping.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::value_objects::FormValues;

/// Table of `(form_name, storage_name)` pairs.
///
/// Keys that appear in no pair pass through unchanged in both directions.
/// When a pass-through key collides with a mapped name, the mapped value
/// wins; [`FieldRemap::validate`] rejects tables where that can happen
/// between two pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRemap {
    pairs: &'static [(&'static str, &'static str)],
}

impl FieldRemap {
    /// No renaming at all
    pub const IDENTITY: FieldRemap = FieldRemap { pairs: &[] };

    pub const fn new(pairs: &'static [(&'static str, &'static str)]) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &'static [(&'static str, &'static str)] {
        self.pairs
    }

    pub fn is_identity(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Storage name for a form field
    pub fn storage_name<'a>(&self, form_name: &'a str) -> &'a str {
        self.pairs
            .iter()
            .find(|(form, _)| *form == form_name)
            .map(|(_, storage)| *storage)
            .unwrap_or(form_name)
    }

    /// Form name for a storage field
    pub fn form_name<'a>(&self, storage_name: &'a str) -> &'a str {
        self.pairs
            .iter()
            .find(|(_, storage)| *storage == storage_name)
            .map(|(form, _)| *form)
            .unwrap_or(storage_name)
    }

    /// Check that the table is a bijection whose two name sets do not overlap
    /// across pairs.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut forms = HashSet::new();
        let mut storages = HashSet::new();

        for (form, storage) in self.pairs {
            if form.is_empty() || storage.is_empty() {
                return Err(DomainError::remap("field names cannot be empty"));
            }
            if !forms.insert(*form) {
                return Err(DomainError::remap(format!(
                    "form field '{}' is mapped twice",
                    form
                )));
            }
            if !storages.insert(*storage) {
                return Err(DomainError::remap(format!(
                    "storage field '{}' is mapped twice",
                    storage
                )));
            }
        }

        for (form, storage) in self.pairs {
            let shadows = self
                .pairs
                .iter()
                .any(|(other_form, other_storage)| other_form != form && other_storage == form);
            if shadows {
                return Err(DomainError::remap(format!(
                    "form field '{}' is also another pair's storage name (paired with '{}')",
                    form, storage
                )));
            }
        }

        Ok(())
    }

    /// Rename form fields to the names the backend stores.
    pub fn to_storage(&self, form: &FormValues) -> Map<String, Value> {
        rename(form.as_map(), self.pairs.iter().map(|(f, s)| (*f, *s)))
    }

    /// Rename stored fields to the names the form shows.
    pub fn to_form(&self, storage: &Map<String, Value>) -> FormValues {
        FormValues::from_map(rename(storage, self.pairs.iter().map(|(f, s)| (*s, *f))))
    }
}

impl Default for FieldRemap {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn rename<'p>(
    source: &Map<String, Value>,
    pairs: impl Iterator<Item = (&'p str, &'p str)> + Clone,
) -> Map<String, Value> {
    let mut out = Map::new();

    for (key, value) in source {
        if !pairs.clone().any(|(from, _)| from == key.as_str()) {
            out.insert(key.clone(), value.clone());
        }
    }

    // mapped values last so they win over pass-through collisions
    for (from, to) in pairs {
        if let Some(value) = source.get(from) {
            out.insert(to.to_string(), value.clone());
        }
    }

    out
}
