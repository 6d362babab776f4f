//! Unified error types for the domain layer
//!
//! Provides a common error type for validation, identifier parsing and
//! remap-table checks, so adapters never have to fall back to `String`.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invalid ID format
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// A required field is absent or blank
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Category value outside the kind's fixed enumeration
    #[error("Unknown {field} value '{value}'")]
    UnknownCategory { field: String, value: String },

    /// A field remap table is not a bijection
    #[error("Invalid field remap: {0}")]
    Remap(String),

    /// Parse error (for wire records and value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    ///
    /// # Example
    /// ```ignore
    /// if !value.is_string() {
    ///     return Err(DomainError::validation("character_type must be text"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid ID error
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create an unknown category error
    pub fn unknown_category(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnknownCategory {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a remap table error
    pub fn remap(msg: impl Into<String>) -> Self {
        Self::Remap(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Whether this error came from user-supplied form values
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::MissingField(_) | Self::UnknownCategory { .. }
        )
    }
}
