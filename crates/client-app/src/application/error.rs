//! Service layer error types
//!
//! Abstracts over transport errors, backend envelope errors and form
//! validation so views only ever see one error type.

use thiserror::Error;
use worldloom_domain::DomainError;
use worldloom_ports::outbound::ApiError;

/// Errors that can occur in service operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// Request failed at the transport level
    #[error("Request error: {0}")]
    Api(#[from] ApiError),

    /// Backend answered with a non-success envelope code
    #[error("Server error ({code}): {message}")]
    Server { code: i64, message: String },

    /// Form values were rejected before sending
    #[error("{0}")]
    Validation(#[from] DomainError),

    /// Response data could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A world-scoped operation ran with no world selected
    #[error("No world selected")]
    NoWorldSelected,

    /// Submit or field edit with no create/edit form open
    #[error("No form is open")]
    NoOpenForm,

    /// A submission is already in flight for this form
    #[error("A submission is already in progress")]
    Busy,

    /// Superseded by a newer request or torn down
    #[error("Request cancelled")]
    Cancelled,
}

impl ServiceError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Api(ApiError::NotFound))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ServiceError::Cancelled)
    }

    /// Check if this error came from the form values themselves
    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Validation(e) if e.is_user_input())
    }
}
