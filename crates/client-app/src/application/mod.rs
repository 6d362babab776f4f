//! Application layer - Use cases and orchestration

pub mod api;
pub mod crud;
pub mod envelope;
pub mod error;
pub mod search;
pub mod selection;
pub mod services;

// Re-export common types
pub use api::Api;
pub use crud::{ControllerState, CrudController, DeleteOutcome, ModalMode, ModalState, Phase};
pub use error::ServiceError;
pub use search::{GlobalSearch, SearchQuery, SearchResults, SearchSession};
pub use selection::{SelectionContext, SelectionState};
pub use services::ResourceService;
