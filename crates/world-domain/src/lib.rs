//! Worldloom domain: worlds, world-scoped entity records and the static
//! catalog that drives the generic CRUD engine.

pub mod catalog;
pub mod entities;
pub mod error;
pub mod ids;
pub mod resource;
pub mod search;
pub mod statistics;
pub mod value_objects;

pub use entities::{EntityRecord, World, WorldStatus};
pub use error::DomainError;
pub use ids::{EntityId, IdValue, ProjectId, WorldId};
pub use resource::{FieldAccess, Resource};
pub use search::{filter_hits, matches_term, SearchHit, TypeFilter};
pub use statistics::{EntityStatistics, GroupCount};
pub use value_objects::{
    EntityKind, FieldRemap, FormValues, ResourceSpec, Scope, ScopeRule, StatGroup,
};
