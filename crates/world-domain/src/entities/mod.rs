//! Domain entities

mod record;
mod world;

pub use record::EntityRecord;
pub use world::{World, WorldStatus};
