//! Worldloom client adapters.

pub mod infrastructure;
