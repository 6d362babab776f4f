//! Worldloom port definitions.
//!
//! Application services depend on these traits only; adapters implement them.

pub mod outbound;
