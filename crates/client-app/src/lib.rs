//! Worldloom client application layer.

pub mod application;
