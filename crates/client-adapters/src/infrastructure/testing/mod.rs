//! Test-only infrastructure fakes.
//!
//! These helpers implement outbound ports for unit tests (controllers,
//! search, selection), allowing tests to run without a real backend.

pub mod mock_backend;

pub use mock_backend::{EnvelopeStyle, MockBackend, RecordedCall};
