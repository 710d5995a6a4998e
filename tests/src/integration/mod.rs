//! Cross-layer integration tests.

pub mod lifecycle;
pub mod workflow;
