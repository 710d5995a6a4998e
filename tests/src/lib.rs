//! # DeNews Client Test Suite
//!
//! Unified test crate containing cross-layer tests that exercise the
//! client library through its public API, against the mock wallet,
//! ledger, and gateway ports.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── workflow.rs   # Publish / list / read choreography
//!     └── lifecycle.rs  # Session and liveness-monitor lifecycles
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p denews-tests
//!
//! # By category
//! cargo test -p denews-tests integration::workflow::
//! cargo test -p denews-tests integration::lifecycle::
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
