//! # Application Layer
//!
//! The article synchronization service, the wallet session adapter, and
//! the content-store liveness monitor.

pub mod liveness;
pub mod service;
pub mod session;

pub use liveness::LivenessMonitor;
pub use service::{ArticleSyncService, WorkflowEvent};
pub use session::WalletSession;
