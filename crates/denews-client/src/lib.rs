//! # DeNews Client
//!
//! Client core for the DeNews decentralized news publishing platform.
//! Article bodies live on a content-addressed storage network; article
//! metadata and authorization live in a smart contract on a blockchain
//! ledger. This crate reconciles wallet state, ledger state, and
//! storage-gateway state into consistent results for a presentation layer.
//!
//! **Architecture:** Hexagonal (domain / ports / adapters / application)
//!
//! ## What lives where
//!
//! | Concern | Module |
//! |---------|--------|
//! | Entities, errors, role classification | [`domain`] |
//! | Wallet / ledger / store seams + mocks | [`ports`] |
//! | JSON-RPC and HTTP clients | [`adapters`] |
//! | Publish / list / hydrate workflow, session, liveness | [`application`] |
//! | Deployment surface | [`config`] |
//!
//! ## Workflow guarantees
//!
//! - The ledger write of a publish is never attempted before the upload
//!   has returned a content hash; a post-upload failure surfaces the hash
//!   for resubmission.
//! - Bulk listing fans out per-id fetches, waits for all to settle, and
//!   skips failed ids without failing the listing.
//! - Article bodies are hydrated on demand through a session-lifetime
//!   cache with at most one in-flight retrieval per content hash.
//!
//! ```text
//! denews-client/
//! ├── domain/          # Article, Session, RoleAssignment, error taxonomy
//! ├── ports/           # API trait (inbound) + dependency traits (outbound)
//! ├── adapters/        # RpcTransport, WalletRpc, LedgerRpc, HttpContentGateway
//! ├── application/     # ArticleSyncService, WalletSession, LivenessMonitor
//! └── config.rs        # ClientConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{HttpContentGateway, LedgerRpc, RpcTransport, WalletRpc};
pub use application::{ArticleSyncService, LivenessMonitor, WalletSession, WorkflowEvent};
pub use config::{ClientConfig, StoreConfig};
pub use domain::{
    role_for, AccessLevel, Address, Article, ArticleDraft, ClientError, ContentHash, PendingTx,
    PublishError, PublishReceipt, Role, RoleAssignment, Session, TxReceipt,
};
pub use ports::{
    CallLog, ContentGateway, LedgerContract, MockGateway, MockLedger, MockWallet, NewsroomApi,
    WalletEvent, WalletProvider,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
