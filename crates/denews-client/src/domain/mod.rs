//! # Domain Layer
//!
//! Entities, the error taxonomy, and pure role classification.

pub mod entities;
pub mod errors;
pub mod roles;

pub use entities::{
    AccessLevel, Address, Article, ArticleDraft, ContentHash, PendingTx, PublishReceipt,
    RoleAssignment, Session, TxReceipt,
};
pub use errors::{ClientError, PublishError};
pub use roles::{role_for, Role};
