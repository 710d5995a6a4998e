//! # Error Types
//!
//! The failure taxonomy surfaced to presentation views. Every variant
//! carries the underlying reason text for display; no error is silently
//! dropped at a single-item boundary.

use thiserror::Error;

use super::entities::ContentHash;

/// Failures from the wallet provider, the ledger, or the content store.
///
/// Variants are `Clone` because hydrate-on-demand fans a single failure out
/// to every caller waiting on the same content hash.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No wallet provider is reachable. Fatal for any write path.
    #[error("wallet provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The user declined a wallet prompt. Recoverable by retrying.
    #[error("rejected in wallet: {0}")]
    UserRejected(String),

    /// The ledger RPC endpoint could not be reached. Transient.
    #[error("ledger unreachable: {0}")]
    LedgerUnreachable(String),

    /// The ledger rejected the transaction (unauthorized caller, malformed
    /// input). Retrying the same call will fail the same way.
    #[error("transaction reverted: {0}")]
    TransactionReverted(String),

    /// No article exists with this id.
    #[error("article not found: id {0}")]
    ArticleNotFound(u64),

    /// The content-store daemon or gateway could not be reached. Transient.
    #[error("content store unreachable: {0}")]
    StoreUnreachable(String),

    /// The gateway returned a non-success status for this hash.
    #[error("content not found: {0}")]
    ContentNotFound(String),

    /// A client-side precondition failed before any network call was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ClientError {
    /// Whether retrying the same call unchanged can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::LedgerUnreachable(_) | Self::StoreUnreachable(_) | Self::UserRejected(_)
        )
    }
}

/// A publish failure, split by where in the two-step flow it occurred.
///
/// Recovery differs: before the upload, the whole flow is retried; after
/// it, the content is already stored and addressable, and only the ledger
/// write needs resubmitting with the known hash.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The upload step (or its preconditions) failed; nothing was stored.
    #[error("publish failed before upload: {source}")]
    BeforeUpload {
        /// The underlying failure.
        #[source]
        source: ClientError,
    },

    /// The upload succeeded but the ledger write did not. The content
    /// object is stored but unreferenced ("orphaned"); the hash is carried
    /// here so the write can be resubmitted without re-uploading.
    #[error("content {content_hash} uploaded, publish rejected: {source}")]
    AfterUpload {
        /// The already-stored content, usable for resubmission.
        content_hash: ContentHash,
        /// The underlying failure.
        #[source]
        source: ClientError,
    },
}

impl PublishError {
    /// The underlying client error, regardless of phase.
    pub fn source_error(&self) -> &ClientError {
        match self {
            Self::BeforeUpload { source } | Self::AfterUpload { source, .. } => source,
        }
    }

    /// The content hash to resubmit with, when the upload already succeeded.
    pub fn uploaded_hash(&self) -> Option<&ContentHash> {
        match self {
            Self::BeforeUpload { .. } => None,
            Self::AfterUpload { content_hash, .. } => Some(content_hash),
        }
    }
}
