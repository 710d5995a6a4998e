//! # Inbound Ports
//!
//! The API a presentation view dispatches user intents into, implemented
//! by the article synchronization service.

use async_trait::async_trait;

use crate::domain::{
    AccessLevel, Address, Article, ArticleDraft, ClientError, ContentHash, PublishError,
    PublishReceipt, Role, TxReceipt,
};

/// Operations the views may dispatch.
#[async_trait]
pub trait NewsroomApi: Send + Sync {
    /// Upload a draft's body to the content store, then record it on the
    /// ledger. Reports distinctly whether a failure happened before or
    /// after the upload step.
    async fn publish(&self, draft: &ArticleDraft) -> Result<PublishReceipt, PublishError>;

    /// Re-run only the ledger write for content that is already stored,
    /// using its known hash.
    async fn resubmit(
        &self,
        title: &str,
        content_hash: &ContentHash,
        access: AccessLevel,
    ) -> Result<PublishReceipt, PublishError>;

    /// One article by id. Unlike bulk listing, failures surface directly.
    async fn article(&self, id: u64) -> Result<Article, ClientError>;

    /// All public articles, ascending id order, per-id failures skipped.
    async fn list_public(&self) -> Result<Vec<Article>, ClientError>;

    /// All of `author`'s articles regardless of access level, ascending id
    /// order, per-id failures skipped.
    async fn list_by_author(&self, author: &Address) -> Result<Vec<Article>, ClientError>;

    /// The article body for `hash`, fetched lazily and cached for the
    /// session. Concurrent requests for the same hash share one retrieval.
    async fn read_body(&self, hash: &ContentHash) -> Result<String, ClientError>;

    /// Submit an add-author write and wait for confirmation.
    async fn add_author(&self, author: &Address) -> Result<TxReceipt, ClientError>;

    /// Classify `identity` against the ledger-reported role assignment.
    async fn role_for_identity(&self, identity: &Address) -> Result<Role, ClientError>;
}
