//! # Article Synchronization Service
//!
//! The orchestration core: reconciles ledger state and content-store state
//! into consistent results for the views. Three operations, each with
//! explicit failure isolation:
//!
//! - **Publish**: upload, then record. Not transactional as a pair; a
//!   ledger-side failure after a successful upload leaves an orphaned
//!   content object, surfaced (with its hash) but not retried.
//! - **List/Fetch**: fan out per-id fetches, wait for all to settle, skip
//!   and log per-id failures, filter, assemble in ascending id order.
//! - **Hydrate-on-demand**: bodies are never fetched during listing; an
//!   explicit read goes through the session-lifetime body cache, with at
//!   most one in-flight retrieval per content hash.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use tokio::sync::{broadcast, Mutex};

use crate::config::ClientConfig;
use crate::domain::{
    role_for, AccessLevel, Address, Article, ArticleDraft, ClientError, ContentHash, PublishError,
    PublishReceipt, Role, RoleAssignment, TxReceipt,
};
use crate::ports::inbound::NewsroomApi;
use crate::ports::outbound::{ContentGateway, LedgerContract};

/// Progress notifications for long-running workflow operations. Views
/// subscribe to render distinct in-progress states, including the
/// submitted-then-confirmed two-phase status of ledger writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// The upload step began.
    UploadStarted,
    /// The content store accepted the body.
    ContentUploaded {
        /// The assigned content address.
        content_hash: ContentHash,
    },
    /// The ledger write was submitted and is awaiting confirmation.
    TxSubmitted {
        /// Hash of the submitted transaction.
        tx_hash: String,
    },
    /// The ledger write confirmed.
    TxConfirmed {
        /// Hash of the confirmed transaction.
        tx_hash: String,
        /// The assigned article id, for publish writes.
        article_id: Option<u64>,
    },
}

/// One entry of the article body cache.
enum BodySlot {
    /// Retrieval succeeded earlier this session.
    Ready(String),
    /// A retrieval is in flight; later callers wait on this channel.
    Pending(broadcast::Sender<Result<String, ClientError>>),
}

/// The article synchronization workflow over a ledger contract and a
/// content gateway.
pub struct ArticleSyncService<L: LedgerContract, G: ContentGateway> {
    config: ClientConfig,
    ledger: Arc<L>,
    gateway: Arc<G>,
    /// Keyed by content hash; populated lazily, never evicted during a
    /// session. Only this service mutates it.
    body_cache: Mutex<HashMap<ContentHash, BodySlot>>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl<L: LedgerContract, G: ContentGateway> ArticleSyncService<L, G> {
    /// Create a new service over the given collaborators.
    pub fn new(config: ClientConfig, ledger: Arc<L>, gateway: Arc<G>) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            config,
            ledger,
            gateway,
            body_cache: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Subscribe to workflow progress notifications.
    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    /// Public gateway URL for viewing an article body raw.
    pub fn public_url(&self, hash: &ContentHash) -> String {
        self.gateway.public_url(hash)
    }

    /// The ledger-reported role assignment materialized for one identity.
    pub async fn assignment_for(
        &self,
        identity: &Address,
    ) -> Result<RoleAssignment, ClientError> {
        let mut authors = HashSet::new();
        if self.ledger.is_authorized_author(identity).await? {
            authors.insert(identity.clone());
        }
        Ok(RoleAssignment {
            admin: self.config.admin_address.clone(),
            authors,
        })
    }

    fn emit(&self, event: WorkflowEvent) {
        // No subscribers is fine; progress reporting is best-effort.
        let _ = self.events.send(event);
    }

    /// Fan out per-id fetches, wait for all to settle, skip failures.
    /// Result order follows the input id order.
    async fn fetch_each(&self, ids: Vec<u64>) -> Vec<Article> {
        let fetches = ids
            .into_iter()
            .map(|id| async move { (id, self.ledger.article(id).await) });
        let settled = future::join_all(fetches).await;

        let mut articles = Vec::new();
        for (id, result) in settled {
            match result {
                Ok(article) => articles.push(article),
                Err(error) => {
                    tracing::warn!(article_id = id, %error, "skipping unreadable article");
                }
            }
        }
        articles
    }

    /// The ledger phase shared by publish and resubmit. Any failure here
    /// happens after the content is stored, so it carries the hash.
    async fn record(
        &self,
        title: &str,
        content_hash: &ContentHash,
        access: AccessLevel,
    ) -> Result<PublishReceipt, PublishError> {
        let attempt: Result<PublishReceipt, ClientError> = async {
            let pending = self
                .ledger
                .submit_publish(title, content_hash, access)
                .await?;
            self.emit(WorkflowEvent::TxSubmitted {
                tx_hash: pending.tx_hash.clone(),
            });

            let receipt = self.ledger.wait_confirmed(&pending).await?;
            let article_id = receipt.article_id.ok_or_else(|| {
                ClientError::LedgerUnreachable("confirmation carried no article id".to_string())
            })?;
            self.emit(WorkflowEvent::TxConfirmed {
                tx_hash: receipt.tx_hash.clone(),
                article_id: Some(article_id),
            });

            Ok(PublishReceipt {
                article_id,
                content_hash: content_hash.clone(),
                tx_hash: receipt.tx_hash,
            })
        }
        .await;

        attempt.map_err(|source| PublishError::AfterUpload {
            content_hash: content_hash.clone(),
            source,
        })
    }

    /// Leader path for a cache miss: retrieve, publish the outcome to any
    /// waiters, cache only on success.
    async fn retrieve_and_fill(&self, hash: &ContentHash) -> Result<String, ClientError> {
        let result = self.gateway.retrieve(hash).await;

        let waiters = {
            let mut cache = self.body_cache.lock().await;
            let waiters = match cache.remove(hash) {
                Some(BodySlot::Pending(tx)) => Some(tx),
                _ => None,
            };
            if let Ok(body) = &result {
                cache.insert(hash.clone(), BodySlot::Ready(body.clone()));
            }
            waiters
        };

        if let Some(tx) = waiters {
            let _ = tx.send(result.clone());
        }
        result
    }
}

#[async_trait]
impl<L: LedgerContract, G: ContentGateway> NewsroomApi for ArticleSyncService<L, G> {
    async fn publish(&self, draft: &ArticleDraft) -> Result<PublishReceipt, PublishError> {
        if draft.title.trim().is_empty() {
            return Err(PublishError::BeforeUpload {
                source: ClientError::InvalidInput("empty title".to_string()),
            });
        }
        if draft.content.is_empty() {
            return Err(PublishError::BeforeUpload {
                source: ClientError::InvalidInput("empty content".to_string()),
            });
        }

        self.emit(WorkflowEvent::UploadStarted);
        let content_hash = self
            .gateway
            .upload(&draft.content)
            .await
            .map_err(|source| PublishError::BeforeUpload { source })?;
        self.emit(WorkflowEvent::ContentUploaded {
            content_hash: content_hash.clone(),
        });

        self.record(&draft.title, &content_hash, draft.access).await
    }

    async fn resubmit(
        &self,
        title: &str,
        content_hash: &ContentHash,
        access: AccessLevel,
    ) -> Result<PublishReceipt, PublishError> {
        self.record(title, content_hash, access).await
    }

    async fn article(&self, id: u64) -> Result<Article, ClientError> {
        self.ledger.article(id).await
    }

    async fn list_public(&self) -> Result<Vec<Article>, ClientError> {
        let count = self.ledger.article_count().await?;
        let articles = self.fetch_each((0..count).collect()).await;
        Ok(articles
            .into_iter()
            .filter(|a| a.access == AccessLevel::Public)
            .collect())
    }

    async fn list_by_author(&self, author: &Address) -> Result<Vec<Article>, ClientError> {
        let ids = self.ledger.articles_by_author(author).await?;
        Ok(self.fetch_each(ids).await)
    }

    async fn read_body(&self, hash: &ContentHash) -> Result<String, ClientError> {
        let mut waiter = {
            let mut cache = self.body_cache.lock().await;
            match cache.get(hash) {
                Some(BodySlot::Ready(body)) => return Ok(body.clone()),
                Some(BodySlot::Pending(tx)) => tx.subscribe(),
                None => {
                    let (tx, _) = broadcast::channel(1);
                    cache.insert(hash.clone(), BodySlot::Pending(tx));
                    drop(cache);
                    return self.retrieve_and_fill(hash).await;
                }
            }
        };

        match waiter.recv().await {
            Ok(result) => result,
            // Leader dropped without sending; treat as a transient failure.
            Err(_) => Err(ClientError::StoreUnreachable(
                "in-flight retrieval abandoned".to_string(),
            )),
        }
    }

    async fn add_author(&self, author: &Address) -> Result<TxReceipt, ClientError> {
        let pending = self.ledger.submit_add_author(author).await?;
        self.emit(WorkflowEvent::TxSubmitted {
            tx_hash: pending.tx_hash.clone(),
        });
        let receipt = self.ledger.wait_confirmed(&pending).await?;
        self.emit(WorkflowEvent::TxConfirmed {
            tx_hash: receipt.tx_hash.clone(),
            article_id: None,
        });
        Ok(receipt)
    }

    async fn role_for_identity(&self, identity: &Address) -> Result<Role, ClientError> {
        let assignment = self.assignment_for(identity).await?;
        Ok(role_for(identity, &assignment))
    }
}
