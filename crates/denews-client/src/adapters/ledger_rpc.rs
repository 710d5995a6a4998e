//! # Ledger Contract Adapter
//!
//! Implements the ledger port over the `denews_*` JSON-RPC facade exposed
//! by the node for the deployed contract. Reads decode wire DTOs into
//! domain records; writes are two-phase: submission returns a transaction
//! hash, confirmation is polled separately because confirmation latency is
//! seconds to minutes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::rpc::{RpcFailure, RpcTransport};
use crate::domain::{
    AccessLevel, Address, Article, ClientError, ContentHash, PendingTx, TxReceipt,
};
use crate::ports::outbound::LedgerContract;

/// Wire form of an article record.
#[derive(Debug, Clone, Deserialize)]
struct ArticleDto {
    id: u64,
    title: String,
    author: String,
    hash: String,
    timestamp: u64,
    access: u8,
}

impl ArticleDto {
    fn decode(self) -> Result<Article, ClientError> {
        Ok(Article {
            id: self.id,
            title: self.title,
            author: self.author.parse()?,
            content_hash: self.hash.parse()?,
            timestamp: self.timestamp,
            access: AccessLevel::from_u8(self.access)?,
        })
    }
}

/// Wire form of a transaction receipt.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptDto {
    status: String,
    tx_hash: String,
    #[serde(default)]
    article_id: Option<u64>,
    #[serde(default)]
    reason: Option<String>,
}

fn map_failure(failure: RpcFailure) -> ClientError {
    match failure {
        RpcFailure::Connect(reason) => ClientError::LedgerUnreachable(reason),
        RpcFailure::Rpc(error) if error.is_user_rejection() => {
            ClientError::UserRejected(error.reason())
        }
        RpcFailure::Rpc(error) if error.is_revert() => {
            ClientError::TransactionReverted(error.reason())
        }
        RpcFailure::Rpc(error) => ClientError::LedgerUnreachable(error.reason()),
        RpcFailure::Http(reason) | RpcFailure::Parse(reason) => {
            ClientError::LedgerUnreachable(reason)
        }
    }
}

/// Ledger contract client over JSON-RPC.
pub struct LedgerRpc {
    transport: Arc<RpcTransport>,
    contract: Address,
    receipt_poll: Duration,
}

impl LedgerRpc {
    /// Create a ledger adapter for the contract at `contract`.
    pub fn new(transport: Arc<RpcTransport>, contract: Address, receipt_poll: Duration) -> Self {
        Self {
            transport,
            contract,
            receipt_poll,
        }
    }
}

#[async_trait]
impl LedgerContract for LedgerRpc {
    async fn article_count(&self) -> Result<u64, ClientError> {
        self.transport
            .call("denews_articleCount", (self.contract.as_str(),))
            .await
            .map_err(map_failure)
    }

    async fn article(&self, id: u64) -> Result<Article, ClientError> {
        let dto: ArticleDto = self
            .transport
            .call("denews_getArticle", (self.contract.as_str(), id))
            .await
            .map_err(|failure| match failure {
                RpcFailure::Rpc(ref error)
                    if error.message.to_ascii_lowercase().contains("not found")
                        || error.is_revert() =>
                {
                    ClientError::ArticleNotFound(id)
                }
                other => map_failure(other),
            })?;
        dto.decode()
    }

    async fn articles_by_author(&self, author: &Address) -> Result<Vec<u64>, ClientError> {
        self.transport
            .call(
                "denews_articlesByAuthor",
                (self.contract.as_str(), author.as_str()),
            )
            .await
            .map_err(map_failure)
    }

    async fn is_authorized_author(&self, identity: &Address) -> Result<bool, ClientError> {
        self.transport
            .call(
                "denews_isAuthor",
                (self.contract.as_str(), identity.as_str()),
            )
            .await
            .map_err(map_failure)
    }

    async fn submit_publish(
        &self,
        title: &str,
        content_hash: &ContentHash,
        access: AccessLevel,
    ) -> Result<PendingTx, ClientError> {
        let tx_hash: String = self
            .transport
            .call(
                "denews_publishArticle",
                (
                    self.contract.as_str(),
                    title,
                    content_hash.as_str(),
                    access.as_u8(),
                ),
            )
            .await
            .map_err(map_failure)?;
        tracing::debug!(%tx_hash, "publish transaction submitted");
        Ok(PendingTx { tx_hash })
    }

    async fn submit_add_author(&self, author: &Address) -> Result<PendingTx, ClientError> {
        let tx_hash: String = self
            .transport
            .call(
                "denews_addAuthor",
                (self.contract.as_str(), author.as_str()),
            )
            .await
            .map_err(map_failure)?;
        tracing::debug!(%tx_hash, "add-author transaction submitted");
        Ok(PendingTx { tx_hash })
    }

    async fn wait_confirmed(&self, tx: &PendingTx) -> Result<TxReceipt, ClientError> {
        loop {
            let dto: ReceiptDto = self
                .transport
                .call("denews_getReceipt", (tx.tx_hash.as_str(),))
                .await
                .map_err(map_failure)?;

            match dto.status.as_str() {
                "pending" => tokio::time::sleep(self.receipt_poll).await,
                "confirmed" => {
                    return Ok(TxReceipt {
                        tx_hash: dto.tx_hash,
                        article_id: dto.article_id,
                    })
                }
                "reverted" => {
                    return Err(ClientError::TransactionReverted(
                        dto.reason.unwrap_or_else(|| "execution reverted".to_string()),
                    ))
                }
                other => {
                    return Err(ClientError::LedgerUnreachable(format!(
                        "unknown receipt status: {other}"
                    )))
                }
            }
        }
    }
}
