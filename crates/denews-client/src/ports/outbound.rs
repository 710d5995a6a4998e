//! # Outbound Ports
//!
//! Traits for the three external collaborators: the wallet provider, the
//! ledger contract, and the content-addressed storage gateway. Mock
//! implementations for testing live alongside the traits.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;

use crate::domain::{
    AccessLevel, Address, Article, ClientError, ContentHash, PendingTx, TxReceipt,
};

/// Change notifications pushed by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The account list changed; an empty list means disconnect.
    AccountsChanged(Vec<Address>),
    /// The provider switched chains.
    ChainChanged(String),
    /// The provider disconnected entirely.
    Disconnected,
}

/// Wallet provider - outbound port.
///
/// Identity and transaction signing live behind this seam so the whole
/// client can run against a test double.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Request account access, prompting the user on first call.
    ///
    /// Fails with [`ClientError::ProviderUnavailable`] when no provider is
    /// present and [`ClientError::UserRejected`] when the user declines.
    async fn request_accounts(&self) -> Result<Vec<Address>, ClientError>;

    /// The currently exposed accounts, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, ClientError>;

    /// The connected chain identifier.
    async fn chain_id(&self) -> Result<String, ClientError>;

    /// Subscribe to account/chain/disconnect notifications.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}

/// Ledger contract - outbound port.
///
/// Writes are optimistic: authorization is never pre-validated here, the
/// ledger is the source of truth and rejections surface as
/// [`ClientError::TransactionReverted`].
#[async_trait]
pub trait LedgerContract: Send + Sync {
    /// Total number of articles ever published, restricted ones included.
    async fn article_count(&self) -> Result<u64, ClientError>;

    /// The article record for `id` in `[0, count)`.
    async fn article(&self, id: u64) -> Result<Article, ClientError>;

    /// Ids of articles published by `author`, in ledger insertion order.
    async fn articles_by_author(&self, author: &Address) -> Result<Vec<u64>, ClientError>;

    /// Whether `identity` is in the authorized-authors set.
    async fn is_authorized_author(&self, identity: &Address) -> Result<bool, ClientError>;

    /// Submit a publish transaction. Returns as soon as the transaction is
    /// accepted into the mempool; confirmation is a separate phase.
    async fn submit_publish(
        &self,
        title: &str,
        content_hash: &ContentHash,
        access: AccessLevel,
    ) -> Result<PendingTx, ClientError>;

    /// Submit an add-author transaction (admin operation on the ledger).
    async fn submit_add_author(&self, author: &Address) -> Result<PendingTx, ClientError>;

    /// Wait for a submitted transaction to confirm. Confirmation latency is
    /// seconds to minutes; the returned receipt carries the assigned
    /// article id for publish transactions.
    async fn wait_confirmed(&self, tx: &PendingTx) -> Result<TxReceipt, ClientError>;
}

/// Content-addressed storage gateway - outbound port.
#[async_trait]
pub trait ContentGateway: Send + Sync {
    /// Store `content` and return its content-derived address.
    async fn upload(&self, content: &str) -> Result<ContentHash, ClientError>;

    /// Fetch the content addressed by `hash`. No internal retry; callers
    /// decide whether to retry.
    async fn retrieve(&self, hash: &ContentHash) -> Result<String, ClientError>;

    /// Non-throwing liveness probe: `false` on any connectivity error.
    async fn is_alive(&self) -> bool;

    /// Public gateway URL for viewing the raw content.
    fn public_url(&self, hash: &ContentHash) -> String;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Shared call-order log, for asserting sequencing across mocks.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Mock wallet provider.
pub struct MockWallet {
    accounts: Mutex<Vec<Address>>,
    chain: Mutex<String>,
    /// Simulate a missing provider.
    pub unavailable: AtomicBool,
    /// Simulate the user declining the connect prompt.
    pub reject_connect: AtomicBool,
    events: broadcast::Sender<WalletEvent>,
}

impl Default for MockWallet {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(Vec::new()),
            chain: Mutex::new("0x539".to_string()),
            unavailable: AtomicBool::new(false),
            reject_connect: AtomicBool::new(false),
            events,
        }
    }
}

impl MockWallet {
    /// A wallet exposing a single account.
    pub fn with_account(account: Address) -> Self {
        let wallet = Self::default();
        wallet.accounts.lock().push(account);
        wallet
    }

    /// Push a provider notification to all subscribers, updating the
    /// mock's own account/chain state to match.
    pub fn emit(&self, event: WalletEvent) {
        match &event {
            WalletEvent::AccountsChanged(accounts) => *self.accounts.lock() = accounts.clone(),
            WalletEvent::ChainChanged(chain) => *self.chain.lock() = chain.clone(),
            WalletEvent::Disconnected => self.accounts.lock().clear(),
        }
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ClientError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(ClientError::ProviderUnavailable(
                "no wallet extension detected".to_string(),
            ));
        }
        if self.reject_connect.load(Ordering::Relaxed) {
            return Err(ClientError::UserRejected(
                "user denied account access".to_string(),
            ));
        }
        Ok(self.accounts.lock().clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(ClientError::ProviderUnavailable(
                "no wallet extension detected".to_string(),
            ));
        }
        Ok(self.accounts.lock().clone())
    }

    async fn chain_id(&self) -> Result<String, ClientError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(ClientError::ProviderUnavailable(
                "no wallet extension detected".to_string(),
            ));
        }
        Ok(self.chain.lock().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

/// A write submitted to the mock ledger but not yet confirmed.
enum PendingWrite {
    Publish {
        title: String,
        content_hash: ContentHash,
        access: AccessLevel,
    },
    AddAuthor(Address),
}

struct MockLedgerState {
    articles: Vec<Article>,
    failing_ids: HashSet<u64>,
    authors: HashSet<Address>,
    admin: Address,
    caller: Address,
    pending: HashMap<String, PendingWrite>,
}

/// Mock ledger contract.
///
/// Seeded articles, injectable per-id failures, and ledger-side
/// authorization enforcement at confirmation time, matching the optimistic
/// write pattern of the real contract.
pub struct MockLedger {
    state: Mutex<MockLedgerState>,
    /// Simulate RPC/network failure for every call.
    pub unreachable: AtomicBool,
    next_tx: AtomicU64,
    call_log: CallLog,
}

impl MockLedger {
    /// A ledger administered by `admin`, with `caller` as the identity
    /// behind submitted transactions.
    pub fn new(admin: Address, caller: Address) -> Self {
        Self {
            state: Mutex::new(MockLedgerState {
                articles: Vec::new(),
                failing_ids: HashSet::new(),
                authors: HashSet::new(),
                admin,
                caller,
                pending: HashMap::new(),
            }),
            unreachable: AtomicBool::new(false),
            next_tx: AtomicU64::new(1),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Record calls into a shared log for sequencing assertions.
    pub fn with_call_log(mut self, log: CallLog) -> Self {
        self.call_log = log;
        self
    }

    /// Add `identity` to the authors set directly, bypassing a transaction.
    pub fn authorize(&self, identity: Address) {
        self.state.lock().authors.insert(identity);
    }

    /// Append an article directly, bypassing a transaction. Returns its id.
    pub fn seed_article(&self, title: &str, author: Address, access: AccessLevel) -> u64 {
        let mut state = self.state.lock();
        let id = state.articles.len() as u64;
        let content_hash: ContentHash = format!("QmSeed{id}").parse().unwrap();
        state.articles.push(Article {
            id,
            title: title.to_string(),
            author,
            content_hash,
            timestamp: 1_700_000_000 + id * 60,
            access,
        });
        id
    }

    /// Make `article(id)` fail with `ArticleNotFound` for this id.
    pub fn fail_id(&self, id: u64) {
        self.state.lock().failing_ids.insert(id);
    }

    /// Change the identity behind subsequent submitted transactions.
    pub fn set_caller(&self, caller: Address) {
        self.state.lock().caller = caller;
    }

    fn check_reachable(&self) -> Result<(), ClientError> {
        if self.unreachable.load(Ordering::Relaxed) {
            return Err(ClientError::LedgerUnreachable(
                "mock RPC failure".to_string(),
            ));
        }
        Ok(())
    }

    fn log(&self, call: &str) {
        self.call_log.lock().push(call.to_string());
    }
}

#[async_trait]
impl LedgerContract for MockLedger {
    async fn article_count(&self) -> Result<u64, ClientError> {
        self.check_reachable()?;
        self.log("article_count");
        Ok(self.state.lock().articles.len() as u64)
    }

    async fn article(&self, id: u64) -> Result<Article, ClientError> {
        self.check_reachable()?;
        self.log("article");
        let state = self.state.lock();
        if state.failing_ids.contains(&id) {
            return Err(ClientError::ArticleNotFound(id));
        }
        state
            .articles
            .get(id as usize)
            .cloned()
            .ok_or(ClientError::ArticleNotFound(id))
    }

    async fn articles_by_author(&self, author: &Address) -> Result<Vec<u64>, ClientError> {
        self.check_reachable()?;
        self.log("articles_by_author");
        Ok(self
            .state
            .lock()
            .articles
            .iter()
            .filter(|a| a.author == *author)
            .map(|a| a.id)
            .collect())
    }

    async fn is_authorized_author(&self, identity: &Address) -> Result<bool, ClientError> {
        self.check_reachable()?;
        self.log("is_authorized_author");
        Ok(self.state.lock().authors.contains(identity))
    }

    async fn submit_publish(
        &self,
        title: &str,
        content_hash: &ContentHash,
        access: AccessLevel,
    ) -> Result<PendingTx, ClientError> {
        self.check_reachable()?;
        self.log("submit_publish");
        if title.is_empty() {
            return Err(ClientError::TransactionReverted(
                "empty title".to_string(),
            ));
        }
        let tx_hash = format!("0xtx{:04x}", self.next_tx.fetch_add(1, Ordering::Relaxed));
        self.state.lock().pending.insert(
            tx_hash.clone(),
            PendingWrite::Publish {
                title: title.to_string(),
                content_hash: content_hash.clone(),
                access,
            },
        );
        Ok(PendingTx { tx_hash })
    }

    async fn submit_add_author(&self, author: &Address) -> Result<PendingTx, ClientError> {
        self.check_reachable()?;
        self.log("submit_add_author");
        let tx_hash = format!("0xtx{:04x}", self.next_tx.fetch_add(1, Ordering::Relaxed));
        self.state
            .lock()
            .pending
            .insert(tx_hash.clone(), PendingWrite::AddAuthor(author.clone()));
        Ok(PendingTx { tx_hash })
    }

    async fn wait_confirmed(&self, tx: &PendingTx) -> Result<TxReceipt, ClientError> {
        self.check_reachable()?;
        self.log("wait_confirmed");
        let mut state = self.state.lock();
        let write = state
            .pending
            .remove(&tx.tx_hash)
            .ok_or_else(|| ClientError::LedgerUnreachable("unknown transaction".to_string()))?;
        match write {
            PendingWrite::Publish {
                title,
                content_hash,
                access,
            } => {
                let caller = state.caller.clone();
                if !state.authors.contains(&caller) {
                    return Err(ClientError::TransactionReverted(
                        "caller not authorized".to_string(),
                    ));
                }
                let id = state.articles.len() as u64;
                state.articles.push(Article {
                    id,
                    title,
                    author: caller,
                    content_hash,
                    timestamp: 1_700_000_000 + id * 60,
                    access,
                });
                Ok(TxReceipt {
                    tx_hash: tx.tx_hash.clone(),
                    article_id: Some(id),
                })
            }
            PendingWrite::AddAuthor(author) => {
                if state.caller != state.admin {
                    return Err(ClientError::TransactionReverted(
                        "caller is not admin".to_string(),
                    ));
                }
                state.authors.insert(author);
                Ok(TxReceipt {
                    tx_hash: tx.tx_hash.clone(),
                    article_id: None,
                })
            }
        }
    }
}

/// Mock content gateway with content-derived hashes: identical content
/// always yields the same hash.
pub struct MockGateway {
    blobs: Mutex<HashMap<String, String>>,
    /// Liveness probe result.
    pub alive: AtomicBool,
    /// Simulate the storage daemon being unreachable for uploads.
    pub fail_upload: AtomicBool,
    /// Simulate retrieval failure.
    pub fail_retrieve: AtomicBool,
    /// Artificial latency before each retrieval completes.
    pub retrieve_delay: Mutex<Option<Duration>>,
    /// Number of retrievals actually issued.
    pub retrieve_calls: AtomicUsize,
    /// Number of uploads actually issued.
    pub upload_calls: AtomicUsize,
    call_log: CallLog,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            alive: AtomicBool::new(true),
            fail_upload: AtomicBool::new(false),
            fail_retrieve: AtomicBool::new(false),
            retrieve_delay: Mutex::new(None),
            retrieve_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockGateway {
    /// Record calls into a shared log for sequencing assertions.
    pub fn with_call_log(mut self, log: CallLog) -> Self {
        self.call_log = log;
        self
    }

    /// Store a blob directly and return its hash.
    pub fn seed(&self, content: &str) -> ContentHash {
        let hash = Self::address_of(content);
        self.blobs.lock().insert(hash.as_str().to_string(), content.to_string());
        hash
    }

    /// The content-derived address the mock assigns to `content`.
    pub fn address_of(content: &str) -> ContentHash {
        let digest = Sha256::digest(content.as_bytes());
        format!("Qm{}", hex::encode(&digest[..16])).parse().unwrap()
    }
}

#[async_trait]
impl ContentGateway for MockGateway {
    async fn upload(&self, content: &str) -> Result<ContentHash, ClientError> {
        self.call_log.lock().push("upload".to_string());
        self.upload_calls.fetch_add(1, Ordering::Relaxed);
        if content.is_empty() {
            return Err(ClientError::InvalidInput("empty content".to_string()));
        }
        if self.fail_upload.load(Ordering::Relaxed) || !self.alive.load(Ordering::Relaxed) {
            return Err(ClientError::StoreUnreachable(
                "mock daemon unreachable".to_string(),
            ));
        }
        Ok(self.seed(content))
    }

    async fn retrieve(&self, hash: &ContentHash) -> Result<String, ClientError> {
        self.call_log.lock().push("retrieve".to_string());
        self.retrieve_calls.fetch_add(1, Ordering::Relaxed);
        let delay = *self.retrieve_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_retrieve.load(Ordering::Relaxed) {
            return Err(ClientError::StoreUnreachable(
                "mock gateway unreachable".to_string(),
            ));
        }
        self.blobs
            .lock()
            .get(hash.as_str())
            .cloned()
            .ok_or_else(|| ClientError::ContentNotFound(hash.as_str().to_string()))
    }

    async fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    fn public_url(&self, hash: &ContentHash) -> String {
        format!("http://localhost:8080/ipfs/{hash}")
    }
}
