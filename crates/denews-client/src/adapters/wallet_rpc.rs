//! # Wallet Provider Adapter
//!
//! Implements the wallet port over the standard `eth_*` JSON-RPC methods.
//! A browser extension pushes change notifications; a headless endpoint
//! cannot, so this adapter offers an optional polling task that diffs the
//! reported accounts and chain id and broadcasts the same notifications a
//! push provider would. The session adapter is agnostic to the source.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::rpc::{RpcFailure, RpcTransport};
use crate::domain::{Address, ClientError};
use crate::ports::outbound::{WalletEvent, WalletProvider};

fn map_failure(failure: RpcFailure) -> ClientError {
    match failure {
        RpcFailure::Connect(reason) => ClientError::ProviderUnavailable(reason),
        RpcFailure::Rpc(error) if error.is_user_rejection() => {
            ClientError::UserRejected(error.reason())
        }
        RpcFailure::Rpc(error) => ClientError::ProviderUnavailable(error.reason()),
        RpcFailure::Http(reason) | RpcFailure::Parse(reason) => {
            ClientError::ProviderUnavailable(reason)
        }
    }
}

fn parse_accounts(raw: Vec<String>) -> Result<Vec<Address>, ClientError> {
    raw.iter().map(|s| s.parse()).collect()
}

/// Wallet provider over JSON-RPC.
pub struct WalletRpc {
    transport: Arc<RpcTransport>,
    events: broadcast::Sender<WalletEvent>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl WalletRpc {
    /// Create a wallet adapter over `transport`.
    pub fn new(transport: Arc<RpcTransport>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            transport,
            events,
            poller: Mutex::new(None),
        }
    }

    /// Start diffing accounts and chain id every `interval`, broadcasting
    /// changes as wallet events. No-op when already polling.
    pub fn start_polling(&self, interval: Duration) {
        let mut guard = self.poller.lock();
        if guard.is_some() {
            return;
        }

        let transport = Arc::clone(&self.transport);
        let events = self.events.clone();
        *guard = Some(tokio::spawn(async move {
            let mut known_accounts: Option<Vec<String>> = None;
            let mut known_chain: Option<String> = None;
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;

                if let Ok(accounts) = transport
                    .call::<_, Vec<String>>("eth_accounts", serde_json::json!([]))
                    .await
                {
                    if known_accounts.as_ref() != Some(&accounts) {
                        if let Ok(parsed) = parse_accounts(accounts.clone()) {
                            let _ = events.send(WalletEvent::AccountsChanged(parsed));
                        }
                        known_accounts = Some(accounts);
                    }
                }

                let chain_call = transport
                    .call::<_, String>("eth_chainId", serde_json::json!([]))
                    .await;
                if let Ok(chain) = chain_call {
                    if known_chain.as_ref() != Some(&chain) {
                        if known_chain.is_some() {
                            let _ = events.send(WalletEvent::ChainChanged(chain.clone()));
                        }
                        known_chain = Some(chain);
                    }
                }
            }
        }));
    }

    /// Stop the change poller. Idempotent.
    pub fn stop_polling(&self) {
        if let Some(handle) = self.poller.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for WalletRpc {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

#[async_trait]
impl WalletProvider for WalletRpc {
    async fn request_accounts(&self) -> Result<Vec<Address>, ClientError> {
        let raw: Vec<String> = self
            .transport
            .call("eth_requestAccounts", serde_json::json!([]))
            .await
            .map_err(map_failure)?;
        parse_accounts(raw)
    }

    async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        let raw: Vec<String> = self
            .transport
            .call("eth_accounts", serde_json::json!([]))
            .await
            .map_err(map_failure)?;
        parse_accounts(raw)
    }

    async fn chain_id(&self) -> Result<String, ClientError> {
        self.transport
            .call("eth_chainId", serde_json::json!([]))
            .await
            .map_err(map_failure)
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}
