//! # Client Configuration
//!
//! The deployment surface the client consumes but does not define: where
//! the ledger RPC endpoint lives, which contract and admin identity this
//! deployment uses, and how to reach the content-store daemon and its
//! public gateway.

use serde::{Deserialize, Serialize};

use crate::domain::Address;

/// Content-store daemon and gateway endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Daemon API host.
    pub host: String,
    /// Daemon API port.
    pub port: u16,
    /// Daemon API protocol.
    pub protocol: String,
    /// Public gateway base URL used for content links and retrieval.
    pub public_gateway: String,
}

impl StoreConfig {
    /// The daemon API base URL.
    pub fn api_base(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            protocol: "http".to_string(),
            public_gateway: "http://localhost:8080".to_string(),
        }
    }
}

/// Client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// JSON-RPC endpoint serving wallet and ledger methods.
    pub rpc_endpoint: String,
    /// Address of the deployed ledger contract.
    pub contract_address: Address,
    /// The deployment's admin identity.
    pub admin_address: Address,
    /// Content-store endpoints.
    pub store: StoreConfig,
    /// Liveness poll interval while a relevant view is mounted.
    pub liveness_poll_secs: u64,
    /// Receipt poll interval while waiting for confirmation.
    pub receipt_poll_millis: u64,
    /// Wallet change-poll interval for headless providers.
    pub wallet_poll_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: "http://127.0.0.1:8545".to_string(),
            contract_address: Address::zero(),
            admin_address: Address::zero(),
            store: StoreConfig::default(),
            liveness_poll_secs: 30,
            receipt_poll_millis: 1_000,
            wallet_poll_secs: 5,
        }
    }
}

impl ClientConfig {
    /// A config with short intervals for tests.
    pub fn for_testing() -> Self {
        Self {
            liveness_poll_secs: 1,
            receipt_poll_millis: 10,
            wallet_poll_secs: 1,
            ..Self::default()
        }
    }
}
