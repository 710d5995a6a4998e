//! # Adapters
//!
//! Concrete implementations of the outbound ports: JSON-RPC wallet and
//! ledger clients, and the HTTP content-gateway client.

pub mod gateway;
pub mod ledger_rpc;
pub mod rpc;
pub mod wallet_rpc;

pub use gateway::HttpContentGateway;
pub use ledger_rpc::LedgerRpc;
pub use rpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcFailure, RpcTransport};
pub use wallet_rpc::WalletRpc;
