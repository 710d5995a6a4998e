//! # JSON-RPC Transport
//!
//! Shared JSON-RPC 2.0 client used by the wallet and ledger adapters.
//! Failures stay transport-shaped here; each adapter maps them into the
//! client error taxonomy for its collaborator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

/// JSON-RPC request structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<T> {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: &'static str,
    /// Method name.
    pub method: String,
    /// Positional parameters.
    pub params: T,
    /// Request id.
    pub id: u64,
}

impl<T> JsonRpcRequest<T> {
    /// Build a request.
    pub fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC response structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    /// Protocol version echoed by the server.
    pub jsonrpc: String,
    /// Request id echoed by the server.
    pub id: u64,
    /// Result payload, absent on error.
    pub result: Option<T>,
    /// Error payload, absent on success.
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error payload.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured detail (e.g. a revert reason).
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// EIP-1193 user-rejected-request code.
    pub fn is_user_rejection(&self) -> bool {
        self.code == 4001
    }

    /// Whether this error is a ledger-side execution revert.
    pub fn is_revert(&self) -> bool {
        let msg = self.message.to_ascii_lowercase();
        self.code == 3 || msg.contains("revert") || msg.contains("unauthorized")
    }

    /// The most specific reason text available.
    pub fn reason(&self) -> String {
        match &self.data {
            Some(serde_json::Value::String(detail)) if !detail.is_empty() => detail.clone(),
            _ => self.message.clone(),
        }
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC error {}: {}", self.code, self.message)
    }
}

/// Transport-level failure, before taxonomy mapping.
#[derive(Debug)]
pub enum RpcFailure {
    /// Could not reach the endpoint at all.
    Connect(String),
    /// The request failed at the HTTP layer.
    Http(String),
    /// The server answered with a JSON-RPC error.
    Rpc(JsonRpcError),
    /// The response could not be decoded.
    Parse(String),
}

/// A JSON-RPC 2.0 client over HTTP.
pub struct RpcTransport {
    client: Client,
    endpoint: String,
    request_id: AtomicU64,
}

impl RpcTransport {
    /// Create a transport for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RpcFailure> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| RpcFailure::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            request_id: AtomicU64::new(1),
        })
    }

    /// The endpoint this transport talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call a JSON-RPC method.
    pub async fn call<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, RpcFailure> {
        let request = JsonRpcRequest::new(method, params, self.next_id());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    RpcFailure::Connect(format!("cannot reach {}", self.endpoint))
                } else {
                    RpcFailure::Http(e.to_string())
                }
            })?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| RpcFailure::Parse(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            return Err(RpcFailure::Rpc(error));
        }

        rpc_response
            .result
            .ok_or_else(|| RpcFailure::Parse("missing result in response".to_string()))
    }
}
