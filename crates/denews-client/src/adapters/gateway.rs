//! # Content Gateway Adapter
//!
//! Implements the content-store port over a local storage daemon's HTTP
//! API (`/api/v0/add`, `/api/v0/version`) and its public gateway
//! (`/ipfs/{hash}`) for retrieval.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::config::StoreConfig;
use crate::domain::{ClientError, ContentHash};
use crate::ports::outbound::ContentGateway;

/// Response of the daemon's add endpoint.
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// HTTP adapter for the content-addressed storage gateway.
pub struct HttpContentGateway {
    http: Client,
    api_base: String,
    public_base: String,
}

impl HttpContentGateway {
    /// Create a gateway adapter from the store endpoints.
    pub fn new(store: &StoreConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(3))
            .build()
            .map_err(|e| ClientError::StoreUnreachable(e.to_string()))?;

        Ok(Self {
            http,
            api_base: store.api_base(),
            public_base: store.public_gateway.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ContentGateway for HttpContentGateway {
    async fn upload(&self, content: &str) -> Result<ContentHash, ClientError> {
        if content.is_empty() {
            return Err(ClientError::InvalidInput("empty content".to_string()));
        }

        let form = Form::new().part("file", Part::text(content.to_string()));
        let response = self
            .http
            .post(format!("{}/api/v0/add", self.api_base))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                ClientError::StoreUnreachable(format!("cannot reach storage daemon: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(ClientError::StoreUnreachable(format!(
                "add failed with status {}",
                response.status()
            )));
        }

        let added: AddResponse = response
            .json()
            .await
            .map_err(|e| ClientError::StoreUnreachable(e.to_string()))?;
        tracing::debug!(hash = %added.hash, "content uploaded");
        added.hash.parse()
    }

    async fn retrieve(&self, hash: &ContentHash) -> Result<String, ClientError> {
        let response = self
            .http
            .get(self.public_url(hash))
            .send()
            .await
            .map_err(|e| ClientError::StoreUnreachable(format!("cannot reach gateway: {e}")))?;

        if !response.status().is_success() {
            return Err(ClientError::ContentNotFound(hash.as_str().to_string()));
        }

        response
            .text()
            .await
            .map_err(|e| ClientError::StoreUnreachable(e.to_string()))
    }

    async fn is_alive(&self) -> bool {
        match self
            .http
            .post(format!("{}/api/v0/version", self.api_base))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn public_url(&self, hash: &ContentHash) -> String {
        format!("{}/ipfs/{}", self.public_base, hash)
    }
}
