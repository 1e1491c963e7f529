//! aria2 JSON-RPC client.
//!
//! Issues `aria2.tellStatus` queries over HTTP to find out where a completed
//! download landed on disk.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::endpoint::{http_endpoint, EndpointError};
use super::types::{
    ItemStatus, RpcRequest, RpcResponse, JSONRPC_VERSION, STATUS_KEYS, TELL_STATUS_METHOD,
};

/// Errors returned by aria2 queries.
#[derive(Debug, Error)]
pub enum Aria2Error {
    #[error("Failed to reach aria2: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("aria2 responded with HTTP status {0}")]
    Http(StatusCode),

    #[error("aria2 error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid aria2 response: {0}")]
    Decode(String),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

/// Resolves a download identifier to its directory and file listing.
#[async_trait]
pub trait StatusResolver: Send + Sync {
    async fn tell_status(&self, gid: &str) -> Result<ItemStatus, Aria2Error>;
}

/// HTTP client for the aria2 JSON-RPC interface.
pub struct Aria2Client {
    client: Client,
    endpoint: Url,
    secret: String,
}

impl Aria2Client {
    /// Create a new aria2 client.
    ///
    /// # Arguments
    /// * `rpc` - aria2 RPC endpoint (e.g., "http://localhost:6800/jsonrpc"); ws/wss are accepted
    /// * `secret` - value of aria2's `--rpc-secret`, empty when not set
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(rpc: &str, secret: impl Into<String>, timeout_sec: u64) -> Result<Self, Aria2Error> {
        let endpoint = http_endpoint(rpc)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            secret: secret.into(),
        })
    }

    /// Get the HTTP endpoint queries are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn tell_status_request(&self, gid: &str) -> RpcRequest {
        let mut params = Vec::with_capacity(3);
        if !self.secret.is_empty() {
            params.push(Value::String(format!("token:{}", self.secret)));
        }
        params.push(Value::String(gid.to_string()));
        params.push(json!(STATUS_KEYS));

        RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            method: TELL_STATUS_METHOD,
            params,
        }
    }
}

#[async_trait]
impl StatusResolver for Aria2Client {
    async fn tell_status(&self, gid: &str) -> Result<ItemStatus, Aria2Error> {
        let request = self.tell_status_request(gid);
        debug!("Querying aria2 status for gid {} (request {})", gid, request.id);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        // aria2 reports RPC failures with a 4xx status and an error object
        // in the body, so the body is inspected before the status.
        let decoded = serde_json::from_slice::<RpcResponse<ItemStatus>>(&body);
        match decoded {
            Ok(RpcResponse {
                error: Some(error), ..
            }) => Err(Aria2Error::Rpc {
                code: error.code,
                message: error.message,
            }),
            _ if !status.is_success() => Err(Aria2Error::Http(status)),
            Ok(RpcResponse {
                result: Some(result),
                ..
            }) => Ok(result),
            Ok(_) => Err(Aria2Error::Decode("response has no result".to_string())),
            Err(e) => Err(Aria2Error::Decode(e.to_string())),
        }
    }
}
