//! Outbound chat gateway client
//!
//! The service actively sends its prompts and confirmations through the
//! gateway and records the returned message refs; reply tracing for the
//! clarification and fix flows depends on those refs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::IngestError;

/// Outbound transport interface: deliver one message, optionally threaded
/// as a reply, and hand back the transport's unique ref for it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, text: &str, in_reply_to: Option<&str>) -> Result<String, IngestError>;
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    message_ref: String,
}

/// HTTP client for the chat gateway
pub struct HttpGateway {
    http_client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create new gateway client from configuration
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(Duration::from_millis(config.timeout_ms))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpGateway {
    async fn send(&self, text: &str, in_reply_to: Option<&str>) -> Result<String, IngestError> {
        let request = SendRequest { text, in_reply_to };

        let response = self
            .http_client
            .post(format!("{}/send", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| IngestError::Transport(format!("gateway send failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Transport(format!("gateway returned {}", status)));
        }

        let body: SendResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Transport(format!("malformed gateway response: {}", e)))?;

        debug!(message_ref = %body.message_ref, in_reply_to = ?in_reply_to, "Delivered outbound message");
        Ok(body.message_ref)
    }
}
