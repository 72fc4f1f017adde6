//! Outbound webhook call.
//!
//! One JSON POST per send: `{"message": ..., "sessionId": ...}` out, an
//! object with an optional `output` or `message` string back. The endpoint
//! is opaque; there is no retry, no backoff, and no timeout. A send either
//! settles or fails, exactly once.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reply text used when the response carries neither `output` nor `message`.
pub const NO_REPLY_FALLBACK: &str = "No response from the server";

/// Errors raised by a webhook request.
///
/// Display strings feed directly into the conversation-visible error
/// message, so a status failure reads `Error <code>: <reason>`.
#[derive(Error, Debug)]
pub enum WebhookError {
    /// The request never produced a response (connect/transport failure).
    #[error("Request failed: {source}")]
    Request {
        #[from]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("Error {status}: {reason}")]
    Status { status: u16, reason: String },

    /// The response body was not the expected JSON object.
    #[error("Unreadable response: {message}")]
    MalformedReply { message: String },
}

/// A webhook reply, parsed with explicit field precedence.
///
/// Variants are tried in declaration order, so `output` wins over `message`
/// and anything else falls through to `Empty`.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WebhookReply {
    Output { output: String },
    Message { message: String },
    Empty(serde_json::Value),
}

impl WebhookReply {
    /// Returns the reply text, substituting the fallback for an empty reply.
    pub fn into_text(self) -> String {
        match self {
            Self::Output { output } => output,
            Self::Message { message } => message,
            Self::Empty(_) => NO_REPLY_FALLBACK.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookRequest<'a> {
    message: &'a str,
    session_id: &'a str,
}

/// The remote side of a send, behind a trait so tests can substitute a
/// scripted endpoint.
#[async_trait]
pub trait ReplyEndpoint: Send + Sync {
    /// Performs one request and returns the reply text.
    async fn request_reply(
        &self,
        message: &str,
        session_id: &str,
    ) -> Result<String, WebhookError>;
}

/// Reqwest-backed endpoint talking to the configured webhook URL.
#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    /// Creates a client for the given webhook URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Returns the configured endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReplyEndpoint for WebhookClient {
    async fn request_reply(
        &self,
        message: &str,
        session_id: &str,
    ) -> Result<String, WebhookError> {
        let body = WebhookRequest {
            message,
            session_id,
        };

        tracing::debug!(url = %self.url, "dispatching webhook request");

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Status {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
            });
        }

        let reply: WebhookReply =
            response
                .json()
                .await
                .map_err(|err| WebhookError::MalformedReply {
                    message: err.to_string(),
                })?;

        Ok(reply.into_text())
    }
}
