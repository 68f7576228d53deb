//! LINE Messaging API client for delivering replies

use async_trait::async_trait;
use common_types::{ReplyMessage, ReplyRequest};
use thiserror::Error;
use tracing::instrument;

/// Production Messaging API endpoint
pub const LINE_API_BASE: &str = "https://api.line.me";

/// Result type for reply delivery
pub type ReplyResult<T> = Result<T, ReplyError>;

/// Errors that can occur while sending a reply
#[derive(Error, Debug)]
pub enum ReplyError {
    /// The request could not be sent
    #[error("reply request failed")]
    Request(#[from] reqwest::Error),

    /// The Messaging API rejected the reply
    #[error("Messaging API returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, usually a JSON error description
        body: String,
    },
}

/// Sends reply messages back to the chat platform
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Answers the event identified by `reply_token`
    ///
    /// # Errors
    ///
    /// Returns `ReplyError` if the reply could not be delivered
    async fn reply(&self, reply_token: &str, messages: Vec<ReplyMessage>) -> ReplyResult<()>;
}

/// `ReplySender` for the LINE Messaging API
pub struct LineMessagingClient {
    client: reqwest::Client,
    channel_access_token: String,
    api_base: String,
}

impl LineMessagingClient {
    /// Creates a client for the production Messaging API
    #[must_use]
    pub fn new(client: reqwest::Client, channel_access_token: String) -> Self {
        Self {
            client,
            channel_access_token,
            api_base: LINE_API_BASE.to_string(),
        }
    }

    /// Points the client at a different API host
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ReplySender for LineMessagingClient {
    #[instrument(skip(self, messages), fields(messages = messages.len()))]
    async fn reply(&self, reply_token: &str, messages: Vec<ReplyMessage>) -> ReplyResult<()> {
        let body = ReplyRequest {
            reply_token: reply_token.to_string(),
            messages,
        };

        let response = self
            .client
            .post(format!("{}/v2/bot/message/reply", self.api_base))
            .bearer_auth(&self.channel_access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReplyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("reply delivered");
        Ok(())
    }
}
