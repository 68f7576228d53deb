//! LINE Messaging API payloads shared across the workspace

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Body of a webhook delivery from the LINE platform
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    /// User ID of the bot that should receive the events
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// A single webhook event. Only message events are modelled.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WebhookEvent {
    Message(MessageEvent),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    /// Absent on redelivered events
    #[serde(default)]
    pub reply_token: Option<String>,
    pub source: EventSource,
    pub message: Message,
}

impl MessageEvent {
    /// Narrows the event to an image message sent by an identified user
    #[must_use]
    pub fn into_image_event(self) -> Option<ImageMessageEvent> {
        let Message::Image(message) = self.message else {
            return None;
        };
        let user_id = self.source.user_id?;

        Some(ImageMessageEvent {
            reply_token: self.reply_token,
            source: ImageEventSource { user_id },
            message,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    /// `user`, `group` or `room`
    #[serde(rename = "type", default)]
    pub source_type: Option<String>,
    /// Missing for group members who have not consented to profile access
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    Image(ImageMessage),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageMessage {
    pub id: String,
    pub content_provider: ContentProvider,
}

/// Where the bytes of an image message live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentProvider {
    /// Hosted by the LINE platform, fetched through the content API
    Line,
    /// Hosted by a third party at `original_content_url`
    External {
        #[serde(rename = "originalContentUrl", default)]
        original_content_url: Option<String>,
        #[serde(rename = "previewImageUrl", default)]
        preview_image_url: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl ContentProvider {
    /// Wire name of the provider, used in logs and errors
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::External { .. } => "external",
            Self::Unknown => "unknown",
        }
    }
}

/// An image message event from an identified user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMessageEvent {
    #[serde(default)]
    pub reply_token: Option<String>,
    pub source: ImageEventSource,
    pub message: ImageMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEventSource {
    pub user_id: String,
}

/// Message sent back to the user through the reply API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReplyMessage {
    Text { text: String },
}

impl ReplyMessage {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Body of `POST /v2/bot/message/reply`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub reply_token: String,
    pub messages: Vec<ReplyMessage>,
}
