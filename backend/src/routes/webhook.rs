use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, Extension, Json};
use common_types::{ReplyMessage, WebhookEvent, WebhookRequest};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    ingest::{ImageIngestHandler, IngestError},
    line_api::ReplySender,
    types::AppError,
};

/// Summary of a handled delivery
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WebhookResponse {
    /// Number of image messages stored
    pub processed: usize,
}

/// Receives webhook deliveries from the LINE platform
///
/// Image messages are stored one after the other and answered through the reply
/// API. Every other event is skipped. When an image fails, the remaining events
/// are still processed and the first failure is returned so the platform can
/// redeliver.
///
/// # Errors
///
/// Returns a `validation_error` if the body is not a webhook payload
/// Returns the `AppError` matching the first `IngestError` of the batch
#[instrument(skip_all, fields(destination, events))]
pub async fn handler(
    Extension(ingest): Extension<Arc<ImageIngestHandler>>,
    Extension(replier): Extension<Arc<dyn ReplySender>>,
    payload: Result<Json<WebhookRequest>, JsonRejection>,
) -> Result<Json<WebhookResponse>, AppError> {
    let Json(payload) = payload?;
    let span = tracing::Span::current();
    span.record("destination", tracing::field::debug(&payload.destination));
    span.record("events", payload.events.len());

    let mut processed = 0;
    let mut first_error: Option<IngestError> = None;

    for event in payload.events {
        let WebhookEvent::Message(message) = event else {
            tracing::debug!("skipping non-message event");
            continue;
        };
        let Some(event) = message.into_image_event() else {
            tracing::debug!("skipping message that is not an image from an identified user");
            continue;
        };

        match ingest.handle(&event).await {
            Ok(reply) => {
                processed += 1;
                deliver_reply(replier.as_ref(), event.reply_token.as_deref(), reply).await;
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(Json(WebhookResponse { processed })),
    }
}

/// The object is already stored at this point, so delivery problems are only logged
async fn deliver_reply(replier: &dyn ReplySender, reply_token: Option<&str>, reply: ReplyMessage) {
    let Some(reply_token) = reply_token else {
        tracing::debug!("event carries no reply token, reply dropped");
        return;
    };

    if let Err(e) = replier.reply(reply_token, vec![reply]).await {
        tracing::error!(
            error = &e as &dyn std::error::Error,
            "failed to deliver reply"
        );
    }
}
