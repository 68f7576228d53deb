//! Stores image messages in the contents bucket
//!
//! One call to [`ImageIngestHandler::handle`] resolves where the image lives,
//! streams it from the provider straight into a multipart upload and builds the
//! text reply announcing where it was stored.
mod error;
pub mod source;

use std::sync::Arc;

use common_types::{ImageMessageEvent, ReplyMessage};
use tracing::instrument;

pub use error::{ConfigError, IngestError, IngestResult};
pub use source::{content_url, storage_key, ImageFormat};

use crate::{
    content_fetcher::{ContentFetcher, FetchRequest},
    media_storage::{ObjectStorage, StreamUpload, UploadError},
    types::Environment,
};

/// Prefix of the reply sent after a successful upload
pub const RECEIPT_MESSAGE: &str = "画像メッセージを受信しました: ";

/// Settings injected into the handler at construction
#[derive(Clone)]
pub struct IngestConfig {
    /// Bucket receiving the images
    pub bucket_name: String,
    /// Channel access token for the LINE content API
    pub channel_access_token: String,
}

impl std::fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestConfig")
            .field("bucket_name", &self.bucket_name)
            .field("channel_access_token", &"<redacted>")
            .finish()
    }
}

impl IngestConfig {
    /// Reads the bucket and channel token for the given environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingVar` if `LINE_CHANNEL_ACCESS_TOKEN` is unset, or
    /// if `LINE_BOT_CONTENTS_BUCKET_NAME` is unset outside development
    pub fn from_env(environment: &Environment) -> Result<Self, ConfigError> {
        let bucket_name = environment
            .contents_bucket()
            .ok_or(ConfigError::MissingVar("LINE_BOT_CONTENTS_BUCKET_NAME"))?;
        let channel_access_token = std::env::var("LINE_CHANNEL_ACCESS_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingVar("LINE_CHANNEL_ACCESS_TOKEN"))?;

        Ok(Self {
            bucket_name,
            channel_access_token,
        })
    }
}

/// Location of a successfully stored image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// URL reported by the storage
    pub location: String,
    /// Key the image was stored under
    pub key: String,
}

/// Downloads image messages and re-uploads them to object storage
pub struct ImageIngestHandler {
    config: IngestConfig,
    fetcher: Arc<dyn ContentFetcher>,
    storage: Arc<dyn ObjectStorage>,
}

impl ImageIngestHandler {
    /// Creates a handler around the two network collaborators
    #[must_use]
    pub fn new(
        config: IngestConfig,
        fetcher: Arc<dyn ContentFetcher>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            config,
            fetcher,
            storage,
        }
    }

    /// Stores the image of `event` and returns the reply for the sender
    ///
    /// # Errors
    ///
    /// Returns `IngestError::UnresolvableSource` when the content provider is unknown or has no URL
    /// Returns `IngestError::FetchFailed` when the download fails, including mid-stream
    /// Returns `IngestError::UploadFailed` when the storage rejects the object or reports no location
    #[instrument(
        skip(self, event),
        fields(user_id = %event.source.user_id, message_id = %event.message.id)
    )]
    pub async fn handle(&self, event: &ImageMessageEvent) -> IngestResult<ReplyMessage> {
        match self.ingest(event).await {
            Ok(uploaded) => {
                tracing::info!(
                    location = %uploaded.location,
                    key = %uploaded.key,
                    "image message uploaded"
                );
                Ok(ReplyMessage::text(format!(
                    "{RECEIPT_MESSAGE}{}",
                    uploaded.location
                )))
            }
            Err(e) => {
                tracing::error!(
                    code = e.code(),
                    error = &e as &dyn std::error::Error,
                    "image message upload failed"
                );
                Err(e)
            }
        }
    }

    /// Resolves the download request for a message
    ///
    /// # Errors
    ///
    /// Returns `IngestError::UnresolvableSource` if no URL can be derived
    pub fn fetch_request(&self, event: &ImageMessageEvent) -> IngestResult<FetchRequest> {
        let provider = &event.message.content_provider;
        let url = content_url(&event.message).ok_or(IngestError::UnresolvableSource {
            provider: provider.kind(),
        })?;

        let bearer_token = matches!(provider, common_types::ContentProvider::Line)
            .then(|| self.config.channel_access_token.clone());

        Ok(FetchRequest { url, bearer_token })
    }

    async fn ingest(&self, event: &ImageMessageEvent) -> IngestResult<UploadedImage> {
        let request = self.fetch_request(event)?;
        tracing::debug!(url = %request.url, "fetching image content");

        let content = self.fetcher.fetch(request).await?;

        let format = ImageFormat::from_content_type(content.content_type.as_deref());
        let key = storage_key(&event.source.user_id, &event.message.id, format);
        tracing::debug!(%key, content_type = ?content.content_type, "uploading image");

        let outcome = self
            .storage
            .upload_stream(StreamUpload {
                bucket: self.config.bucket_name.clone(),
                key,
                content_type: content.content_type,
                body: content.body,
            })
            .await?;

        match (outcome.location, outcome.key) {
            (Some(location), Some(key)) => Ok(UploadedImage { location, key }),
            _ => Err(IngestError::UploadFailed(UploadError::IncompleteResult)),
        }
    }
}
