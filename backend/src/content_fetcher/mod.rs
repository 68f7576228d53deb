//! Streaming download of message content
mod error;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use tracing::instrument;

pub use error::{FetchError, FetchResult};

/// Body of a fetched resource, consumed at most once
pub type ContentStream = BoxStream<'static, FetchResult<Bytes>>;

/// A resolved download request
#[derive(Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Absolute URL of the content
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` when present
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchRequest")
            .field("url", &self.url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Response headers of interest plus the unread body
pub struct FetchedContent {
    /// Raw `Content-Type` header value, if any
    pub content_type: Option<String>,
    /// Body bytes as they arrive from the network
    pub body: ContentStream,
}

/// Downloads content without buffering the body
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Sends the request and returns once the response headers are available
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Request` for transport errors
    /// Returns `FetchError::Status` for non-success responses
    async fn fetch(&self, request: FetchRequest) -> FetchResult<FetchedContent>;
}

/// `ContentFetcher` backed by a shared `reqwest` client
#[derive(Clone)]
pub struct HttpContentFetcher {
    client: reqwest::Client,
}

impl HttpContentFetcher {
    /// Creates a fetcher on top of an existing client
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn fetch(&self, request: FetchRequest) -> FetchResult<FetchedContent> {
        let mut builder = self.client.get(&request.url);
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|source| FetchError::Request {
            url: request.url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: request.url,
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        tracing::debug!(?content_type, "content response received");

        let body = response
            .bytes_stream()
            .map_err(FetchError::Body)
            .boxed();

        Ok(FetchedContent { content_type, body })
    }
}
