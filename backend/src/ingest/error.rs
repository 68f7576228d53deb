//! Error types for image ingestion

use thiserror::Error;

use crate::{content_fetcher::FetchError, media_storage::UploadError};

/// Result type for image ingestion
pub type IngestResult<T> = Result<T, IngestError>;

/// Why an image message could not be stored
#[derive(Error, Debug)]
pub enum IngestError {
    /// The content provider is not supported or carries no URL
    #[error("cannot resolve content URL for provider `{provider}`")]
    UnresolvableSource {
        /// Wire name of the content provider
        provider: &'static str,
    },

    /// Downloading the image failed
    #[error("failed to fetch image")]
    FetchFailed(#[source] FetchError),

    /// Writing the image to the bucket failed
    #[error("failed to upload image")]
    UploadFailed(#[source] UploadError),
}

impl IngestError {
    /// Machine-readable error kind
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnresolvableSource { .. } => "unresolvable_source",
            Self::FetchFailed(_) => "fetch_failed",
            Self::UploadFailed(_) => "upload_failed",
        }
    }
}

impl From<FetchError> for IngestError {
    fn from(error: FetchError) -> Self {
        Self::FetchFailed(error)
    }
}

/// A body that breaks while being uploaded is a fetch failure
impl From<UploadError> for IngestError {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::Source(source) => Self::FetchFailed(source),
            other => Self::UploadFailed(other),
        }
    }
}

/// Configuration that is missing or invalid at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    #[error("{0} environment variable is not set")]
    MissingVar(&'static str),
}
