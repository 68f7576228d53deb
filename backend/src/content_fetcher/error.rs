//! Error types for content fetching

use thiserror::Error;

/// Result type for content fetching
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur while downloading message content
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or the response headers never arrived
    #[error("request to {url} failed")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// The content server answered with a non-success status
    #[error("content server returned HTTP {status} for {url}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The response body failed mid-stream
    #[error("content stream interrupted")]
    Body(#[source] reqwest::Error),
}
