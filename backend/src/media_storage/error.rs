//! Error types for object uploads

use aws_sdk_s3::{
    error::{DisplayErrorContext, SdkError},
    operation::{
        complete_multipart_upload::CompleteMultipartUploadError,
        create_multipart_upload::CreateMultipartUploadError, upload_part::UploadPartError,
    },
};
use thiserror::Error;

use crate::content_fetcher::FetchError;

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that can occur while streaming an object into the bucket
#[derive(Error, Debug)]
pub enum UploadError {
    /// S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    /// S3 accepted the request but did not hand out an upload id
    #[error("multipart upload was created without an upload id")]
    MissingUploadId,

    /// The upload finished without reporting where the object lives
    #[error("upload completed without a location and key")]
    IncompleteResult,

    /// The body being uploaded failed before it was fully read
    #[error("source stream failed")]
    Source(#[source] FetchError),
}

impl UploadError {
    fn from_sdk<E>(error: &SdkError<E>) -> Self
    where
        E: std::error::Error + 'static,
    {
        let message = DisplayErrorContext(error).to_string();
        match error {
            SdkError::ServiceError(service_err) if service_err.raw().status().as_u16() >= 500 => {
                Self::UpstreamError(message)
            }
            _ => Self::S3Error(message),
        }
    }
}

impl From<SdkError<CreateMultipartUploadError>> for UploadError {
    fn from(error: SdkError<CreateMultipartUploadError>) -> Self {
        Self::from_sdk(&error)
    }
}

impl From<SdkError<UploadPartError>> for UploadError {
    fn from(error: SdkError<UploadPartError>) -> Self {
        Self::from_sdk(&error)
    }
}

impl From<SdkError<CompleteMultipartUploadError>> for UploadError {
    fn from(error: SdkError<CompleteMultipartUploadError>) -> Self {
        Self::from_sdk(&error)
    }
}
