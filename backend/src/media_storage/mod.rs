//! S3-backed storage for message contents
mod error;
pub mod part_buffer;

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::{
    error::DisplayErrorContext,
    primitives::ByteStream,
    types::{CompletedMultipartUpload, CompletedPart},
    Client as S3Client,
};
use bytes::Bytes;
use futures::StreamExt;
use tracing::instrument;

pub use error::{UploadError, UploadResult};
pub use part_buffer::{PartBuffer, MIN_PART_SIZE};

use crate::content_fetcher::ContentStream;

/// A streaming write of one object
pub struct StreamUpload {
    /// Target bucket
    pub bucket: String,
    /// Object key inside the bucket
    pub key: String,
    /// Stored as the object's `Content-Type` when present
    pub content_type: Option<String>,
    /// Object contents, read exactly once
    pub body: ContentStream,
}

/// What the storage reported once the object was written
///
/// Both fields are optional because the service response is; callers decide
/// whether a partial answer counts as success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOutcome {
    /// URL of the stored object
    pub location: Option<String>,
    /// Key the object was stored under
    pub key: Option<String>,
}

/// Object storage that accepts bodies of unknown length
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Writes the whole body under `upload.key`, overwriting any existing object
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Source` if the body stream fails
    /// Returns `UploadError::S3Error` or `UploadError::UpstreamError` if the service rejects a request
    async fn upload_stream(&self, upload: StreamUpload) -> UploadResult<UploadOutcome>;
}

/// Multipart uploader for S3
///
/// Memory use is bounded by the part size regardless of the object size.
pub struct MediaStorage {
    s3_client: Arc<S3Client>,
    part_size: usize,
}

impl MediaStorage {
    /// Creates a new media storage client using the minimum part size
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>) -> Self {
        Self {
            s3_client,
            part_size: MIN_PART_SIZE,
        }
    }

    /// Uses larger parts, clamped to the S3 minimum
    #[must_use]
    pub fn with_part_size(mut self, part_size: usize) -> Self {
        self.part_size = part_size.max(MIN_PART_SIZE);
        self
    }

    async fn send_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        mut body: ContentStream,
    ) -> UploadResult<UploadOutcome> {
        let mut buffer = PartBuffer::new(self.part_size);
        let mut completed = Vec::new();
        let mut part_number: i32 = 1;

        while let Some(chunk) = body.next().await {
            buffer.push(&chunk.map_err(UploadError::Source)?);

            while let Some(part) = buffer.next_full_part() {
                completed.push(
                    self.upload_part(bucket, key, upload_id, part_number, part)
                        .await?,
                );
                part_number += 1;
            }
        }
        // Source is drained; release the connection before the last round trips
        drop(body);

        let last = buffer.finish();
        if !last.is_empty() || completed.is_empty() {
            completed.push(
                self.upload_part(bucket, key, upload_id, part_number, last)
                    .await?,
            );
        }

        let parts = completed.len();
        let output = self
            .s3_client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await?;

        tracing::info!(parts, "multipart upload completed");

        Ok(UploadOutcome {
            location: output.location().map(ToString::to_string),
            key: output.key().map(ToString::to_string),
        })
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        part: Bytes,
    ) -> UploadResult<CompletedPart> {
        let size = part.len();
        let output = self
            .s3_client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(part))
            .send()
            .await?;

        tracing::debug!(part_number, size, "uploaded part");

        Ok(CompletedPart::builder()
            .set_e_tag(output.e_tag().map(ToString::to_string))
            .part_number(part_number)
            .build())
    }
}

/// An upload id that still holds parts in the bucket
///
/// Dropping it while armed sends `AbortMultipartUpload` from a background task.
struct PendingUpload {
    s3_client: Arc<S3Client>,
    bucket: String,
    key: String,
    upload_id: String,
    armed: bool,
}

impl PendingUpload {
    /// The upload was completed and S3 released the id itself
    fn disarm(mut self) {
        self.armed = false;
    }

    async fn abort(mut self) {
        abort_upload(&self.s3_client, &self.bucket, &self.key, &self.upload_id).await;
        self.armed = false;
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                upload_id = %self.upload_id,
                "no runtime to abort multipart upload"
            );
            return;
        };

        tracing::debug!(upload_id = %self.upload_id, "upload cancelled, aborting");
        let s3_client = Arc::clone(&self.s3_client);
        let bucket = std::mem::take(&mut self.bucket);
        let key = std::mem::take(&mut self.key);
        let upload_id = std::mem::take(&mut self.upload_id);
        runtime.spawn(async move {
            abort_upload(&s3_client, &bucket, &key, &upload_id).await;
        });
    }
}

async fn abort_upload(s3_client: &S3Client, bucket: &str, key: &str, upload_id: &str) {
    let result = s3_client
        .abort_multipart_upload()
        .bucket(bucket)
        .key(key)
        .upload_id(upload_id)
        .send()
        .await;

    match result {
        Ok(_) => tracing::debug!(upload_id, "aborted multipart upload"),
        Err(e) => tracing::warn!(
            upload_id,
            error = %DisplayErrorContext(&e),
            "failed to abort multipart upload"
        ),
    }
}

#[async_trait]
impl ObjectStorage for MediaStorage {
    #[instrument(skip(self, upload), fields(bucket = %upload.bucket, key = %upload.key))]
    async fn upload_stream(&self, upload: StreamUpload) -> UploadResult<UploadOutcome> {
        let StreamUpload {
            bucket,
            key,
            content_type,
            body,
        } = upload;

        let created = self
            .s3_client
            .create_multipart_upload()
            .bucket(&bucket)
            .key(&key)
            .set_content_type(content_type)
            .send()
            .await?;

        let upload_id = created
            .upload_id()
            .ok_or(UploadError::MissingUploadId)?
            .to_string();
        let pending = PendingUpload {
            s3_client: Arc::clone(&self.s3_client),
            bucket,
            key,
            upload_id,
            armed: true,
        };

        match self
            .send_parts(&pending.bucket, &pending.key, &pending.upload_id, body)
            .await
        {
            Ok(outcome) => {
                pending.disarm();
                Ok(outcome)
            }
            Err(e) => {
                pending.abort().await;
                Err(e)
            }
        }
    }
}
