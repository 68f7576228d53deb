use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use bytes::Bytes;
use common_types::ReplyMessage;
use futures::{stream, StreamExt};
use line_bot_backend::{
    content_fetcher::{ContentFetcher, FetchError, FetchRequest, FetchResult, FetchedContent},
    line_api::{ReplyError, ReplyResult, ReplySender},
    media_storage::{ObjectStorage, StreamUpload, UploadError, UploadOutcome, UploadResult},
};

/// A mid-stream body failure carrying a real `reqwest` cause
pub fn interrupted_body() -> FetchError {
    let source = reqwest::Client::new()
        .get("connection-reset")
        .build()
        .unwrap_err();
    FetchError::Body(source)
}

/// Serves canned content and records every request it receives
#[derive(Default)]
pub struct RecordingFetcher {
    requests: Mutex<Vec<FetchRequest>>,
    content_type: Option<String>,
    chunks: Vec<Bytes>,
    fail_status: Option<u16>,
    break_stream: bool,
}

impl RecordingFetcher {
    pub fn serving(content_type: Option<&str>, data: &[u8]) -> Self {
        Self {
            content_type: content_type.map(ToString::to_string),
            chunks: data.chunks(3).map(Bytes::copy_from_slice).collect(),
            ..Self::default()
        }
    }

    pub fn failing_with_status(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::default()
        }
    }

    /// Yields the content and then fails mid-stream
    pub fn breaking_mid_stream(data: &[u8]) -> Self {
        Self {
            break_stream: true,
            ..Self::serving(Some("image/jpeg"), data)
        }
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentFetcher for RecordingFetcher {
    async fn fetch(&self, request: FetchRequest) -> FetchResult<FetchedContent> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(status) = self.fail_status {
            return Err(FetchError::Status {
                url: request.url,
                status,
            });
        }

        let mut items: Vec<FetchResult<Bytes>> = self.chunks.iter().cloned().map(Ok).collect();
        if self.break_stream {
            items.push(Err(interrupted_body()));
        }

        Ok(FetchedContent {
            content_type: self.content_type.clone(),
            body: stream::iter(items).boxed(),
        })
    }
}

/// An object written by `RecordingStorage`
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default)]
pub enum StorageBehavior {
    #[default]
    Complete,
    /// Finishes without reporting a location
    Incomplete,
    Reject,
}

/// In-memory object storage
#[derive(Default)]
pub struct RecordingStorage {
    behavior: StorageBehavior,
    objects: Mutex<Vec<StoredObject>>,
    calls: AtomicUsize,
}

impl RecordingStorage {
    pub fn with_behavior(behavior: StorageBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    pub fn location_of(bucket: &str, key: &str) -> String {
        format!("https://{bucket}.s3.ap-northeast-1.amazonaws.com/{key}")
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn upload_stream(&self, upload: StreamUpload) -> UploadResult<UploadOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let StreamUpload {
            bucket,
            key,
            content_type,
            mut body,
        } = upload;

        let mut data = Vec::new();
        while let Some(chunk) = body.next().await {
            data.extend_from_slice(&chunk.map_err(UploadError::Source)?);
        }

        match self.behavior {
            StorageBehavior::Reject => {
                return Err(UploadError::S3Error("AccessDenied".to_string()));
            }
            StorageBehavior::Incomplete => {
                return Ok(UploadOutcome {
                    location: None,
                    key: Some(key),
                });
            }
            StorageBehavior::Complete => {}
        }

        let location = Self::location_of(&bucket, &key);
        self.objects.lock().unwrap().push(StoredObject {
            bucket,
            key: key.clone(),
            content_type,
            data,
        });

        Ok(UploadOutcome {
            location: Some(location),
            key: Some(key),
        })
    }
}

/// Records replies instead of sending them
#[derive(Default)]
pub struct RecordingReplySender {
    replies: Mutex<Vec<(String, Vec<ReplyMessage>)>>,
    fail: bool,
}

impl RecordingReplySender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn replies(&self) -> Vec<(String, Vec<ReplyMessage>)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplySender for RecordingReplySender {
    async fn reply(&self, reply_token: &str, messages: Vec<ReplyMessage>) -> ReplyResult<()> {
        self.replies
            .lock()
            .unwrap()
            .push((reply_token.to_string(), messages));

        if self.fail {
            return Err(ReplyError::Status {
                status: 400,
                body: r#"{"message":"Invalid reply token"}"#.to_string(),
            });
        }
        Ok(())
    }
}
