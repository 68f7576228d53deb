//! LINE bot backend
//!
//! Receives LINE webhook deliveries and copies image messages into an S3 bucket
//! under `{user_id}/images/{message_id}.{extension}`.

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]
#![warn(missing_docs)]

/// Streaming download of message content
pub mod content_fetcher;

/// Image message ingestion
pub mod ingest;

/// LINE Messaging API client
pub mod line_api;

/// S3 multipart storage
pub mod media_storage;

/// HTTP routes
pub mod routes;

/// HTTP server
pub mod server;

/// Configuration and API error types
pub mod types;
