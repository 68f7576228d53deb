use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::Client as S3Client;

use line_bot_backend::{
    content_fetcher::HttpContentFetcher,
    ingest::{ImageIngestHandler, IngestConfig},
    line_api::LineMessagingClient,
    media_storage::MediaStorage,
    server,
    types::Environment,
};
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.tracing_level()).into())
        .from_env_lossy();

    // Use JSON format for staging/production (Datadog), regular format for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt().json().with_env_filter(env_filter).init();
        }
        Environment::Development { .. } => {
            fmt().with_env_filter(env_filter).init();
        }
    }

    let config = IngestConfig::from_env(&environment)?;
    tracing::info!(bucket = %config.bucket_name, "loaded ingest configuration");

    let http_client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let media_storage = Arc::new(MediaStorage::new(s3_client));
    let fetcher = Arc::new(HttpContentFetcher::new(http_client.clone()));
    let reply_sender = Arc::new(LineMessagingClient::new(
        http_client,
        config.channel_access_token.clone(),
    ));

    let ingest_handler = Arc::new(ImageIngestHandler::new(config, fetcher, media_storage));

    server::start(environment, ingest_handler, reply_sender).await
}
