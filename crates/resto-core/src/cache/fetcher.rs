//! Network side of the cache worker.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::storage::AssetResponse;
use crate::error::{Error, Result, TransportError};

/// Fetches assets from the network. Any HTTP status is a response; only
/// network-level failures are errors.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> std::result::Result<AssetResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpAssetFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::Config(format!("Failed to construct HTTP client: {error}")))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &Url) -> std::result::Result<AssetResponse, TransportError> {
        let map_error = |error: reqwest::Error| {
            if error.is_timeout() {
                TransportError::Timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX))
            } else {
                TransportError::Unreachable(error.to_string())
            }
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_error)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let body = response.bytes().await.map_err(map_error)?;

        Ok(AssetResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}
