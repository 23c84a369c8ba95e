//! reqwest-backed gateway to the restaurants/reviews API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{GatewayResult, RemoteGateway, Resource};
use crate::config::{has_http_scheme, ClientConfig};
use crate::error::{Error, Result, TransportError};
use crate::models::{Restaurant, Review, ReviewSubmission};

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_CHARS: usize = 180;

/// HTTP client for the remote API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
    probe_timeout: Duration,
    request_timeout: Duration,
}

impl HttpGateway {
    /// Builds a gateway for an explicit API base URL with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(base_url, DEFAULT_PROBE_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::with_timeouts(
            config.api_base_url.as_str(),
            config.probe_timeout(),
            config.request_timeout(),
        )
    }

    pub fn with_timeouts(
        base_url: impl Into<String>,
        probe_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|error| Error::Config(format!("Failed to construct HTTP client: {error}")))?;
        Ok(Self {
            base_url,
            client,
            probe_timeout,
            request_timeout,
        })
    }

    /// Returns the base URL this gateway was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder, timeout: Duration) -> GatewayResult<Response> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|error| classify(&error, timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: parse_api_error(status, &body),
            });
        }
        Ok(response)
    }

    async fn read_body(&self, response: Response) -> GatewayResult<Vec<u8>> {
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|error| classify(&error, self.request_timeout))
    }

    async fn read_json<T: DeserializeOwned>(&self, response: Response) -> GatewayResult<T> {
        let body = self.read_body(response).await?;
        serde_json::from_slice(&body).map_err(|error| TransportError::Malformed(error.to_string()))
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn probe(&self, resource: Resource) -> bool {
        let request = self
            .client
            .get(self.url(resource.path()))
            .timeout(self.probe_timeout);
        match self.send(request, self.probe_timeout).await {
            Ok(_) => true,
            Err(error) => {
                tracing::debug!("Probe of {} failed: {error}", resource.path());
                false
            }
        }
    }

    async fn list_restaurants(&self) -> GatewayResult<Vec<Restaurant>> {
        let request = self.client.get(self.url("/restaurants"));
        let response = self.send(request, self.request_timeout).await?;
        self.read_json(response).await
    }

    async fn list_reviews(&self, restaurant_id: i64) -> GatewayResult<Vec<Review>> {
        let request = self
            .client
            .get(self.url("/reviews"))
            .query(&[("restaurant_id", restaurant_id)]);
        let response = self.send(request, self.request_timeout).await?;
        self.read_json(response).await
    }

    async fn create_review(&self, review: &ReviewSubmission) -> GatewayResult<Review> {
        let request = self.client.post(self.url("/reviews")).json(review);
        let response = self.send(request, self.request_timeout).await?;
        self.read_json(response).await
    }

    async fn create_reviews(&self, reviews: &[ReviewSubmission]) -> GatewayResult<Vec<Review>> {
        let request = self.client.post(self.url("/reviews")).json(reviews);
        let response = self.send(request, self.request_timeout).await?;
        let body = self.read_body(response).await?;
        Ok(decode_batch_response(&body))
    }

    async fn update_favorite(
        &self,
        restaurant_id: i64,
        is_favorite: bool,
    ) -> GatewayResult<Restaurant> {
        let request = self
            .client
            .put(self.url(&format!("/restaurants/{restaurant_id}")))
            .query(&[("is_favorite", is_favorite)]);
        let response = self.send(request, self.request_timeout).await?;
        self.read_json(response).await
    }

    async fn update_restaurant(&self, restaurant: &Restaurant) -> GatewayResult<()> {
        // Servers that only read the query flag still get the favorite change.
        let request = self
            .client
            .put(self.url(&format!("/restaurants/{}", restaurant.id)))
            .query(&[("is_favorite", restaurant.is_favorite)])
            .json(restaurant);
        self.send(request, self.request_timeout).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BatchResponse {
    Many(Vec<Review>),
    One(Box<Review>),
}

/// The batch endpoint may echo an array, a single review, or nothing.
fn decode_batch_response(body: &[u8]) -> Vec<Review> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Vec::new();
    }
    match serde_json::from_slice::<BatchResponse>(body) {
        Ok(BatchResponse::Many(reviews)) => reviews,
        Ok(BatchResponse::One(review)) => vec![*review],
        Err(error) => {
            tracing::warn!("Accepted review batch returned an unrecognized body: {error}");
            Vec::new()
        }
    }
}

fn classify(error: &reqwest::Error, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
    } else if error.is_decode() {
        TransportError::Malformed(error.to_string())
    } else {
        TransportError::Unreachable(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return error_excerpt(&message);
        }
    }

    let trimmed = error_excerpt(body);
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed
    }
}

fn error_excerpt(text: &str) -> String {
    text.trim().chars().take(MAX_ERROR_CHARS).collect()
}

fn normalize_base_url(raw: String) -> Result<String> {
    let base_url = raw.trim();
    if base_url.is_empty() {
        return Err(Error::Config("API base URL must not be empty".to_string()));
    }
    if has_http_scheme(base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}
