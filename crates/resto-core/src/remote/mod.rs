//! Remote API gateway.
//!
//! The reconciliation engine only talks to the server through
//! [`RemoteGateway`], so tests swap in an in-memory double and the CLI
//! uses [`HttpGateway`].

mod http;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::models::{Restaurant, Review, ReviewSubmission};

pub use http::HttpGateway;

/// Result type for gateway calls
pub type GatewayResult<T> = std::result::Result<T, TransportError>;

/// Server resource a liveness probe targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Restaurants,
    Reviews,
}

impl Resource {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Restaurants => "/restaurants",
            Self::Reviews => "/reviews",
        }
    }
}

/// Everything the client asks of the remote restaurants/reviews API.
///
/// Implementations must never panic on network failure; every failure is a
/// [`TransportError`].
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Whether `resource` answers with a success status within the probe timeout.
    async fn probe(&self, resource: Resource) -> bool;

    async fn list_restaurants(&self) -> GatewayResult<Vec<Restaurant>>;

    async fn list_reviews(&self, restaurant_id: i64) -> GatewayResult<Vec<Review>>;

    /// Submit one review and return the committed server copy.
    async fn create_review(&self, review: &ReviewSubmission) -> GatewayResult<Review>;

    /// Submit a batch of queued reviews in one request.
    async fn create_reviews(&self, reviews: &[ReviewSubmission]) -> GatewayResult<Vec<Review>>;

    /// Set a restaurant's favorite flag and return the updated record.
    async fn update_favorite(&self, restaurant_id: i64, is_favorite: bool)
        -> GatewayResult<Restaurant>;

    /// Push a full locally modified restaurant record.
    async fn update_restaurant(&self, restaurant: &Restaurant) -> GatewayResult<()>;
}
