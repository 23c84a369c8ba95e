//! Review model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lenient;
use super::Timestamp;
use crate::error::{Error, Result};

/// Lowest accepted rating
pub const MIN_RATING: u8 = 1;
/// Highest accepted rating
pub const MAX_RATING: u8 = 5;
/// Upper bound on review text, in characters
pub const MAX_COMMENTS_CHARS: usize = 5000;

/// A restaurant review.
///
/// `id` is server-assigned; reviews still waiting in the offline queue
/// never carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::i64_from_any")]
    pub restaurant_id: i64,
    /// Author name
    pub name: String,
    #[serde(deserialize_with = "lenient::u8_from_any")]
    pub rating: u8,
    #[serde(default)]
    pub comments: String,
    #[serde(rename = "createdAt", default = "Timestamp::now")]
    pub created_at: Timestamp,
    #[serde(
        rename = "updatedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<Timestamp>,
}

/// Raw review form input, checked by [`NewReview::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub restaurant_id: i64,
    pub name: String,
    pub rating: i64,
    pub comments: String,
}

impl NewReview {
    /// Validate form input and turn it into an uncommitted review.
    pub fn validate(self) -> Result<Review> {
        if self.restaurant_id <= 0 {
            return Err(Error::Validation(format!(
                "restaurant id must be positive, got {}",
                self.restaurant_id
            )));
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("reviewer name cannot be empty".into()));
        }

        let rating = u8::try_from(self.rating)
            .ok()
            .filter(|rating| (MIN_RATING..=MAX_RATING).contains(rating))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "rating must be between {MIN_RATING} and {MAX_RATING}, got {}",
                    self.rating
                ))
            })?;

        let comments = self.comments.trim();
        if comments.chars().count() > MAX_COMMENTS_CHARS {
            return Err(Error::Validation(format!(
                "comments exceed {MAX_COMMENTS_CHARS} characters"
            )));
        }

        let now = Timestamp::now();
        Ok(Review {
            id: None,
            restaurant_id: self.restaurant_id,
            name: name.to_string(),
            rating,
            comments: comments.to_string(),
            created_at: now,
            updated_at: Some(now),
        })
    }
}

/// A review queued while the server was unreachable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReview {
    /// Local queue key, assigned by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<i64>,
    /// Client-generated key letting the server drop replayed duplicates
    pub idempotency_key: Uuid,
    pub review: Review,
    pub queued_at: Timestamp,
}

impl PendingReview {
    pub fn new(mut review: Review) -> Self {
        review.id = None;
        Self {
            key: None,
            idempotency_key: Uuid::now_v7(),
            review,
            queued_at: Timestamp::now(),
        }
    }

    /// Wire form for replay, with every local-only identifier stripped.
    pub fn to_submission(&self) -> ReviewSubmission {
        let mut review = self.review.clone();
        review.id = None;
        ReviewSubmission {
            review,
            idempotency_key: Some(self.idempotency_key),
        }
    }
}

/// Body of a `POST /reviews` item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSubmission {
    #[serde(flatten)]
    pub review: Review,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<Uuid>,
}
