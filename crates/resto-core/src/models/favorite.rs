//! Queued favorite intent

use serde::{Deserialize, Serialize};

use super::Timestamp;

/// The latest favorite toggle for a restaurant not yet acknowledged upstream.
///
/// Keyed by restaurant id, so repeated toggles collapse into one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFavorite {
    pub restaurant_id: i64,
    pub is_favorite: bool,
    pub queued_at: Timestamp,
}

impl PendingFavorite {
    pub fn new(restaurant_id: i64, is_favorite: bool) -> Self {
        Self {
            restaurant_id,
            is_favorite,
            queued_at: Timestamp::now(),
        }
    }
}
