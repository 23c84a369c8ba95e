//! Named collections of the local store and the records they hold

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{PendingFavorite, PendingReview, Restaurant, Review};

/// A named partition of the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Restaurants,
    Reviews,
    PendingReviews,
    PendingFavorites,
}

impl Collection {
    pub const ALL: [Self; 4] = [
        Self::Restaurants,
        Self::Reviews,
        Self::PendingReviews,
        Self::PendingFavorites,
    ];

    /// Collection name as exposed to callers
    pub const fn name(self) -> &'static str {
        match self {
            Self::Restaurants => "restaurants",
            Self::Reviews => "reviews",
            Self::PendingReviews => "pendingReviews",
            Self::PendingFavorites => "pendingFavorites",
        }
    }

    pub(crate) const fn table(self) -> &'static str {
        match self {
            Self::Restaurants => "restaurants",
            Self::Reviews => "reviews",
            Self::PendingReviews => "pending_reviews",
            Self::PendingFavorites => "pending_favorites",
        }
    }

    /// DDL for the backing table. Auto-keyed collections never reuse keys.
    pub(crate) const fn create_sql(self) -> &'static str {
        match self {
            Self::Restaurants => {
                "CREATE TABLE IF NOT EXISTS restaurants (
                    key INTEGER PRIMARY KEY,
                    record TEXT NOT NULL
                )"
            }
            Self::Reviews => {
                "CREATE TABLE IF NOT EXISTS reviews (
                    key INTEGER PRIMARY KEY AUTOINCREMENT,
                    record TEXT NOT NULL
                )"
            }
            Self::PendingReviews => {
                "CREATE TABLE IF NOT EXISTS pending_reviews (
                    key INTEGER PRIMARY KEY AUTOINCREMENT,
                    record TEXT NOT NULL
                )"
            }
            Self::PendingFavorites => {
                "CREATE TABLE IF NOT EXISTS pending_favorites (
                    key INTEGER PRIMARY KEY,
                    record TEXT NOT NULL
                )"
            }
        }
    }
}

/// A record that lives in exactly one collection.
///
/// Records either carry their own primary key (`key` returns `Some`) or get
/// one assigned by the store on first write.
pub trait StoredRecord: Serialize + DeserializeOwned + Send + 'static {
    const COLLECTION: Collection;

    /// Inline primary key, if the record has one
    fn key(&self) -> Option<i64>;

    /// Receive the store-assigned key
    fn assign_key(&mut self, key: i64);
}

impl StoredRecord for Restaurant {
    const COLLECTION: Collection = Collection::Restaurants;

    fn key(&self) -> Option<i64> {
        Some(self.id)
    }

    fn assign_key(&mut self, key: i64) {
        self.id = key;
    }
}

impl StoredRecord for Review {
    const COLLECTION: Collection = Collection::Reviews;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn assign_key(&mut self, key: i64) {
        self.id = Some(key);
    }
}

impl StoredRecord for PendingReview {
    const COLLECTION: Collection = Collection::PendingReviews;

    fn key(&self) -> Option<i64> {
        self.key
    }

    fn assign_key(&mut self, key: i64) {
        self.key = Some(key);
    }
}

impl StoredRecord for PendingFavorite {
    const COLLECTION: Collection = Collection::PendingFavorites;

    fn key(&self) -> Option<i64> {
        Some(self.restaurant_id)
    }

    fn assign_key(&mut self, key: i64) {
        self.restaurant_id = key;
    }
}
