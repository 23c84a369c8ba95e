//! Results reported by the reconciliation engine.

use serde::Serialize;

use crate::error::TransportError;
use crate::models::{PendingReview, Restaurant, Review};

/// Where a routed read was served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadState {
    /// Local store already held the records
    LocalHit,
    /// Local store was empty; records came from the server and were stored
    Populated,
    /// Local store was empty and the server could not be reached
    Offline(TransportError),
}

/// A record set plus how it was obtained.
///
/// An empty `Offline` set means "unknown", an empty `Populated` set means
/// the server really has nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed<T> {
    pub records: Vec<T>,
    pub state: ReadState,
}

impl<T> Routed<T> {
    pub const fn local(records: Vec<T>) -> Self {
        Self {
            records,
            state: ReadState::LocalHit,
        }
    }

    pub const fn populated(records: Vec<T>) -> Self {
        Self {
            records,
            state: ReadState::Populated,
        }
    }

    pub const fn offline(error: TransportError) -> Self {
        Self {
            records: Vec::new(),
            state: ReadState::Offline(error),
        }
    }

    pub const fn is_offline(&self) -> bool {
        matches!(self.state, ReadState::Offline(_))
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }
}

/// Result of toggling a favorite.
#[derive(Debug, Clone, PartialEq)]
pub enum FavoriteOutcome {
    /// Stored locally and accepted by the server
    Synced(Restaurant),
    /// Stored locally; the change waits in the pending queue
    Queued(Restaurant),
}

impl FavoriteOutcome {
    pub const fn restaurant(&self) -> &Restaurant {
        match self {
            Self::Synced(restaurant) | Self::Queued(restaurant) => restaurant,
        }
    }

    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced(_))
    }
}

/// Shown whenever a write is deferred until the server is back.
pub const OFFLINE_NOTICE: &str =
    "Server connection lost. Your changes will be submitted when the server is back online.";

/// Result of posting a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Accepted by the server and stored with its server id
    Committed(Review),
    /// Queued for replay by the next review sweep
    Queued(PendingReview),
}

impl ReviewOutcome {
    pub const fn review(&self) -> &Review {
        match self {
            Self::Committed(review) => review,
            Self::Queued(pending) => &pending.review,
        }
    }

    /// User-facing notice for deferred submissions
    pub const fn notice(&self) -> Option<&'static str> {
        match self {
            Self::Committed(_) => None,
            Self::Queued(_) => Some(OFFLINE_NOTICE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    Favorites,
    Reviews,
}

/// One record a sweep could not push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFailure {
    /// Restaurant the failed write targeted; `None` for a whole review batch
    pub restaurant_id: Option<i64>,
    pub error: TransportError,
}

/// Summary of one best-effort reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub kind: SweepKind,
    /// The probe failed, nothing was attempted
    pub skipped: bool,
    /// Records accepted by the server
    pub synced: usize,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    pub const fn new(kind: SweepKind) -> Self {
        Self {
            kind,
            skipped: false,
            synced: 0,
            failures: Vec::new(),
        }
    }

    pub const fn skipped(kind: SweepKind) -> Self {
        Self {
            kind,
            skipped: true,
            synced: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.skipped && self.failures.is_empty()
    }
}

/// Reports of the two startup sweeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    pub favorites: SweepReport,
    pub reviews: SweepReport,
}

impl StartupReport {
    pub fn is_clean(&self) -> bool {
        self.favorites.is_clean() && self.reviews.is_clean()
    }

    pub const fn is_offline(&self) -> bool {
        self.favorites.skipped && self.reviews.skipped
    }
}
