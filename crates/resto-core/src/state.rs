//! Application state owned by the UI layer.

use crate::models::{Restaurant, Review};
use crate::query::{self, Filter};
use crate::reconcile::{ReadState, StartupReport};

/// Sync status shown to the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Offline,
    Syncing,
    Synced,
    Error,
}

impl SyncState {
    /// Derive the status from the startup sweeps.
    pub fn from_startup(report: &StartupReport) -> Self {
        if report.is_offline() {
            Self::Offline
        } else if report.is_clean() {
            Self::Synced
        } else {
            Self::Error
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}

/// Everything a view needs between engine calls.
///
/// The engine never holds this; callers load data into it and read from it.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub restaurants: Vec<Restaurant>,
    pub reviews: Vec<Review>,
    pub cuisine: Filter,
    pub neighborhood: Filter,
    pub sync_state: SyncState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_filters(&mut self, cuisine: Filter, neighborhood: Filter) {
        self.cuisine = cuisine;
        self.neighborhood = neighborhood;
    }

    /// Replace the restaurant list; an offline read marks the state offline.
    pub fn load_restaurants(&mut self, restaurants: Vec<Restaurant>, state: &ReadState) {
        self.restaurants = restaurants;
        if matches!(state, ReadState::Offline(_)) {
            self.sync_state = SyncState::Offline;
        }
    }

    pub fn load_reviews(&mut self, reviews: Vec<Review>) {
        self.reviews = reviews;
    }

    pub fn record_startup(&mut self, report: &StartupReport) {
        self.sync_state = SyncState::from_startup(report);
    }

    /// Restaurants matching the current filters.
    pub fn visible_restaurants(&self) -> Vec<Restaurant> {
        query::by_cuisine_and_neighborhood(&self.restaurants, &self.cuisine, &self.neighborhood)
    }
}
