//! resto-core - Core library for resto
//!
//! This crate contains the models, local store, remote gateway,
//! reconciliation engine, and offline asset cache shared by every resto
//! client.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod reconcile;
pub mod remote;
pub mod state;

pub use config::ClientConfig;
pub use db::LocalStore;
pub use error::{Error, Result, StorageError, TransportError};
pub use models::{NewReview, Restaurant, Review};
pub use query::Filter;
pub use reconcile::Reconciler;
pub use remote::{HttpGateway, RemoteGateway};
pub use state::{AppState, SyncState};
