//! Local store: a versioned, collection-oriented database

mod collection;
mod connection;
mod migrations;
mod store;

pub use collection::{Collection, StoredRecord};
pub use connection::Database;
pub use migrations::CURRENT_VERSION;
pub use store::{CollectionStats, LocalStore, StorageResult};
