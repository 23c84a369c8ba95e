//! Database migrations
//!
//! Schema changes are additive only. Each version introduces a set of
//! collections; upgrading to a target version ensures every collection
//! introduced at or below it exists, whatever the starting version.

use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use super::collection::Collection;
use crate::error::StorageError;

/// Current schema version
pub const CURRENT_VERSION: i32 = 4;

/// Collections introduced at each schema version
const SCHEMA: &[(i32, &[Collection])] = &[
    (1, &[Collection::Restaurants]),
    (2, &[Collection::Reviews]),
    (3, &[Collection::PendingReviews]),
    (4, &[Collection::PendingFavorites]),
];

/// Every collection that must exist at `version`
pub fn collections_up_to(version: i32) -> impl Iterator<Item = Collection> {
    SCHEMA
        .iter()
        .filter(move |(introduced, _)| *introduced <= version)
        .flat_map(|(_, collections)| collections.iter().copied())
}

/// Run all pending migrations
pub fn run(conn: &mut Connection) -> Result<i32, StorageError> {
    run_to(conn, CURRENT_VERSION)
}

/// Migrate up to `target`, returning the resulting schema version.
///
/// The version check happens under an immediate (write-locking) transaction,
/// so two connections opening the same file concurrently cannot both apply
/// the upgrade.
pub fn run_to(conn: &mut Connection, target: i32) -> Result<i32, StorageError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let version = get_version(&tx)?;
    if version >= target {
        tx.commit()?;
        return Ok(version);
    }

    for collection in collections_up_to(target) {
        tx.execute(collection.create_sql(), [])
            .map_err(|error| StorageError::Migration {
                version: target,
                message: format!("creating {}: {error}", collection.name()),
            })?;
    }

    for applied in (version + 1)..=target {
        tx.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?)",
            [applied],
        )?;
    }

    tx.commit()?;
    tracing::info!("Migrated local store from version {version} to {target}");
    Ok(target)
}

/// Get the current schema version
pub fn get_version(conn: &Connection) -> Result<i32, StorageError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0)
        })
        .optional()?
        .flatten()
        .unwrap_or(0);

    Ok(version)
}
