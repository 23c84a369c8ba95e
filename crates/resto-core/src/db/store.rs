//! Collection-oriented local store shared across clients.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension};

use super::collection::{Collection, StoredRecord};
use super::connection::Database;
use crate::error::StorageError;

/// Result type for local store operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Row count of one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStats {
    pub collection: Collection,
    pub records: u64,
}

/// Thread-safe handle to the persistent, versioned object store.
///
/// `SQLite` calls run on the blocking pool so awaiting callers never stall
/// the async runtime. Cloning the handle shares the same connection.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
    path: Option<PathBuf>,
}

impl LocalStore {
    /// Open (creating and migrating if needed) a store at the given path.
    pub async fn open_path(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let open_path = path.clone();
        let db = tokio::task::spawn_blocking(move || Database::open(&open_path))
            .await
            .map_err(|error| StorageError::Worker(error.to_string()))??;

        tracing::debug!("Opened local store at {}", path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            path: Some(path),
        })
    }

    /// Open an in-memory store (primarily for tests).
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            path: None,
        })
    }

    /// Filesystem location, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn with_conn<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut db = db
                .lock()
                .map_err(|_| StorageError::Worker("store lock poisoned".to_string()))?;
            op(db.connection_mut())
        })
        .await
        .map_err(|error| StorageError::Worker(error.to_string()))?
    }

    /// Every record in the collection, in key order.
    pub async fn get_all<T: StoredRecord>(&self) -> StorageResult<Vec<T>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT key, record FROM {} ORDER BY key",
                T::COLLECTION.table()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(key, record)| decode::<T>(key, &record))
                .collect()
        })
        .await
    }

    /// Fetch one record by primary key.
    pub async fn get<T: StoredRecord>(&self, key: i64) -> StorageResult<Option<T>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT record FROM {} WHERE key = ?", T::COLLECTION.table());
            let record: Option<String> = conn
                .query_row(&sql, params![key], |row| row.get(0))
                .optional()?;
            record.map(|record| decode::<T>(key, &record)).transpose()
        })
        .await
    }

    /// Upsert by primary key, returning the key the record is stored under.
    pub async fn put<T: StoredRecord>(&self, record: T) -> StorageResult<i64> {
        self.with_conn(move |conn| put_record(conn, &record)).await
    }

    /// Upsert many records in one transaction; nothing is written on failure.
    pub async fn put_all<T: StoredRecord>(&self, records: Vec<T>) -> StorageResult<Vec<i64>> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let keys = records
                .iter()
                .map(|record| put_record(&tx, record))
                .collect::<StorageResult<Vec<_>>>()?;
            tx.commit()?;
            Ok(keys)
        })
        .await
    }

    /// Remove one record; returns whether it existed.
    pub async fn delete<T: StoredRecord>(&self, key: i64) -> StorageResult<bool> {
        self.with_conn(move |conn| {
            let sql = format!("DELETE FROM {} WHERE key = ?", T::COLLECTION.table());
            Ok(conn.execute(&sql, params![key])? > 0)
        })
        .await
    }

    /// Remove the given keys in one transaction; returns how many existed.
    pub async fn delete_many<T: StoredRecord>(&self, keys: Vec<i64>) -> StorageResult<usize> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let sql = format!("DELETE FROM {} WHERE key = ?", T::COLLECTION.table());
            let mut removed = 0;
            for key in keys {
                removed += tx.execute(&sql, params![key])?;
            }
            tx.commit()?;
            Ok(removed)
        })
        .await
    }

    /// Remove every record in the collection; returns how many were removed.
    pub async fn clear<T: StoredRecord>(&self) -> StorageResult<usize> {
        self.with_conn(|conn| {
            let sql = format!("DELETE FROM {}", T::COLLECTION.table());
            Ok(conn.execute(&sql, [])?)
        })
        .await
    }

    /// Number of records in the collection.
    pub async fn count<T: StoredRecord>(&self) -> StorageResult<u64> {
        self.with_conn(|conn| count_table(conn, T::COLLECTION)).await
    }

    /// Current schema version.
    pub async fn schema_version(&self) -> StorageResult<i32> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            db.lock()
                .map_err(|_| StorageError::Worker("store lock poisoned".to_string()))?
                .schema_version()
        })
        .await
        .map_err(|error| StorageError::Worker(error.to_string()))?
    }

    /// Row counts for every collection.
    pub async fn stats(&self) -> StorageResult<Vec<CollectionStats>> {
        self.with_conn(|conn| {
            Collection::ALL
                .into_iter()
                .map(|collection| {
                    Ok(CollectionStats {
                        collection,
                        records: count_table(conn, collection)?,
                    })
                })
                .collect()
        })
        .await
    }
}

fn put_record<T: StoredRecord>(conn: &Connection, record: &T) -> StorageResult<i64> {
    let table = T::COLLECTION.table();
    let encoded = serde_json::to_string(record).map_err(|error| StorageError::Codec {
        collection: T::COLLECTION.name(),
        message: error.to_string(),
    })?;

    if let Some(key) = record.key() {
        let sql = format!(
            "INSERT INTO {table} (key, record) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET record = excluded.record"
        );
        conn.execute(&sql, params![key, encoded])?;
        Ok(key)
    } else {
        let sql = format!("INSERT INTO {table} (record) VALUES (?1)");
        conn.execute(&sql, params![encoded])?;
        Ok(conn.last_insert_rowid())
    }
}

fn decode<T: StoredRecord>(key: i64, record: &str) -> StorageResult<T> {
    let mut value: T = serde_json::from_str(record).map_err(|error| StorageError::Codec {
        collection: T::COLLECTION.name(),
        message: format!("key {key}: {error}"),
    })?;
    value.assign_key(key);
    Ok(value)
}

#[allow(clippy::cast_sign_loss)] // COUNT(*) is never negative
fn count_table(conn: &Connection, collection: Collection) -> StorageResult<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", collection.table());
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count as u64)
}
