//! Error types for resto-core

use thiserror::Error;

/// Result type alias using resto-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in resto-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local store unavailable or migration failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Remote API unreachable, non-2xx, or malformed payload
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Requested record is absent from the routed set
    #[error("Restaurant not found: {0}")]
    NotFound(String),

    /// Malformed submission (rating out of range, empty author, ...)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Neither the local store nor the remote API could serve a read
    #[error("Data unavailable: local store failed ({storage}) and server unreachable ({transport})")]
    Unavailable {
        storage: StorageError,
        transport: TransportError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Local store failures.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Blocking store worker panicked or its lock was poisoned
    #[error("Store worker failed: {0}")]
    Worker(String),

    /// Stored record could not be encoded or decoded
    #[error("Corrupt record in '{collection}': {message}")]
    Codec {
        collection: &'static str,
        message: String,
    },

    /// Schema migration failed
    #[error("Migration to version {version} failed: {message}")]
    Migration { version: i32, message: String },

    /// Filesystem error while preparing the store
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote gateway failures. Never escapes the gateway as a panic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, DNS failure, or other network-level error
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    /// Request exceeded its timeout
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Server answered with a non-2xx status
    #[error("Server returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Malformed response body: {0}")]
    Malformed(String),
}

impl TransportError {
    /// Whether the failure means the server could not be reached at all.
    pub const fn is_offline(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout(_))
    }
}
