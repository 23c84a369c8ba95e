use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] resto_core::Error),
    #[error(transparent)]
    Storage(#[from] resto_core::StorageError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Config file already exists at {0} (use --force to overwrite)")]
    ConfigExists(String),
    #[error("Invalid bind address '{0}'")]
    InvalidBind(String),
}
