//! Error types for CosmoStore
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::FileId;

/// Result type alias using CosmoError
pub type Result<T> = std::result::Result<T, CosmoError>;

/// Unified error type for CosmoStore operations
#[derive(Debug, Error)]
pub enum CosmoError {
    // -------------------------------------------------------------------------
    // Construction Errors
    // -------------------------------------------------------------------------
    #[error("Invalid storage directory: {} does not exist or is not a directory", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Write to file {file_id} at offset {offset} failed: {source}")]
    Write {
        file_id: FileId,
        offset: u64,
        #[source]
        source: Box<CosmoError>,
    },

    #[error(
        "Short read from {} at offset {offset}: requested {requested} bytes, only {available} available",
        path.display()
    )]
    ShortRead {
        path: PathBuf,
        offset: u64,
        requested: usize,
        available: usize,
    },

    #[error("File {} is archived and no longer accepts writes", .0.display())]
    Sealed(PathBuf),

    // -------------------------------------------------------------------------
    // Addressing Errors
    // -------------------------------------------------------------------------
    #[error("File id {file_id} is out of range (active file id is {active_id})")]
    OutOfRange { file_id: FileId, active_id: FileId },

    #[error("Requested {requested} bytes exceeds capacity of {capacity} bytes")]
    CapacityExceeded { requested: usize, capacity: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
