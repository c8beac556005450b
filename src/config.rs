//! Configuration for CosmoStore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{CosmoError, Result};

/// Main configuration for a storage instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the data files
    /// Internal structure:
    ///   {storage_dir}/
    ///     ├── datafile_0.cosmo     (archived, immutable)
    ///     ├── datafile_1.cosmo
    ///     └── activefile_2.cosmo   (receives all appends)
    pub storage_dir: PathBuf,

    /// Create `storage_dir` when it does not exist instead of failing
    pub create_if_missing: bool,

    /// Active file size (in bytes) at which the next write rotates
    pub max_data_file_size: u64,

    // -------------------------------------------------------------------------
    // Write Path Configuration
    // -------------------------------------------------------------------------
    /// How writes are staged and when rotation happens
    pub strategy: StrategyKind,

    /// fsync the active file after every append
    pub sync_on_write: bool,

    // -------------------------------------------------------------------------
    // Read Path Configuration
    // -------------------------------------------------------------------------
    /// Size of the scratch arena that read results are carved from (in bytes)
    pub buffer_pool_capacity: usize,
}

/// Write staging policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Append every value directly; rotate once the active file reaches
    /// `max_data_file_size`
    Basic,

    /// Accumulate values in memory; flush and rotate when `capacity` or
    /// `max_data_file_size` would be exceeded
    Buffered { capacity: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./cosmo_data"),
            create_if_missing: false,
            max_data_file_size: 100 * 1024 * 1024, // 100 MB
            strategy: StrategyKind::Basic,
            sync_on_write: false,
            buffer_pool_capacity: 64 * 1024 * 1024, // 64 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the values can back a working storage instance
    pub fn validate(&self) -> Result<()> {
        if self.max_data_file_size == 0 {
            return Err(CosmoError::Config("max_data_file_size must be > 0".into()));
        }
        if self.buffer_pool_capacity == 0 {
            return Err(CosmoError::Config("buffer_pool_capacity must be > 0".into()));
        }
        if let StrategyKind::Buffered { capacity } = self.strategy {
            if capacity == 0 {
                return Err(CosmoError::Config("buffered capacity must be > 0".into()));
            }
            // One flushed buffer has to fit in a data file
            if capacity as u64 > self.max_data_file_size {
                return Err(CosmoError::Config(format!(
                    "buffered capacity ({}) must not exceed max_data_file_size ({})",
                    capacity, self.max_data_file_size
                )));
            }
            // A read served from a full staging buffer needs one pool span
            if capacity >= self.buffer_pool_capacity {
                return Err(CosmoError::Config(format!(
                    "buffered capacity ({}) must be smaller than buffer_pool_capacity ({})",
                    capacity, self.buffer_pool_capacity
                )));
            }
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage directory
    pub fn storage_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_dir = path.into();
        self
    }

    /// Create the storage directory if it is missing
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Set the rotation threshold (in bytes)
    pub fn max_data_file_size(mut self, size: u64) -> Self {
        self.config.max_data_file_size = size;
        self
    }

    /// Set the write staging strategy
    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// fsync after every append
    pub fn sync_on_write(mut self, sync: bool) -> Self {
        self.config.sync_on_write = sync;
        self
    }

    /// Set the scratch arena size (in bytes)
    pub fn buffer_pool_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_pool_capacity = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
