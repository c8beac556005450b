//! # CosmoStore
//!
//! A log-structured, append-only storage engine with:
//! - One mutable active file receiving every append
//! - Immutable archived data files produced by rotation
//! - Pluggable write staging (direct or buffered)
//! - Lock-free reads of already committed bytes
//!
//! Records are addressed by `(file_id, offset, length)`; the engine keeps
//! no index and no per-record header.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Storage                              │
//! │         (archive registry, active slot, rotation)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  StorageStrategy                             │
//! │              (Basic / Buffered)                              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌──────────────┐          ┌─────────────┐
//!   │ConcurrentFile│─────────►│ BufferPool  │
//!   │(1 writer, N  │  read    │  (scratch)  │
//!   │  readers)    │  spans   └─────────────┘
//!   └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod io;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CosmoError, Result};
pub use config::{Config, StrategyKind};
pub use io::{BufferPool, ConcurrentFile};
pub use storage::{FileId, ReadResult, RecordLocation, Storage, WriteResult};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of CosmoStore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
