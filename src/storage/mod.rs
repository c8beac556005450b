//! Storage Module
//!
//! Log-structured storage over a directory of data files.
//!
//! ## Responsibilities
//! - Discover archived data files on startup
//! - Own the single active file that receives every append
//! - Rotate the active file into the archive once it is full
//! - Dispatch reads and writes through the configured strategy
//!
//! ## Directory Layout
//! ```text
//! {storage_dir}/
//!   ├── datafile_0.cosmo      file_id 0  (archived, immutable)
//!   ├── datafile_1.cosmo      file_id 1  (archived, immutable)
//!   └── activefile_2.cosmo    file_id 2  (active)
//! ```
//!
//! Files carry no header or index; record boundaries belong to the caller,
//! who addresses a record by `(file_id, offset, length)`.

mod layout;
mod store;
pub mod strategy;

use bytes::Bytes;

use crate::error::Result;

pub use store::{ActiveFile, Storage};
pub use strategy::{BasicStrategy, BufferedStrategy, StorageStrategy};

/// Index of a data file within a storage directory
pub type FileId = u32;

/// Where a write landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordLocation {
    /// File the value was appended to
    pub file_id: FileId,
    /// Byte offset of the first byte of the value
    pub offset: u64,
}

/// Outcome of a read: the requested bytes, or why they could not be read
pub type ReadResult = Result<Bytes>;

/// Outcome of a write: where the value landed, or why it did not
pub type WriteResult = Result<RecordLocation>;
