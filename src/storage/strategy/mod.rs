//! Storage Strategy
//!
//! Policy deciding when the active file rotates and how a write is staged.
//!
//! | Strategy   | Staging                   | Rotation                              |
//! |------------|---------------------------|---------------------------------------|
//! | `Basic`    | direct append             | size ≥ `max_data_file_size`, checked before the write |
//! | `Buffered` | in-memory, flushed whole  | whenever the staging buffer overflows |

mod basic;
mod buffered;

use crate::config::StrategyKind;
use crate::error::Result;

use super::{FileId, ReadResult, Storage, WriteResult};

pub use basic::BasicStrategy;
pub use buffered::BufferedStrategy;

/// Read/write policy applied by a `Storage`
pub trait StorageStrategy: Send + Sync {
    /// Read `size` bytes at `offset` of `file_id`
    fn read(&self, storage: &Storage, file_id: FileId, offset: u64, size: usize) -> ReadResult;

    /// Append `value`, rotating first if the policy says so
    fn write(&self, storage: &Storage, value: &[u8]) -> WriteResult;

    /// Push staged writes to the active file
    fn flush(&self, _storage: &Storage) -> Result<()> {
        Ok(())
    }
}

/// Build the strategy selected in the config
pub fn from_kind(kind: StrategyKind) -> Box<dyn StorageStrategy> {
    match kind {
        StrategyKind::Basic => Box::new(BasicStrategy),
        StrategyKind::Buffered { capacity } => Box::new(BufferedStrategy::new(capacity)),
    }
}
