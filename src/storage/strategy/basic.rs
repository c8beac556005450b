//! Basic strategy: direct append with threshold rotation.

use parking_lot::RwLockWriteGuard;

use crate::error::CosmoError;
use crate::storage::{FileId, ReadResult, RecordLocation, Storage, WriteResult};

use super::StorageStrategy;

/// Appends every value straight to the active file
///
/// The size check and the rotation share one exclusive section, so a
/// threshold crossing rotates exactly once. Appends run under the shared
/// side of the same lock and serialize on the file's own write lock.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicStrategy;

impl StorageStrategy for BasicStrategy {
    fn read(&self, storage: &Storage, file_id: FileId, offset: u64, size: usize) -> ReadResult {
        storage.resolve(file_id)?.read(offset, size)
    }

    fn write(&self, storage: &Storage, value: &[u8]) -> WriteResult {
        let max = storage.max_data_file_size();
        let mut active = storage.active().read();

        if active.size() >= max {
            drop(active);
            let mut exclusive = storage.active().write();

            // Another writer may have rotated while we waited
            if exclusive.size() >= max {
                let file_id = exclusive.id();
                let offset = exclusive.size();
                storage
                    .rotate(&mut exclusive)
                    .map_err(|e| CosmoError::Write {
                        file_id,
                        offset,
                        source: Box::new(e),
                    })?;
            }

            active = RwLockWriteGuard::downgrade(exclusive);
        }

        let file_id = active.id();
        let attempted = active.file().committed();

        match active.file().write(value) {
            Ok(offset) => {
                active.add_size(value.len());
                Ok(RecordLocation { file_id, offset })
            }
            Err(e) => Err(CosmoError::Write {
                file_id,
                offset: attempted,
                source: Box::new(e),
            }),
        }
    }
}
