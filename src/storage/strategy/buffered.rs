//! Buffered strategy: write-combining in memory.
//!
//! Values accumulate in a staging buffer. When the next value would not
//! fit, or flushing it would push the active file past
//! `max_data_file_size`, the whole buffer goes to the active file in one
//! append and the active file rotates.
//!
//! Returned offsets are final file offsets (flushed bytes + position in the
//! buffer), and reads of the active file see staged bytes.

use bytes::BytesMut;
use parking_lot::{Mutex, RwLockWriteGuard};

use crate::error::{CosmoError, Result};
use crate::storage::{ActiveFile, FileId, ReadResult, RecordLocation, Storage, WriteResult};

use super::StorageStrategy;

/// Stages writes in memory and flushes them in bulk
///
/// Lock order: `buffer` → the storage's rotation lock.
pub struct BufferedStrategy {
    /// Maximum staged bytes
    capacity: usize,

    /// Staged bytes not yet on disk
    buffer: Mutex<BytesMut>,
}

impl BufferedStrategy {
    /// Create a strategy staging up to `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: Mutex::new(BytesMut::with_capacity(capacity)),
        }
    }

    /// Maximum staged bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently staged
    pub fn staged(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Append the staged bytes to the active file and clear the buffer
    fn flush_staged(active: &ActiveFile, buffer: &mut BytesMut) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        let file_id = active.id();
        let attempted = active.file().committed();

        active
            .file()
            .write(&buffer[..])
            .map_err(|e| CosmoError::Write {
                file_id,
                offset: attempted,
                source: Box::new(e),
            })?;
        active.add_size(buffer.len());

        tracing::debug!(file_id, bytes = buffer.len(), "flushed staged writes");
        buffer.clear();
        Ok(())
    }
}

impl StorageStrategy for BufferedStrategy {
    fn read(&self, storage: &Storage, file_id: FileId, offset: u64, size: usize) -> ReadResult {
        let end = offset.saturating_add(size as u64);

        // Archived files and flushed ranges never involve the buffer
        {
            let active = storage.active().read();
            if file_id != active.id() || end <= active.size() {
                drop(active);
                return storage.resolve(file_id)?.read(offset, size);
            }
        }

        let buffer = self.buffer.lock();
        let active = storage.active().read();

        // Rotated or flushed while we took the buffer lock
        if file_id != active.id() || end <= active.size() {
            drop(active);
            drop(buffer);
            return storage.resolve(file_id)?.read(offset, size);
        }

        let flushed = active.size();
        let staged_end = flushed + buffer.len() as u64;
        if end > staged_end {
            return Err(CosmoError::ShortRead {
                path: active.file().path(),
                offset,
                requested: size,
                available: staged_end.saturating_sub(offset) as usize,
            });
        }

        let mut span = storage.buffer_pool().reserve(size)?;

        // Leading part may already be on disk
        let from_file = flushed.saturating_sub(offset) as usize;
        if from_file > 0 {
            active.file().read_into(offset, &mut span[..from_file])?;
        }

        let start = (offset + from_file as u64 - flushed) as usize;
        let from_buffer = size - from_file;
        span[from_file..size].copy_from_slice(&buffer[start..start + from_buffer]);

        span.truncate(size);
        Ok(span.freeze())
    }

    fn write(&self, storage: &Storage, value: &[u8]) -> WriteResult {
        if value.len() > self.capacity {
            return Err(CosmoError::CapacityExceeded {
                requested: value.len(),
                capacity: self.capacity,
            });
        }

        let mut buffer = self.buffer.lock();
        let pending = (buffer.len() + value.len()) as u64;

        let full = {
            let active = storage.active().read();
            buffer.len() + value.len() > self.capacity
                || active.size() + pending > storage.max_data_file_size()
        };

        let active = if full {
            let mut exclusive = storage.active().write();

            Self::flush_staged(&exclusive, &mut buffer)?;

            let file_id = exclusive.id();
            let offset = exclusive.size();
            storage
                .rotate(&mut exclusive)
                .map_err(|e| CosmoError::Write {
                    file_id,
                    offset,
                    source: Box::new(e),
                })?;

            RwLockWriteGuard::downgrade(exclusive)
        } else {
            storage.active().read()
        };

        let location = RecordLocation {
            file_id: active.id(),
            offset: active.size() + buffer.len() as u64,
        };
        buffer.extend_from_slice(value);

        Ok(location)
    }

    fn flush(&self, storage: &Storage) -> Result<()> {
        let mut buffer = self.buffer.lock();
        let active = storage.active().read();
        Self::flush_staged(&active, &mut buffer)
    }
}

impl std::fmt::Debug for BufferedStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedStrategy")
            .field("capacity", &self.capacity)
            .field("staged", &self.staged())
            .finish()
    }
}
