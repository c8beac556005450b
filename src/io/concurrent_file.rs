//! Concurrent File
//!
//! One on-disk file shared by many readers and one logical writer.
//!
//! ## Handles
//! - **Write handle**: opened for append, guarded by an `RwLock`. Writers
//!   take it exclusively; readers of not-yet-committed ranges take it shared.
//! - **Read handle**: a separate read-only descriptor used with positional
//!   reads, so readers never share a file cursor.
//!
//! ## Read Paths
//! ```text
//! offset + size < committed ──► positional read, no lock
//! otherwise                 ──► shared lock on write handle, positional read
//! ```
//! Bytes below `committed` were written before the read began and are never
//! rewritten, so the fast path cannot observe a torn append.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use crossbeam::utils::CachePadded;
use parking_lot::RwLock;

use crate::error::{CosmoError, Result};

use super::BufferPool;

/// Append-only file with a lock-free read path for committed bytes
pub struct ConcurrentFile {
    /// Current location on disk (changes when the file is archived)
    path: RwLock<PathBuf>,

    /// Independent read-only descriptor for positional reads
    reader: File,

    /// Append handle; `None` once the file is sealed
    writer: RwLock<Option<WriteHandle>>,

    /// Logical end of the last completed write
    committed: CachePadded<AtomicU64>,

    /// Scratch memory for read results
    pool: Arc<BufferPool>,

    /// fsync after every append
    sync_on_write: bool,
}

struct WriteHandle {
    file: File,
    /// Next append offset
    end: u64,
}

impl ConcurrentFile {
    /// Open (or create) a file for append + read
    pub fn open(path: &Path, pool: Arc<BufferPool>) -> Result<Self> {
        let file = open_for_append(path)?;
        let end = file.metadata()?.len();
        let reader = open_for_read(path)?;

        Ok(Self {
            path: RwLock::new(path.to_path_buf()),
            reader,
            writer: RwLock::new(Some(WriteHandle { file, end })),
            committed: CachePadded::new(AtomicU64::new(end)),
            pool,
            sync_on_write: false,
        })
    }

    /// Open an existing file read-only (already archived)
    pub fn open_archived(path: &Path, pool: Arc<BufferPool>) -> Result<Self> {
        let reader = open_for_read(path)?;
        let len = reader.metadata()?.len();

        Ok(Self {
            path: RwLock::new(path.to_path_buf()),
            reader,
            writer: RwLock::new(None),
            committed: CachePadded::new(AtomicU64::new(len)),
            pool,
            sync_on_write: false,
        })
    }

    /// fsync after every append
    pub fn with_sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    /// Append `bytes`, returning the offset the write began at
    pub fn write(&self, bytes: &[u8]) -> Result<u64> {
        let mut guard = self.writer.write();
        let handle = match guard.as_mut() {
            Some(handle) => handle,
            None => return Err(CosmoError::Sealed(self.path())),
        };

        let offset = handle.end;

        if let Err(e) = Self::append(&mut handle.file, bytes, self.sync_on_write) {
            // Part of the value may have landed; resync the logical end
            if let Ok(metadata) = handle.file.metadata() {
                handle.end = metadata.len();
                self.committed.store(handle.end, Ordering::Release);
            }
            tracing::warn!(path = %self.path().display(), offset, "append failed: {}", e);
            return Err(e.into());
        }

        handle.end += bytes.len() as u64;
        self.committed.store(handle.end, Ordering::Release);

        Ok(offset)
    }

    /// Read `size` bytes at `offset` into a span from the buffer pool
    pub fn read(&self, offset: u64, size: usize) -> Result<Bytes> {
        let mut span = self.pool.reserve(size)?;
        self.read_into(offset, &mut span[..size])?;
        span.truncate(size);
        Ok(span.freeze())
    }

    /// Fill `buf` with the bytes starting at `offset`
    ///
    /// Fails with `ShortRead` when the file ends before `buf` is full.
    pub fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let end = offset.saturating_add(buf.len() as u64);

        if end < self.committed.load(Ordering::Acquire) {
            return self.read_at(offset, buf);
        }

        let _guard = self.writer.read();
        tracing::trace!(offset, size = buf.len(), "read overlaps the write frontier");
        self.read_at(offset, buf)
    }

    /// fsync the write handle (no-op once sealed)
    pub fn sync(&self) -> Result<()> {
        if let Some(handle) = self.writer.read().as_ref() {
            handle.file.sync_data()?;
        }
        Ok(())
    }

    /// Logical end offset of the last completed write
    pub fn committed(&self) -> u64 {
        self.committed.load(Ordering::Acquire)
    }

    /// Whether the file still accepts writes
    pub fn is_open(&self) -> bool {
        self.writer.read().is_some()
    }

    /// Current path on disk
    pub fn path(&self) -> PathBuf {
        self.path.read().clone()
    }

    // =========================================================================
    // Rotation Support
    // =========================================================================

    /// Sync and close the write handle; reads keep working
    pub(crate) fn seal(&self) -> Result<()> {
        let mut guard = self.writer.write();
        if let Some(handle) = guard.as_ref() {
            handle.file.sync_all()?;
        }
        *guard = None;
        Ok(())
    }

    /// Reopen the write handle at the current path
    pub(crate) fn unseal(&self) -> Result<()> {
        let mut guard = self.writer.write();
        if guard.is_none() {
            let file = open_for_append(&self.path())?;
            let end = file.metadata()?.len();
            self.committed.store(end, Ordering::Release);
            *guard = Some(WriteHandle { file, end });
        }
        Ok(())
    }

    /// Record a rename performed by the owner
    pub(crate) fn set_path(&self, path: PathBuf) {
        *self.path.write() = path;
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn append(file: &mut File, bytes: &[u8], sync: bool) -> io::Result<()> {
        file.write_all(bytes)?;
        if sync {
            file.sync_data()?;
        }
        Ok(())
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;

        while filled < buf.len() {
            match positional_read(&self.reader, &mut buf[filled..], offset + filled as u64) {
                Ok(0) => {
                    return Err(CosmoError::ShortRead {
                        path: self.path(),
                        offset,
                        requested: buf.len(),
                        available: filled,
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for ConcurrentFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentFile")
            .field("path", &self.path())
            .field("committed", &self.committed())
            .field("open", &self.is_open())
            .finish()
    }
}

fn open_for_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .read(true)
        .open(path)
        .map_err(|source| CosmoError::Open {
            path: path.to_path_buf(),
            source,
        })
}

fn open_for_read(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| CosmoError::Open {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn positional_read(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn positional_read(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}
