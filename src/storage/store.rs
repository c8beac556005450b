//! Storage
//!
//! Owns the archive, the active file and the strategy that writes to them.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::utils::CachePadded;
use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{CosmoError, Result};
use crate::io::{self, BufferPool, ConcurrentFile};

use super::layout::{self, ACTIVE_FILE_PREFIX, DATA_FILE_PREFIX};
use super::strategy::{self, StorageStrategy};
use super::{FileId, ReadResult, WriteResult};

/// The file currently receiving writes
pub struct ActiveFile {
    /// The file_id reads must use for records written here
    id: FileId,

    /// Shared so in-flight reads survive rotation
    file: Arc<ConcurrentFile>,

    /// Number used in the archive name once this file rotates out
    archive_seq: u64,

    /// Bytes written since creation (atomic: writers add under a shared lock)
    size: CachePadded<AtomicU64>,
}

impl ActiveFile {
    fn new(id: FileId, archive_seq: u64, file: ConcurrentFile) -> Self {
        let size = file.committed();
        Self {
            id,
            file: Arc::new(file),
            archive_seq,
            size: CachePadded::new(AtomicU64::new(size)),
        }
    }

    /// File id of the active file
    pub fn id(&self) -> FileId {
        self.id
    }

    /// Handle to the active file
    pub fn file(&self) -> &Arc<ConcurrentFile> {
        &self.file
    }

    /// Bytes written to the active file
    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    pub(crate) fn add_size(&self, bytes: usize) {
        self.size.fetch_add(bytes as u64, Ordering::AcqRel);
    }
}

/// Log-structured storage over one directory
///
/// ## Concurrency:
/// - `active`: RwLock guarding rotation. Writers append under the shared
///   lock; rotation takes it exclusively, so no append is in flight while
///   the active file is swapped.
/// - `data_files`: RwLock over an append-only Vec; lock order is always
///   `active` → `data_files`.
/// - Reads only hold a lock long enough to resolve the file, then read
///   through the `Arc<ConcurrentFile>`.
pub struct Storage {
    /// Directory holding every data file
    storage_dir: PathBuf,

    /// Rotation threshold in bytes
    max_data_file_size: u64,

    /// fsync after every append (applied to each new active file)
    sync_on_write: bool,

    /// Archived files; index == file_id
    data_files: RwLock<Vec<Arc<ConcurrentFile>>>,

    /// The active file slot
    active: RwLock<ActiveFile>,

    /// Scratch memory shared by every file's reads
    pool: Arc<BufferPool>,

    /// Rotation timing and write staging
    strategy: Box<dyn StorageStrategy>,
}

impl Storage {
    /// Open a storage directory using the config's pool size and strategy
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let pool = Arc::new(BufferPool::new(config.buffer_pool_capacity));
        let strategy = strategy::from_kind(config.strategy);
        Self::open_with(config, pool, strategy)
    }

    /// Open with default config for the given directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().storage_dir(path).build())
    }

    /// Open with default config and a custom rotation threshold
    pub fn open_with_max_size(path: &Path, max_data_file_size: u64) -> Result<Self> {
        Self::open(
            Config::builder()
                .storage_dir(path)
                .max_data_file_size(max_data_file_size)
                .build(),
        )
    }

    /// Open with an explicitly owned buffer pool and strategy
    ///
    /// On startup:
    /// 1. Validate the directory
    /// 2. Discover archived data files (index = file_id)
    /// 3. Derive the active id as the archive count
    /// 4. Open or resume the active file, sizing it from disk
    pub fn open_with(
        config: Config,
        pool: Arc<BufferPool>,
        strategy: Box<dyn StorageStrategy>,
    ) -> Result<Self> {
        config.validate()?;
        let storage_dir = config.storage_dir.clone();

        // Step 1: Directory must exist (or be creatable when asked)
        if !storage_dir.is_dir() {
            if config.create_if_missing && !storage_dir.exists() {
                fs::create_dir_all(&storage_dir)?;
            } else {
                return Err(CosmoError::InvalidDirectory(storage_dir));
            }
        }

        // Step 2: Discover archived files in creation order
        let mut archived = io::find_all(&storage_dir, DATA_FILE_PREFIX)?;
        layout::sort_by_creation(&mut archived, DATA_FILE_PREFIX);

        let data_files = archived
            .iter()
            .map(|path| ConcurrentFile::open_archived(path, Arc::clone(&pool)).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        // New archives are numbered past every existing one so they sort last
        let archive_seq = archived
            .iter()
            .filter_map(|path| layout::parse_file_id(path, DATA_FILE_PREFIX))
            .max()
            .map_or(Some(0), |n| n.checked_add(1))
            .ok_or_else(|| CosmoError::Config("archive numbering exhausted".into()))?;

        // Step 3: Active id follows the archive
        let active_id = FileId::try_from(data_files.len()).map_err(|_| {
            CosmoError::Config(format!("too many data files: {}", data_files.len()))
        })?;
        let active_name = layout::active_file_name(active_id);

        for stray in io::find_all(&storage_dir, ACTIVE_FILE_PREFIX)? {
            if stray.file_name().and_then(|n| n.to_str()) != Some(active_name.as_str()) {
                tracing::warn!(
                    path = %stray.display(),
                    expected = %active_name,
                    "ignoring active file image that does not match the archive"
                );
            }
        }

        // Step 4: Resume or create the active file
        let resumed = io::find_first(&storage_dir, &active_name)?.is_some();
        let active_path = storage_dir.join(&active_name);
        let file = ConcurrentFile::open(&active_path, Arc::clone(&pool))?
            .with_sync_on_write(config.sync_on_write);
        let active = ActiveFile::new(active_id, archive_seq, file);

        tracing::info!(
            dir = %storage_dir.display(),
            archived = data_files.len(),
            active_id,
            active_size = active.size(),
            resumed,
            "storage opened"
        );

        Ok(Self {
            storage_dir,
            max_data_file_size: config.max_data_file_size,
            sync_on_write: config.sync_on_write,
            data_files: RwLock::new(data_files),
            active: RwLock::new(active),
            pool,
            strategy,
        })
    }

    /// Read `size` bytes at `offset` of `file_id`
    pub fn read(&self, file_id: FileId, offset: u64, size: usize) -> ReadResult {
        self.strategy.read(self, file_id, offset, size)
    }

    /// Append `value`, returning where it landed
    pub fn write(&self, value: &[u8]) -> WriteResult {
        self.strategy.write(self, value)
    }

    /// Push any staged writes to the active file
    pub fn flush(&self) -> Result<()> {
        self.strategy.flush(self)
    }

    /// fsync the active file
    pub fn sync(&self) -> Result<()> {
        let file = Arc::clone(self.active.read().file());
        file.sync()
    }

    /// Flush staged writes and sync before releasing the directory
    pub fn close(self) -> Result<()> {
        self.flush()?;
        self.sync()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Directory this storage lives in
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Paths of the archived files, indexed by file_id
    pub fn data_files(&self) -> Vec<PathBuf> {
        self.data_files.read().iter().map(|f| f.path()).collect()
    }

    /// Number of archived files
    pub fn data_file_count(&self) -> usize {
        self.data_files.read().len()
    }

    /// File id of the active file
    pub fn active_file_id(&self) -> FileId {
        self.active.read().id()
    }

    /// Bytes written to the active file
    pub fn active_file_size(&self) -> u64 {
        self.active.read().size()
    }

    /// Path of the active file
    pub fn active_file_path(&self) -> PathBuf {
        self.active.read().file().path()
    }

    /// Whether the active file accepts writes
    pub fn is_active_file_open(&self) -> bool {
        self.active.read().file().is_open()
    }

    /// Rotation threshold in bytes
    pub fn max_data_file_size(&self) -> u64 {
        self.max_data_file_size
    }

    /// Scratch memory used for reads
    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    // =========================================================================
    // Strategy Support
    // =========================================================================

    /// The active slot and its rotation lock
    pub(crate) fn active(&self) -> &RwLock<ActiveFile> {
        &self.active
    }

    /// Find the file backing `file_id` (active or archived)
    pub(crate) fn resolve(&self, file_id: FileId) -> Result<Arc<ConcurrentFile>> {
        let active = self.active.read();

        if file_id == active.id() {
            return Ok(Arc::clone(active.file()));
        }

        let out_of_range = CosmoError::OutOfRange {
            file_id,
            active_id: active.id(),
        };
        if file_id > active.id() {
            return Err(out_of_range);
        }

        self.data_files
            .read()
            .get(file_id as usize)
            .cloned()
            .ok_or(out_of_range)
    }

    /// Archive the active file and open its successor
    ///
    /// Caller holds the exclusive rotation lock. The sequence is
    /// close → rename → reopen; a failed rename or reopen restores the old
    /// active file before returning the error. The archive name never
    /// replaces an existing file.
    pub(crate) fn rotate(&self, active: &mut ActiveFile) -> Result<()> {
        let old = Arc::clone(active.file());
        let old_path = old.path();
        let archived_path = self
            .storage_dir
            .join(layout::data_file_name(active.archive_seq));
        let next_id = active
            .id
            .checked_add(1)
            .ok_or_else(|| CosmoError::Config("file id space exhausted".into()))?;
        let next_path = self.storage_dir.join(layout::active_file_name(next_id));

        if archived_path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("archive {} already exists", archived_path.display()),
            )
            .into());
        }

        // Step 1: Close the write handle (read handle stays open)
        old.seal()?;

        // Step 2: Rename into the archive
        if let Err(e) = fs::rename(&old_path, &archived_path) {
            tracing::warn!(from = %old_path.display(), "rotation rename failed: {}", e);
            old.unseal()?;
            return Err(e.into());
        }
        old.set_path(archived_path.clone());

        // Step 3: Open the next active file
        let next = match ConcurrentFile::open(&next_path, Arc::clone(&self.pool)) {
            Ok(file) => file.with_sync_on_write(self.sync_on_write),
            Err(e) => {
                tracing::warn!(path = %next_path.display(), "rotation reopen failed: {}", e);
                match fs::rename(&archived_path, &old_path) {
                    Ok(()) => old.set_path(old_path),
                    // Keep appending under the archive name rather than stay sealed
                    Err(undo) => tracing::error!(
                        path = %archived_path.display(),
                        "could not restore active file name: {}",
                        undo
                    ),
                }
                old.unseal()?;
                return Err(e);
            }
        };

        self.data_files.write().push(old);
        let archived_id = active.id;
        let archive_seq = active.archive_seq.saturating_add(1);
        *active = ActiveFile::new(next_id, archive_seq, next);

        tracing::debug!(
            archived_id,
            archive = %archived_path.display(),
            active_id = next_id,
            "rotated active file"
        );
        Ok(())
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        if let Err(e) = self.strategy.flush(self) {
            tracing::warn!(dir = %self.storage_dir.display(), "flush on drop failed: {}", e);
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("storage_dir", &self.storage_dir)
            .field("max_data_file_size", &self.max_data_file_size)
            .field("data_files", &self.data_file_count())
            .field("active_file_id", &self.active_file_id())
            .field("active_file_size", &self.active_file_size())
            .finish()
    }
}
