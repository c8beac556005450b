//! Tests for ConcurrentFile
//!
//! These tests verify:
//! - Opening for append + read, and read-only archived files
//! - Append offsets and committed offset tracking
//! - Reads on both the lock-free and the locked path
//! - Short reads past end-of-file
//! - Readers running alongside a writer

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use cosmostore::io::{BufferPool, ConcurrentFile};
use cosmostore::CosmoError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_file() -> (TempDir, PathBuf, Arc<BufferPool>) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.cosmo");
    (temp_dir, path, Arc::new(BufferPool::new(1024 * 1024)))
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_file() {
    let (_temp, path, pool) = setup_temp_file();

    let file = ConcurrentFile::open(&path, pool).unwrap();

    assert!(path.exists());
    assert!(file.is_open());
    assert_eq!(file.committed(), 0);
    assert_eq!(file.path(), path);
}

#[test]
fn test_open_existing_file_starts_at_end() {
    let (_temp, path, pool) = setup_temp_file();
    fs::write(&path, b"existing").unwrap();

    let file = ConcurrentFile::open(&path, pool).unwrap();

    assert_eq!(file.committed(), 8);
    assert_eq!(file.write(b"more").unwrap(), 8);
}

#[test]
fn test_open_directory_fails() {
    let (temp, _path, pool) = setup_temp_file();

    let result = ConcurrentFile::open(temp.path(), pool);

    assert!(matches!(result, Err(CosmoError::Open { .. })));
}

#[test]
fn test_open_archived_is_read_only() {
    let (_temp, path, pool) = setup_temp_file();
    fs::write(&path, b"frozen").unwrap();

    let file = ConcurrentFile::open_archived(&path, pool).unwrap();

    assert!(!file.is_open());
    assert_eq!(file.committed(), 6);
    assert_eq!(&file.read(0, 6).unwrap()[..], b"frozen");
    assert!(matches!(file.write(b"nope"), Err(CosmoError::Sealed(_))));
}

#[test]
fn test_open_archived_missing_file_fails() {
    let (_temp, path, pool) = setup_temp_file();

    let result = ConcurrentFile::open_archived(&path, pool);

    assert!(matches!(result, Err(CosmoError::Open { .. })));
}

// =============================================================================
// Write Tests
// =============================================================================

#[test]
fn test_write_returns_start_offset() {
    let (_temp, path, pool) = setup_temp_file();
    let file = ConcurrentFile::open(&path, pool).unwrap();

    assert_eq!(file.write(b"hello").unwrap(), 0);
    assert_eq!(file.write(b"world").unwrap(), 5);
    assert_eq!(file.write(b"!").unwrap(), 10);
    assert_eq!(file.committed(), 11);
    assert_eq!(fs::read(&path).unwrap(), b"helloworld!");
}

#[test]
fn test_write_empty_value() {
    let (_temp, path, pool) = setup_temp_file();
    let file = ConcurrentFile::open(&path, pool).unwrap();

    file.write(b"abc").unwrap();
    let offset = file.write(b"").unwrap();

    assert_eq!(offset, 3);
    assert_eq!(file.committed(), 3);
}

#[test]
fn test_write_with_sync() {
    let (_temp, path, pool) = setup_temp_file();
    let file = ConcurrentFile::open(&path, pool)
        .unwrap()
        .with_sync_on_write(true);

    file.write(b"durable").unwrap();
    file.sync().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"durable");
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_read_committed_range() {
    let (_temp, path, pool) = setup_temp_file();
    let file = ConcurrentFile::open(&path, pool).unwrap();
    file.write(b"jayzprodigy").unwrap();

    // Strictly below the committed offset: lock-free path
    assert_eq!(&file.read(0, 4).unwrap()[..], b"jayz");
    // Touches the committed offset: locked path
    assert_eq!(&file.read(4, 7).unwrap()[..], b"prodigy");
}

#[test]
fn test_read_sees_bytes_written_by_another_handle() {
    let (_temp, path, pool) = setup_temp_file();
    let file = ConcurrentFile::open(&path, pool).unwrap();

    let mut external = fs::OpenOptions::new().append(true).open(&path).unwrap();
    external.write_all(b"outside").unwrap();
    drop(external);

    assert_eq!(&file.read(0, 7).unwrap()[..], b"outside");
}

#[test]
fn test_read_past_end_is_short_read() {
    let (_temp, path, pool) = setup_temp_file();
    let file = ConcurrentFile::open(&path, pool).unwrap();
    file.write(b"tiny").unwrap();

    let result = file.read(2, 10);

    match result {
        Err(CosmoError::ShortRead {
            offset,
            requested,
            available,
            ..
        }) => {
            assert_eq!(offset, 2);
            assert_eq!(requested, 10);
            assert_eq!(available, 2);
        }
        other => panic!("Expected ShortRead, got {:?}", other),
    }
}

#[test]
fn test_read_zero_bytes() {
    let (_temp, path, pool) = setup_temp_file();
    let file = ConcurrentFile::open(&path, pool).unwrap();

    let bytes = file.read(0, 0).unwrap();

    assert!(bytes.is_empty());
}

#[test]
fn test_read_larger_than_pool_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("small_pool.cosmo");
    let file = ConcurrentFile::open(&path, Arc::new(BufferPool::new(8))).unwrap();
    file.write(b"0123456789").unwrap();

    let result = file.read(0, 10);

    assert!(matches!(result, Err(CosmoError::CapacityExceeded { .. })));
}

#[test]
fn test_read_into_caller_buffer() {
    let (_temp, path, pool) = setup_temp_file();
    let file = ConcurrentFile::open(&path, pool).unwrap();
    file.write(b"gokuvegeta").unwrap();

    let mut buf = [0u8; 6];
    file.read_into(4, &mut buf).unwrap();

    assert_eq!(&buf, b"vegeta");
}

// =============================================================================
// Seal Tests
// =============================================================================

#[test]
fn test_reads_survive_rename() {
    let (temp, path, pool) = setup_temp_file();
    let file = ConcurrentFile::open(&path, pool).unwrap();
    file.write(b"renamed").unwrap();

    let new_path = temp.path().join("moved.cosmo");
    fs::rename(&path, &new_path).unwrap();

    assert_eq!(&file.read(0, 7).unwrap()[..], b"renamed");
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_readers_alongside_writer() {
    let (_temp, path, pool) = setup_temp_file();
    let file = Arc::new(ConcurrentFile::open(&path, pool).unwrap());
    const RECORDS: u64 = 2000;

    crossbeam::thread::scope(|s| {
        let writer = Arc::clone(&file);
        s.spawn(move |_| {
            for i in 0..RECORDS {
                let offset = writer.write(&i.to_le_bytes()).unwrap();
                assert_eq!(offset, i * 8);
            }
        });

        for _ in 0..4 {
            let reader = Arc::clone(&file);
            s.spawn(move |_| loop {
                let committed = reader.committed();
                if committed >= 8 {
                    let last = committed / 8 - 1;
                    let bytes = reader.read(last * 8, 8).unwrap();
                    let value = u64::from_le_bytes(bytes[..].try_into().unwrap());
                    assert_eq!(value, last);
                }
                if committed == RECORDS * 8 {
                    break;
                }
            });
        }
    })
    .unwrap();

    assert_eq!(file.committed(), RECORDS * 8);
}

#[test]
fn test_concurrent_writers_do_not_overlap() {
    let (_temp, path, pool) = setup_temp_file();
    let file = Arc::new(ConcurrentFile::open(&path, pool).unwrap());

    let mut offsets: Vec<u64> = crossbeam::thread::scope(|s| {
        let handles: Vec<_> = (0..8u8)
            .map(|t| {
                let file = Arc::clone(&file);
                s.spawn(move |_| {
                    (0..100)
                        .map(|_| file.write(&[t; 16]).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    })
    .unwrap();

    offsets.sort_unstable();
    let expected: Vec<u64> = (0..800).map(|i| i * 16).collect();
    assert_eq!(offsets, expected);

    // Every 16-byte record holds a single writer's byte
    let contents = fs::read(&path).unwrap();
    for chunk in contents.chunks(16) {
        assert!(chunk.iter().all(|&b| b == chunk[0]));
    }
}
