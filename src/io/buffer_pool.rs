//! Buffer Pool
//!
//! Fixed-capacity scratch arena that read results are carved from.
//!
//! ## Layout
//! ```text
//! ┌──────────────┬───┬──────────────┬───┬─────────────────────────┐
//! │ span 1       │ 0 │ span 2       │ 0 │ free ...                │
//! └──────────────┴───┴──────────────┴───┴─────────────────────────┘
//!                                        ▲ cursor
//! ```
//!
//! Every reservation is followed by a zero sentinel byte. When a request
//! does not fit between the cursor and the end of the arena, the cursor
//! wraps to 0 and the arena memory is reclaimed.
//!
//! ## Reuse
//! Spans are `BytesMut` views into the arena allocation. Wrapping reclaims
//! the allocation only once every span handed out before the wrap has been
//! dropped; while any of them is still alive the pool moves to a fresh
//! allocation instead of overwriting it. Callers that drop (or copy out of)
//! their buffers promptly get allocation-free reads.

use bytes::BytesMut;
use parking_lot::Mutex;

use crate::error::{CosmoError, Result};

/// Reusable byte arena for read results
pub struct BufferPool {
    /// Total arena size in bytes
    capacity: usize,

    /// Reservation bookkeeping (the copy into a span happens outside)
    arena: Mutex<Arena>,
}

struct Arena {
    /// Unreserved tail of the current arena allocation
    chunk: BytesMut,

    /// Bytes reserved since the last wrap
    cursor: usize,

    /// Number of times the cursor went back to 0
    wraps: u64,
}

impl BufferPool {
    /// Create a pool backed by a single `capacity`-byte allocation
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            arena: Mutex::new(Arena {
                chunk: BytesMut::with_capacity(capacity),
                cursor: 0,
                wraps: 0,
            }),
        }
    }

    /// Reserve a zeroed span of `size + 1` bytes
    ///
    /// The last byte of the returned span is the sentinel terminator.
    /// Fails with `CapacityExceeded` when the span can never fit.
    pub fn reserve(&self, size: usize) -> Result<BytesMut> {
        let span_len = size
            .checked_add(1)
            .filter(|&len| len <= self.capacity)
            .ok_or(CosmoError::CapacityExceeded {
                requested: size,
                capacity: self.capacity,
            })?;

        let mut arena = self.arena.lock();

        if arena.chunk.capacity() < span_len {
            arena.chunk.clear();
            arena.chunk.reserve(self.capacity);
            arena.cursor = 0;
            arena.wraps += 1;
            tracing::trace!(wraps = arena.wraps, "buffer pool wrapped");
        }

        arena.chunk.resize(span_len, 0);
        arena.chunk[size] = 0;
        let span = arena.chunk.split_to(span_len);
        arena.cursor += span_len;

        Ok(span)
    }

    /// Total arena size in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes reserved since the last wrap (sentinels included)
    pub fn cursor(&self) -> usize {
        self.arena.lock().cursor
    }

    /// Number of wraps so far
    pub fn wraps(&self) -> u64 {
        self.arena.lock().wraps
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let arena = self.arena.lock();
        f.debug_struct("BufferPool")
            .field("capacity", &self.capacity)
            .field("cursor", &arena.cursor)
            .field("wraps", &arena.wraps)
            .finish()
    }
}
