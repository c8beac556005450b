//! IO Module
//!
//! Filesystem boundary of the engine.
//!
//! ## Responsibilities
//! - Byte-level append and positional read on a single file
//! - Scratch memory for read results
//! - Directory queries used when a storage directory is opened
//!
//! Every filesystem failure is turned into a `CosmoError` here; nothing
//! below this layer panics on I/O.

mod buffer_pool;
mod concurrent_file;
mod search;

pub use buffer_pool::BufferPool;
pub use concurrent_file::ConcurrentFile;
pub use search::{find_all, find_first};
