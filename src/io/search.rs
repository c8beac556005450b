//! Directory Search
//!
//! The two directory queries storage needs at open time.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Find the regular file named exactly `name` in `directory`
pub fn find_first(directory: &Path, name: &str) -> Result<Option<PathBuf>> {
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if entry.file_type()?.is_file() && entry.file_name().to_str() == Some(name) {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

/// Find every regular file in `directory` whose name starts with `prefix`
///
/// Results are sorted by file name.
pub fn find_all(directory: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.starts_with(prefix));
        if matches {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}
