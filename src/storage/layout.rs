//! On-disk naming
//!
//! `datafile_<id>.cosmo` for archived files, `activefile_<id>.cosmo` for the
//! active file.

use std::path::{Path, PathBuf};

use super::FileId;

pub(crate) const ACTIVE_FILE_PREFIX: &str = "activefile";
pub(crate) const DATA_FILE_PREFIX: &str = "datafile";
pub(crate) const FILE_EXTENSION: &str = "cosmo";

/// "activefile_7.cosmo"
pub(crate) fn active_file_name(id: FileId) -> String {
    format!("{}_{}.{}", ACTIVE_FILE_PREFIX, id, FILE_EXTENSION)
}

/// "datafile_7.cosmo"
///
/// The archive number is independent of the file_id: it only has to sort
/// after every archive already in the directory.
pub(crate) fn data_file_name(seq: u64) -> String {
    format!("{}_{}.{}", DATA_FILE_PREFIX, seq, FILE_EXTENSION)
}

/// Parse the numeric id that follows `prefix` and a `_` or `.` separator
/// "datafile_42.cosmo" → Some(42), "datafile.3" → Some(3)
pub(crate) fn parse_file_id(path: &Path, prefix: &str) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    let rest = name.strip_prefix(prefix)?;
    let rest = rest.strip_prefix('_').or_else(|| rest.strip_prefix('.'))?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Order archived files the way they were created: anything without a
/// number first (by name), then numbered files by id
pub(crate) fn sort_by_creation(paths: &mut [PathBuf], prefix: &str) {
    paths.sort_by(|a, b| {
        let key_a = parse_file_id(a, prefix);
        let key_b = parse_file_id(b, prefix);
        key_a.cmp(&key_b).then_with(|| a.cmp(b))
    });
}
