//! Tests for directory search

use std::fs;

use cosmostore::io::{find_all, find_first};
use tempfile::TempDir;

#[test]
fn test_find_first_exact_name() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("activefile_0.cosmo"), b"").unwrap();
    fs::write(temp_dir.path().join("activefile_0.cosmo.bak"), b"").unwrap();

    let found = find_first(temp_dir.path(), "activefile_0.cosmo").unwrap();

    assert_eq!(found, Some(temp_dir.path().join("activefile_0.cosmo")));
}

#[test]
fn test_find_first_missing() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("activefile_1.cosmo"), b"").unwrap();

    let found = find_first(temp_dir.path(), "activefile_0.cosmo").unwrap();

    assert_eq!(found, None);
}

#[test]
fn test_find_first_ignores_directories() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join("activefile_0.cosmo")).unwrap();

    let found = find_first(temp_dir.path(), "activefile_0.cosmo").unwrap();

    assert_eq!(found, None);
}

#[test]
fn test_find_all_prefix_match() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["datafile.2", "datafile.1", "activefile_0.cosmo", "notes.txt"] {
        fs::write(temp_dir.path().join(name), b"").unwrap();
    }
    fs::create_dir(temp_dir.path().join("datafile_dir")).unwrap();

    let found = find_all(temp_dir.path(), "datafile").unwrap();

    assert_eq!(
        found,
        vec![
            temp_dir.path().join("datafile.1"),
            temp_dir.path().join("datafile.2"),
        ]
    );
}

#[test]
fn test_find_all_empty_directory() {
    let temp_dir = TempDir::new().unwrap();

    let found = find_all(temp_dir.path(), "datafile").unwrap();

    assert!(found.is_empty());
}

#[test]
fn test_find_all_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();

    let result = find_all(&temp_dir.path().join("missing"), "datafile");

    assert!(result.is_err());
}
