//! Active-file rotation and backups.
//!
//! Unbounded growth of a single JSON file degrades load/parse latency and
//! widens the blast radius of any corruption. Rotation bounds both: once
//! the active file reaches the size threshold it is archived under a
//! timestamped name and replaced with an empty database.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::atomic::write_json_atomic;
use crate::error::StoreError;
use crate::paths::StorePaths;
use crate::types::ChatDatabase;

/// Default size threshold before the active file is archived.
pub const DEFAULT_MAX_ACTIVE_BYTES: u64 = 5 * 1024 * 1024;

/// Archive the active file if it is at or over `max_bytes`.
///
/// The archive is named `chat_history.<YYYYMMDD>.json`, with a numeric
/// suffix when that name is taken (multiple rotations on one day). Returns
/// true iff a rotation occurred.
///
/// The copy happens before the reset: if the copy fails, rotation aborts
/// with the active file untouched and no data is lost.
pub fn rotate_if_needed(paths: &StorePaths, max_bytes: u64) -> Result<bool, StoreError> {
    let size = match fs::metadata(&paths.active_file) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err.into()),
    };
    if size < max_bytes {
        return Ok(false);
    }

    let stamp = Utc::now().format("%Y%m%d");
    let archive = unused_sibling(&paths.logs_dir, &format!("chat_history.{stamp}"));
    fs::copy(&paths.active_file, &archive)?;

    write_json_atomic(&paths.active_file, &ChatDatabase::default())?;
    Ok(true)
}

/// Back up the active file (when present) under
/// `chat_history.backup.<YYYYMMDD-HHMMSS>.json`, then reset it to the empty
/// database. History is never silently discarded.
///
/// Returns the backup path, or `None` when there was no active file to
/// back up.
pub fn clear_with_backup(paths: &StorePaths) -> Result<Option<PathBuf>, StoreError> {
    paths.ensure_dirs()?;

    let backup = if paths.active_file.exists() {
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let backup = unused_sibling(&paths.logs_dir, &format!("chat_history.backup.{stamp}"));
        fs::copy(&paths.active_file, &backup)?;
        Some(backup)
    } else {
        None
    };

    write_json_atomic(&paths.active_file, &ChatDatabase::default())?;
    Ok(backup)
}

/// First of `<stem>.json`, `<stem>.1.json`, `<stem>.2.json`, ... not
/// already present in `dir`.
fn unused_sibling(dir: &Path, stem: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{stem}.json"));
    let mut suffix = 1u32;
    while candidate.exists() {
        candidate = dir.join(format!("{stem}.{suffix}.json"));
        suffix += 1;
    }
    candidate
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seeded_paths(contents: &str) -> (tempfile::TempDir, StorePaths) {
        let dir = tempdir().unwrap();
        let paths = StorePaths::at(dir.path());
        paths.ensure_dirs().unwrap();
        fs::write(&paths.active_file, contents).unwrap();
        (dir, paths)
    }

    fn read_active(paths: &StorePaths) -> ChatDatabase {
        serde_json::from_str(&fs::read_to_string(&paths.active_file).unwrap()).unwrap()
    }

    #[test]
    fn below_threshold_is_a_noop() {
        let (_dir, paths) = seeded_paths("small");

        let rotated = rotate_if_needed(&paths, 1_000_000).unwrap();

        assert!(!rotated);
        assert_eq!(fs::read_to_string(&paths.active_file).unwrap(), "small");
    }

    #[test]
    fn missing_active_file_is_a_noop() {
        let dir = tempdir().unwrap();
        let paths = StorePaths::at(dir.path());

        assert!(!rotate_if_needed(&paths, 0).unwrap());
    }

    #[test]
    fn at_threshold_archives_and_resets() {
        let payload = r#"{"version":1,"conversations":[]}"#;
        let (_dir, paths) = seeded_paths(payload);

        let rotated = rotate_if_needed(&paths, payload.len() as u64).unwrap();

        assert!(rotated);
        let stamp = Utc::now().format("%Y%m%d");
        let archive = paths.logs_dir.join(format!("chat_history.{stamp}.json"));
        assert_eq!(fs::read_to_string(&archive).unwrap(), payload);
        assert_eq!(read_active(&paths), ChatDatabase::default());
    }

    #[test]
    fn same_day_rotations_get_numeric_suffixes() {
        let (_dir, paths) = seeded_paths("0123456789");
        assert!(rotate_if_needed(&paths, 1).unwrap());

        fs::write(&paths.active_file, "9876543210").unwrap();
        assert!(rotate_if_needed(&paths, 1).unwrap());

        let stamp = Utc::now().format("%Y%m%d");
        let first = paths.logs_dir.join(format!("chat_history.{stamp}.json"));
        let second = paths.logs_dir.join(format!("chat_history.{stamp}.1.json"));
        assert_eq!(fs::read_to_string(first).unwrap(), "0123456789");
        assert_eq!(fs::read_to_string(second).unwrap(), "9876543210");
    }

    #[test]
    fn clear_backs_up_before_reset() {
        let (_dir, paths) = seeded_paths("history");

        let backup = clear_with_backup(&paths).unwrap().expect("backup path");

        assert_eq!(fs::read_to_string(&backup).unwrap(), "history");
        assert_eq!(read_active(&paths), ChatDatabase::default());
    }

    #[test]
    fn clear_twice_backs_up_the_empty_database_too() {
        let (_dir, paths) = seeded_paths("history");

        let first = clear_with_backup(&paths).unwrap().expect("first backup");
        let second = clear_with_backup(&paths).unwrap().expect("second backup");

        assert_ne!(first, second);
        let parsed: ChatDatabase =
            serde_json::from_str(&fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(parsed, ChatDatabase::default());
        assert_eq!(read_active(&paths), ChatDatabase::default());
    }

    #[test]
    fn clear_without_active_file_still_resets() {
        let dir = tempdir().unwrap();
        let paths = StorePaths::at(dir.path());

        let backup = clear_with_backup(&paths).unwrap();

        assert!(backup.is_none());
        assert_eq!(read_active(&paths), ChatDatabase::default());
    }
}
