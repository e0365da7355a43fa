//! Atomic JSON file writes.
//!
//! # Atomic Write Strategy
//!
//! 1. Serialize to pretty JSON
//! 2. Write to `<target>.tmp`
//! 3. Rename onto `<target>`
//!
//! A reader of the target at any instant sees either the previous complete
//! document or the new complete document, never a truncated one. Rename is
//! atomic for same-volume renames on all supported platforms; a failed
//! rename is fatal rather than falling back to a non-atomic copy.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::StoreError;

/// Scoped temp-file cleanup: unlinks the temp file on drop unless the
/// rename took ownership of it.
struct TempGuard {
    path: PathBuf,
    armed: bool,
}

impl TempGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write `value` as pretty-printed JSON to `target`, atomically.
///
/// On any failure the target is left untouched and the temp file is removed
/// best-effort.
pub fn write_json_atomic<T: Serialize>(target: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value)?;

    let temp = temp_path(target);
    let mut guard = TempGuard::new(temp.clone());

    fs::write(&temp, json)?;
    fs::rename(&temp, target)?;
    guard.disarm();

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
