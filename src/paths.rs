//! On-disk layout resolution.
//!
//! # File Locations
//!
//! All data lives under a vendor/app directory in the platform's per-user
//! application-data location:
//!
//! ```text
//! <app-data-root>/MotionWorks/ChatVault/
//! ├── settings.json                        # panel settings (not this crate)
//! └── ChatLogs/
//!     ├── chat_history.json                # active file
//!     ├── chat_history.<YYYYMMDD>.json     # rotation archives
//!     └── chat_history.backup.<stamp>.json # clear_all backups
//! ```
//!
//! Resolution is pure computation; [`StorePaths::ensure_dirs`] is the only
//! side-effecting operation.

use std::env;
use std::io;
use std::path::PathBuf;

use crate::error::StoreError;

const VENDOR_DIR: &str = "MotionWorks";
const APP_DIR: &str = "ChatVault";
const LOGS_DIR: &str = "ChatLogs";
const ACTIVE_FILE: &str = "chat_history.json";
const SETTINGS_FILE: &str = "settings.json";

/// OS family, selected once at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Per-user application-data root for this OS family.
    ///
    /// Uses APPDATA (roaming) on Windows with a USERPROFILE fallback,
    /// `~/Library/Application Support` on macOS, and XDG_CONFIG_HOME with a
    /// `~/.config` fallback elsewhere.
    fn app_data_root(self) -> Result<PathBuf, StoreError> {
        match self {
            Platform::Windows => {
                if let Some(appdata) = non_empty_var("APPDATA") {
                    return Ok(PathBuf::from(appdata));
                }
                if let Some(profile) = non_empty_var("USERPROFILE") {
                    return Ok(PathBuf::from(profile).join("AppData").join("Roaming"));
                }
                Err(StoreError::DataDirUnset("APPDATA"))
            }
            Platform::MacOs => non_empty_var("HOME")
                .map(|home| {
                    PathBuf::from(home)
                        .join("Library")
                        .join("Application Support")
                })
                .ok_or(StoreError::DataDirUnset("HOME")),
            Platform::Linux => {
                if let Some(xdg) = non_empty_var("XDG_CONFIG_HOME") {
                    return Ok(PathBuf::from(xdg));
                }
                non_empty_var("HOME")
                    .map(|home| PathBuf::from(home).join(".config"))
                    .ok_or(StoreError::DataDirUnset("HOME"))
            }
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

/// The fixed tuple of paths the store operates on.
#[derive(Debug, Clone)]
pub struct StorePaths {
    /// Vendor/app-scoped base directory.
    pub base: PathBuf,

    /// `base/ChatLogs` — active file plus archives.
    pub logs_dir: PathBuf,

    /// `logs_dir/chat_history.json` — the file accepting new writes.
    pub active_file: PathBuf,

    /// `base/settings.json` — adjacent, not managed by this crate.
    pub settings_file: PathBuf,
}

impl StorePaths {
    /// Resolve the standard layout for the given platform.
    pub fn resolve(platform: Platform) -> Result<Self, StoreError> {
        let base = platform.app_data_root()?.join(VENDOR_DIR).join(APP_DIR);
        Ok(Self::at(base))
    }

    /// Layout rooted at an arbitrary base directory (tests, portable mode).
    pub fn at(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let logs_dir = base.join(LOGS_DIR);
        Self {
            active_file: logs_dir.join(ACTIVE_FILE),
            settings_file: base.join(SETTINGS_FILE),
            logs_dir,
            base,
        }
    }

    /// Create the directory tree. Callers must do this before writing.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.logs_dir)
    }
}

// ============================================================================
// TESTS
// ============================================================================
