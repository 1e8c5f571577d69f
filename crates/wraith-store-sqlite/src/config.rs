// crates/wraith-store-sqlite/src/config.rs
// ============================================================================
// Module: Store Configuration
// Description: SQLite store configuration and path validation.
// Purpose: Validate the database location and journal settings before opening.
// Dependencies: serde, wraith-core
// ============================================================================

//! ## Overview
//! Configuration for the SQLite-backed store. The only required field is the
//! database file path; journal and sync modes default to WAL + full, matching
//! the durability posture expected of a single-writer store. Paths are
//! validated before the connection opens so misconfiguration fails early
//! instead of surfacing as an engine error mid-bootstrap.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use wraith_core::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// SQLite journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to SQLite `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl JournalMode {
    /// Returns the SQLite pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// SQLite sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to SQLite `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SyncMode {
    /// Returns the SQLite pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the Wraith SQLite store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
    /// SQLite journal mode.
    #[serde(default)]
    pub journal_mode: JournalMode,
    /// SQLite sync mode.
    #[serde(default)]
    pub sync_mode: SyncMode,
}

impl StoreConfig {
    /// Creates a configuration with default journal settings.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            journal_mode: JournalMode::default(),
            sync_mode: SyncMode::default(),
        }
    }
}

// ============================================================================
// SECTION: Path Validation
// ============================================================================

/// Ensures the parent directory for the store exists.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Err(StoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| StoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
pub(crate) fn validate_store_path(path: &Path) -> Result<(), StoreError> {
    if path.as_os_str().is_empty() {
        return Err(StoreError::Io("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(StoreError::Io("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(StoreError::Io("store path contains an overlong component".to_string()));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(StoreError::Io("store path must be a file, not a directory".to_string()));
    }
    Ok(())
}
