//! Application configuration constants
//!
//! Central location for all configuration constants, resource limits,
//! and validation boundaries used throughout the application.

use std::path::{Path, PathBuf};

// ===== Data Layout =====

/// Name of the JSON document inside the data directory
pub const DOCUMENT_FILE_NAME: &str = "db.json";

/// Directory (inside the data directory) holding safety snapshots
pub const BACKUPS_DIR_NAME: &str = "backups";

/// Directory (inside the data directory) where uploads are staged
pub const UPLOADS_DIR_NAME: &str = "uploads";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "PERSONAL_SPACE_DATA_DIR";

/// Data directory used when nothing else is configured
pub const DEFAULT_DATA_DIR: &str = "data";

/// Top-level keys every live document must carry
pub const REQUIRED_DOCUMENT_KEYS: &[&str] =
    &["users", "talks", "todos", "anniversaries", "settings"];

// ===== Validation Limits =====

/// Maximum todo content length in characters
pub const MAX_TODO_CONTENT_LENGTH: usize = 1000;

/// Maximum size of an uploaded import file (10 MiB)
pub const MAX_UPLOAD_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Only JSON files are accepted for import
pub const ALLOWED_UPLOAD_EXTENSION: &str = "json";

// ===== Backup Exchange =====

/// Keys a candidate import must carry
pub const REQUIRED_IMPORT_KEYS: &[&str] = &["talks", "todos", "anniversaries", "settings"];

/// Format version written into export metadata
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// Source tag written into export metadata
pub const EXPORT_SOURCE: &str = "personal-space";

// ===== Seeded Account =====

/// Username of the account created on first run
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Password of the account created on first run. Change it after setup.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// Runtime configuration resolved at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolve from `PERSONAL_SPACE_DATA_DIR`, falling back to `./data`
    pub fn from_env() -> Self {
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn document_path(&self) -> PathBuf {
        self.data_dir.join(DOCUMENT_FILE_NAME)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUPS_DIR_NAME)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join(UPLOADS_DIR_NAME)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}
