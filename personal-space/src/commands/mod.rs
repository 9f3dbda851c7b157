//! Commands exposed to the transport layer
//!
//! Each command is a thin async function over [`AppState`]. Reads that are
//! public take only the state; anything that mutates, or exposes private
//! data, also takes an [`AuthSession`], so an unauthenticated call cannot
//! reach the store.
//!
//! This module organizes commands into logical submodules:
//! - `auth`: Login and session check
//! - `talks`: Talk creation, listing, flags
//! - `todos`: Todo creation, listing, completion
//! - `anniversaries`: Anniversary creation, listing, upcoming view
//! - `settings`: Site settings
//! - `stats`: Sidebar aggregates
//! - `backup`: Export and import
//! - `collections`: Generic collection/entity operations

pub mod anniversaries;
pub mod auth;
pub mod backup;
pub mod collections;
pub mod settings;
pub mod stats;
pub mod talks;
pub mod todos;

use crate::app::AppState;

pub use crate::services::AuthSession;

// Re-export all commands for convenient registration by a transport adapter
pub use anniversaries::*;
pub use auth::*;
pub use backup::*;
pub use collections::*;
pub use settings::*;
pub use stats::*;
pub use talks::*;
pub use todos::*;

// ===== General Commands =====

/// Get application information
pub fn get_app_info(state: &AppState) -> AppInfo {
    AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        data_dir: state.config.data_dir().to_string_lossy().to_string(),
    }
}

/// Application information structure
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub version: String,
    pub data_dir: String,
}
