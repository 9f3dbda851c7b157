//! Services module
//!
//! Business logic services that coordinate between commands and the store.

pub mod anniversaries;
pub mod auth;
pub mod backup;
pub mod settings;
pub mod stats;
pub mod talks;
pub mod todos;

pub use anniversaries::{AnniversariesService, UpcomingAnniversary};
pub use auth::{AuthService, AuthSession};
pub use backup::{BackupService, ExportSnapshot, ImportOutcome, SafetyBackup};
pub use settings::SettingsService;
pub use stats::{SiteStats, StatsService, TagCount};
pub use talks::{TalkFlag, TalksService};
pub use todos::{TodoState, TodosService};
