//! Settings-related commands

use crate::app::AppState;
use crate::database::Settings;
use crate::error::Result;
use crate::services::AuthSession;
use serde_json::Value;

/// Get site settings (public)
pub async fn get_settings(state: &AppState) -> Result<Settings> {
    state.settings_service.load().await
}

/// Merge a partial update into the site settings
pub async fn update_settings(
    state: &AppState,
    _session: &AuthSession,
    patch: Value,
) -> Result<Settings> {
    state.settings_service.update(patch).await
}
