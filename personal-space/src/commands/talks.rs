//! Talk-related commands

use crate::app::AppState;
use crate::database::{CreateTalkRequest, Talk};
use crate::error::Result;
use crate::services::AuthSession;

/// List talks, pinned first then newest (public)
pub async fn list_talks(state: &AppState) -> Result<Vec<Talk>> {
    state.talks_service.list().await
}

/// List favorited talks (public)
pub async fn list_favorite_talks(state: &AppState) -> Result<Vec<Talk>> {
    state.talks_service.list_favorites().await
}

/// Create a talk
pub async fn create_talk(
    state: &AppState,
    _session: &AuthSession,
    req: CreateTalkRequest,
) -> Result<Talk> {
    state.talks_service.create(req).await
}

/// Delete a talk
pub async fn delete_talk(state: &AppState, _session: &AuthSession, id: String) -> Result<()> {
    state.talks_service.delete(&id).await
}

/// Toggle a talk's pin
pub async fn toggle_talk_pin(state: &AppState, _session: &AuthSession, id: String) -> Result<Talk> {
    state.talks_service.toggle_pin(&id).await
}

/// Toggle a talk's favorite flag
pub async fn toggle_talk_favorite(
    state: &AppState,
    _session: &AuthSession,
    id: String,
) -> Result<Talk> {
    state.talks_service.toggle_favorite(&id).await
}
