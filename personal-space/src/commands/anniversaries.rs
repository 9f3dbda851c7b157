//! Anniversary-related commands

use crate::app::AppState;
use crate::database::{Anniversary, CreateAnniversaryRequest};
use crate::error::Result;
use crate::services::{AuthSession, UpcomingAnniversary};

/// List anniversaries in stored order (public)
pub async fn list_anniversaries(state: &AppState) -> Result<Vec<Anniversary>> {
    state.anniversaries_service.list().await
}

/// Anniversaries with day distances, pinned first (public)
pub async fn list_upcoming_anniversaries(state: &AppState) -> Result<Vec<UpcomingAnniversary>> {
    state.anniversaries_service.upcoming().await
}

/// Create an anniversary
pub async fn create_anniversary(
    state: &AppState,
    _session: &AuthSession,
    req: CreateAnniversaryRequest,
) -> Result<Anniversary> {
    state.anniversaries_service.create(req).await
}

/// Toggle an anniversary's pin
pub async fn toggle_anniversary_pin(
    state: &AppState,
    _session: &AuthSession,
    id: String,
) -> Result<Anniversary> {
    state.anniversaries_service.toggle_pin(&id).await
}

/// Delete an anniversary
pub async fn delete_anniversary(
    state: &AppState,
    _session: &AuthSession,
    id: String,
) -> Result<()> {
    state.anniversaries_service.delete(&id).await
}
