//! Authentication commands

use crate::app::AppState;
use crate::error::Result;
use crate::services::AuthSession;
use serde::Serialize;

/// Who is logged in
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: String,
    pub username: String,
}

impl From<&AuthSession> for SessionInfo {
    fn from(session: &AuthSession) -> Self {
        Self {
            user_id: session.user_id.clone(),
            username: session.username.clone(),
        }
    }
}

/// Log in. Without a username the admin account is assumed.
pub async fn login(
    state: &AppState,
    username: Option<String>,
    password: String,
) -> Result<AuthSession> {
    state
        .auth_service
        .login(username.as_deref(), &password)
        .await
}

/// Describe the current session
pub fn check_auth(session: &AuthSession) -> SessionInfo {
    SessionInfo::from(session)
}

/// Change the password of the logged-in user
pub async fn change_password(
    state: &AppState,
    session: &AuthSession,
    new_password: String,
) -> Result<()> {
    state
        .auth_service
        .reset_password(&session.username, &new_password)
        .await
}
