//! Todo-related commands
//!
//! Todos are private, so even listing requires a session.

use crate::app::AppState;
use crate::database::{CreateTodoRequest, Todo};
use crate::error::Result;
use crate::services::AuthSession;

/// List todos in display order
pub async fn list_todos(state: &AppState, _session: &AuthSession) -> Result<Vec<Todo>> {
    state.todos_service.list().await
}

/// Create a todo
pub async fn create_todo(
    state: &AppState,
    _session: &AuthSession,
    req: CreateTodoRequest,
) -> Result<Todo> {
    state.todos_service.create(req).await
}

/// Toggle completion
pub async fn toggle_todo(state: &AppState, _session: &AuthSession, id: String) -> Result<Todo> {
    state.todos_service.toggle(&id).await
}

/// Delete a todo
pub async fn delete_todo(state: &AppState, _session: &AuthSession, id: String) -> Result<()> {
    state.todos_service.delete(&id).await
}

/// Remove all completed todos, returning how many were removed
pub async fn clear_completed_todos(state: &AppState, _session: &AuthSession) -> Result<usize> {
    state.todos_service.clear_completed().await
}
