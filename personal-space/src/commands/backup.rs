//! Backup-related commands
//!
//! Export a redacted snapshot and import one back, replacing everything but
//! the user accounts.

use crate::app::AppState;
use crate::error::Result;
use crate::services::{AuthSession, ExportSnapshot, ImportOutcome, SafetyBackup};
use crate::storage::StagedUpload;
use serde::Serialize;
use serde_json::Value;

/// Export body plus the file name a download should be saved under
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDownload {
    pub file_name: String,
    pub content: String,
}

/// Export everything except user accounts
pub async fn export_snapshot(state: &AppState, _session: &AuthSession) -> Result<ExportSnapshot> {
    state.backup_service.export_snapshot().await
}

/// Export rendered as a downloadable JSON attachment
pub async fn export_download(state: &AppState, _session: &AuthSession) -> Result<ExportDownload> {
    let (file_name, content) = state.backup_service.export_json().await?;
    Ok(ExportDownload { file_name, content })
}

/// Import an already-parsed snapshot
pub async fn import_snapshot(
    state: &AppState,
    _session: &AuthSession,
    candidate: Value,
) -> Result<ImportOutcome> {
    tracing::info!("Import requested");
    state.backup_service.import_snapshot(candidate).await
}

/// Stage uploaded bytes and import them.
///
/// The staged copy is removed when this returns, on success or failure.
pub async fn import_upload(
    state: &AppState,
    _session: &AuthSession,
    file_name: String,
    data: Vec<u8>,
) -> Result<ImportOutcome> {
    let staged = StagedUpload::stage(&state.config.uploads_dir(), &file_name, &data).await?;
    state.backup_service.import_upload(staged).await
}

/// Safety copies taken before previous imports, newest first
pub async fn list_safety_backups(
    state: &AppState,
    _session: &AuthSession,
) -> Result<Vec<SafetyBackup>> {
    state.backup_service.list_safety_backups().await
}
