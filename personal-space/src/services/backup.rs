//! Backup service
//!
//! Exports a redacted snapshot of the document and imports one back.
//! Exports never carry the `users` collection. Imports are validated in full,
//! the live document is copied aside, and only then is it replaced, with the
//! current `users` carried over so an import cannot change credentials.

use crate::config::{EXPORT_FORMAT_VERSION, EXPORT_SOURCE, REQUIRED_IMPORT_KEYS};
use crate::database::repository::write_atomically;
use crate::database::schema::backfill_completed_at;
use crate::database::timestamps::format_timestamp;
use crate::database::{Anniversary, CollectionStore, Document, Settings, Talk, Todo};
use crate::error::{AppError, Result};
use crate::storage::StagedUpload;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

const SAFETY_BACKUP_PREFIX: &str = "backup-before-import-";

/// Metadata stamped on every export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMeta {
    pub version: String,
    pub exported_at: String,
    pub source: String,
}

/// Redacted snapshot. There is deliberately no `users` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub talks: Vec<Talk>,
    pub todos: Vec<Todo>,
    pub anniversaries: Vec<Anniversary>,
    pub favorites: Vec<Value>,
    pub settings: Settings,
    #[serde(rename = "_meta")]
    pub meta: ExportMeta,
}

/// Result of a successful import
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub backed_up: bool,
    pub backup_file: PathBuf,
}

/// A copy of the document taken before an import
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyBackup {
    pub path: PathBuf,
    pub size: u64,
    pub taken_at: DateTime<Utc>,
}

/// Suggested download name for an export taken at `at`
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("backup-{}.json", at.format("%Y-%m-%dT%H-%M-%S"))
}

/// Check the top-level shape of an import candidate.
///
/// All problems are reported together.
pub fn validate_candidate(candidate: &Value) -> Result<()> {
    let Some(fields) = candidate.as_object() else {
        return Err(AppError::validation("import must be a JSON object"));
    };

    let missing: Vec<&str> = REQUIRED_IMPORT_KEYS
        .iter()
        .copied()
        .filter(|key| !fields.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    let mut malformed = Vec::new();
    for key in ["talks", "todos", "anniversaries"] {
        if !fields[key].is_array() {
            malformed.push(format!("{key} must be an array"));
        }
    }
    if !fields["settings"].is_object() {
        malformed.push("settings must be an object".to_string());
    }
    if !malformed.is_empty() {
        return Err(AppError::validation(malformed.join("; ")));
    }

    Ok(())
}

/// Convert a validated candidate into a document, dropping `users` and `_meta`
fn candidate_to_document(candidate: Value) -> Result<Document> {
    let Value::Object(mut fields) = candidate else {
        return Err(AppError::validation("import must be a JSON object"));
    };
    fields.remove("users");
    fields.remove("_meta");

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::validation(format!("invalid import entry: {}", e)))
}

/// Backup service
#[derive(Clone)]
pub struct BackupService {
    store: CollectionStore,
    backups_dir: PathBuf,
}

impl BackupService {
    pub fn new(store: CollectionStore, backups_dir: PathBuf) -> Self {
        Self { store, backups_dir }
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Redacted snapshot of the current document
    pub async fn export_snapshot(&self) -> Result<ExportSnapshot> {
        let doc = self.store.snapshot().await?;

        let snapshot = ExportSnapshot {
            talks: doc.talks,
            todos: doc.todos,
            anniversaries: doc.anniversaries,
            favorites: doc.favorites,
            settings: doc.settings,
            meta: ExportMeta {
                version: EXPORT_FORMAT_VERSION.to_string(),
                exported_at: format_timestamp(&Utc::now()),
                source: EXPORT_SOURCE.to_string(),
            },
        };

        tracing::info!(
            "Exported snapshot: {} talks, {} todos, {} anniversaries",
            snapshot.talks.len(),
            snapshot.todos.len(),
            snapshot.anniversaries.len()
        );
        Ok(snapshot)
    }

    /// Export rendered as pretty JSON, with a suggested file name
    pub async fn export_json(&self) -> Result<(String, String)> {
        let snapshot = self.export_snapshot().await?;
        let json = serde_json::to_string_pretty(&snapshot)?;
        Ok((export_file_name(Utc::now()), json))
    }

    /// Import a staged upload. The staged file is removed however this ends.
    pub async fn import_upload(&self, upload: StagedUpload) -> Result<ImportOutcome> {
        tracing::info!("Importing upload '{}'", upload.original_name());

        let bytes = upload.read_json_bytes().await?;
        let candidate: Value = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::validation(format!("import is not valid JSON: {}", e)))?;

        self.import_snapshot(candidate).await
    }

    /// Validate `candidate`, copy the live document aside, then replace it.
    ///
    /// Any failure before the final write leaves the live document unchanged.
    pub async fn import_snapshot(&self, candidate: Value) -> Result<ImportOutcome> {
        validate_candidate(&candidate)?;
        let mut incoming = candidate_to_document(candidate)?;

        let migrated = backfill_completed_at(&mut incoming);
        if migrated > 0 {
            tracing::warn!("Backfilled completedAt on {} imported legacy todos", migrated);
        }

        let guard = self.store.lock().await;

        // A corrupt live document aborts here rather than being treated as empty
        let current = guard.read().await?;
        let backup_file = self.write_safety_backup(&current).await?;

        incoming.users = current.users;
        guard.write(&incoming).await?;

        tracing::info!(
            "Import complete: {} talks, {} todos, {} anniversaries (previous data at {:?})",
            incoming.talks.len(),
            incoming.todos.len(),
            incoming.anniversaries.len(),
            backup_file
        );

        Ok(ImportOutcome {
            backed_up: true,
            backup_file,
        })
    }

    /// Safety backups, newest first
    pub async fn list_safety_backups(&self) -> Result<Vec<SafetyBackup>> {
        let mut backups = Vec::new();

        let mut entries = match fs::read_dir(&self.backups_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(backups),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(taken_at) = safety_backup_time(&path) else {
                continue;
            };
            let size = entry.metadata().await?.len();
            backups.push(SafetyBackup {
                path,
                size,
                taken_at,
            });
        }

        backups.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
        Ok(backups)
    }

    async fn write_safety_backup(&self, current: &Document) -> Result<PathBuf> {
        fs::create_dir_all(&self.backups_dir).await?;

        let mut millis = Utc::now().timestamp_millis();
        let mut path = self.safety_backup_path(millis);
        while fs::try_exists(&path).await? {
            millis += 1;
            path = self.safety_backup_path(millis);
        }

        let content = serde_json::to_string_pretty(current)?;
        write_atomically(&path, content.as_bytes()).await?;

        tracing::info!("Wrote safety backup {:?}", path);
        Ok(path)
    }

    fn safety_backup_path(&self, millis: i64) -> PathBuf {
        self.backups_dir
            .join(format!("{}{}.json", SAFETY_BACKUP_PREFIX, millis))
    }
}

fn safety_backup_time(path: &Path) -> Option<DateTime<Utc>> {
    let name = path.file_name()?.to_str()?;
    let millis: i64 = name
        .strip_prefix(SAFETY_BACKUP_PREFIX)?
        .strip_suffix(".json")?
        .parse()
        .ok()?;
    Utc.timestamp_millis_opt(millis).single()
}
