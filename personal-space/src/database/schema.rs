//! Document bootstrap and legacy repair
//!
//! Runs once at startup. Creates the document if absent, fills in missing
//! top-level keys, seeds the admin account and backfills `completedAt` on
//! completed todos written before that field existed.

use super::models::{Document, Settings, User};
use super::repository::CollectionStore;
use crate::config::{DEFAULT_ADMIN_USERNAME, REQUIRED_DOCUMENT_KEYS};
use crate::error::{AppError, Result};
use chrono::Utc;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

/// What bootstrap had to do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// The document file did not exist
    pub created: bool,
    pub seeded_admin: bool,
    /// Top-level keys that were missing and got defaults
    pub repaired_keys: Vec<String>,
    /// Unparseable file moved aside before starting fresh
    pub quarantined: Option<PathBuf>,
    /// Completed todos that received a `completedAt`
    pub migrated_todos: usize,
}

impl BootstrapReport {
    pub fn changed(&self) -> bool {
        self.created
            || self.seeded_admin
            || !self.repaired_keys.is_empty()
            || self.quarantined.is_some()
            || self.migrated_todos > 0
    }
}

/// Initialize the document behind `store`.
///
/// Idempotent: a second run over an initialized document changes nothing.
/// `make_admin` is only called when the admin account is missing.
pub async fn initialize_document<F>(
    store: &CollectionStore,
    make_admin: F,
) -> Result<BootstrapReport>
where
    F: FnOnce() -> Result<User>,
{
    tracing::info!("Initializing document at {:?}", store.path());

    let guard = store.lock().await;
    let mut report = BootstrapReport::default();

    let mut raw = match load_raw(store.path()).await? {
        RawDocument::Missing => {
            report.created = true;
            Map::new()
        }
        RawDocument::Object(map) => map,
        RawDocument::Corrupt(reason) => {
            let moved_to = quarantine(store.path()).await?;
            tracing::warn!(
                "Document at {:?} is unreadable ({}); moved to {:?} and starting fresh",
                store.path(),
                reason,
                moved_to
            );
            report.quarantined = Some(moved_to);
            Map::new()
        }
    };

    for key in REQUIRED_DOCUMENT_KEYS.iter().chain(std::iter::once(&"favorites")) {
        if raw.get(*key).map_or(true, Value::is_null) {
            raw.insert((*key).to_string(), default_for(key)?);
            if REQUIRED_DOCUMENT_KEYS.contains(key) {
                report.repaired_keys.push((*key).to_string());
            }
        }
    }

    let mut doc: Document = serde_json::from_value(Value::Object(raw)).map_err(|e| {
        tracing::error!("Document at {:?} has an invalid shape: {}", store.path(), e);
        AppError::StorageUnavailable(format!("document has an invalid shape: {e}"))
    })?;

    if !doc.users.iter().any(|u| u.username == DEFAULT_ADMIN_USERNAME) {
        doc.users.push(make_admin()?);
        report.seeded_admin = true;
        tracing::info!("Seeded default '{}' account", DEFAULT_ADMIN_USERNAME);
    }

    report.migrated_todos = backfill_completed_at(&mut doc);
    if report.migrated_todos > 0 {
        tracing::warn!(
            "Backfilled completedAt on {} legacy todos from endTime/createdAt",
            report.migrated_todos
        );
    }

    if report.changed() {
        guard.write(&doc).await?;
        tracing::info!("Document initialized: {:?}", report);
    } else {
        tracing::info!("Document already initialized");
    }

    Ok(report)
}

/// Restore the completion invariant on records from older versions.
///
/// Completed todos without `completedAt` get their legacy `endTime`, or
/// `createdAt` if that is missing too. Pending todos lose any stray stamp.
pub fn backfill_completed_at(doc: &mut Document) -> usize {
    let mut changed = 0;
    for todo in &mut doc.todos {
        match (todo.completed, todo.completed_at) {
            (true, None) => {
                todo.completed_at = Some(todo.end_time.unwrap_or(todo.created_at));
                changed += 1;
            }
            (false, Some(_)) => {
                todo.completed_at = None;
                changed += 1;
            }
            _ => {}
        }
    }
    changed
}

enum RawDocument {
    Missing,
    Object(Map<String, Value>),
    Corrupt(String),
}

async fn load_raw(path: &Path) -> Result<RawDocument> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RawDocument::Missing),
        Err(e) => {
            tracing::error!("Failed to read document at {:?}: {}", path, e);
            return Err(AppError::StorageUnavailable(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )));
        }
    };

    if content.trim().is_empty() {
        return Ok(RawDocument::Object(Map::new()));
    }

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(RawDocument::Object(map)),
        Ok(other) => Ok(RawDocument::Corrupt(format!("top level is {}", json_kind(&other)))),
        Err(e) => Ok(RawDocument::Corrupt(e.to_string())),
    }
}

async fn quarantine(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "db.json".to_string());
    let target = path.with_file_name(format!(
        "{}.corrupt-{}",
        file_name,
        Utc::now().timestamp_millis()
    ));
    fs::rename(path, &target).await?;
    Ok(target)
}

fn default_for(key: &str) -> Result<Value> {
    match key {
        "settings" => Ok(serde_json::to_value(Settings::default())?),
        _ => Ok(Value::Array(Vec::new())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Todo;
    use serde_json::json;
    use tempfile::TempDir;

    fn admin() -> Result<User> {
        Ok(User {
            id: "admin".to_string(),
            username: "admin".to_string(),
            password_hash: "$argon2id$test".to_string(),
        })
    }

    fn create_test_store() -> (CollectionStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::new(temp_dir.path().join("data").join("db.json"));
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_first_run_creates_document() {
        let (store, _temp) = create_test_store();

        let report = initialize_document(&store, admin).await.unwrap();
        assert!(report.created);
        assert!(report.seeded_admin);

        let raw: Value =
            serde_json::from_str(&fs::read_to_string(store.path()).await.unwrap()).unwrap();
        for key in REQUIRED_DOCUMENT_KEYS {
            assert!(raw.get(*key).is_some(), "missing {key}");
        }
        assert_eq!(raw["settings"]["siteTitle"], json!("Perimsx"));
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let (store, _temp) = create_test_store();

        initialize_document(&store, admin).await.unwrap();
        let first = store.snapshot().await.unwrap();

        let report = initialize_document(&store, || panic!("admin must not be re-seeded"))
            .await
            .unwrap();

        assert!(!report.changed());
        let second = store.snapshot().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second.users.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_keys_are_repaired_without_touching_data() {
        let (store, _temp) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).await.unwrap();
        fs::write(
            store.path(),
            json!({
                "talks": [{
                    "id": "1",
                    "content": "hello",
                    "createdAt": "2024-01-01T00:00:00.000Z"
                }]
            })
            .to_string(),
        )
        .await
        .unwrap();

        let report = initialize_document(&store, admin).await.unwrap();

        assert!(!report.created);
        assert_eq!(report.repaired_keys, vec!["users", "todos", "anniversaries", "settings"]);
        let doc = store.snapshot().await.unwrap();
        assert_eq!(doc.talks.len(), 1);
        assert_eq!(doc.users.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_quarantined() {
        let (store, _temp) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).await.unwrap();
        fs::write(store.path(), "{ truncated").await.unwrap();

        let report = initialize_document(&store, admin).await.unwrap();

        let moved = report.quarantined.expect("corrupt file should be moved aside");
        assert_eq!(fs::read_to_string(&moved).await.unwrap(), "{ truncated");
        assert_eq!(store.snapshot().await.unwrap().users.len(), 1);
    }

    #[tokio::test]
    async fn test_legacy_completed_todos_are_backfilled() {
        let (store, _temp) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).await.unwrap();
        fs::write(
            store.path(),
            json!({
                "todos": [
                    {
                        "id": "old",
                        "content": "legacy",
                        "completed": true,
                        "endTime": "2023-05-01T10:00:00.000Z",
                        "createdAt": "2023-04-01T10:00:00.000Z"
                    },
                    {
                        "id": "stray",
                        "content": "pending with stamp",
                        "completed": false,
                        "completedAt": "2023-05-01T10:00:00.000Z",
                        "createdAt": "2023-04-01T10:00:00.000Z"
                    }
                ]
            })
            .to_string(),
        )
        .await
        .unwrap();

        let report = initialize_document(&store, admin).await.unwrap();
        assert_eq!(report.migrated_todos, 2);

        let todos: Vec<Todo> = store.get().await.unwrap();
        assert_eq!(todos[0].completed_at, todos[0].end_time);
        assert!(todos[1].completed_at.is_none());
    }
}
