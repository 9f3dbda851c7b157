//! Collection store over a single JSON document
//!
//! Every read goes back to disk so callers never see stale state.
//! Every write replaces the whole file through a temp file and a rename.
//! Read-modify-write cycles are serialized by one in-process lock.

use super::models::{CollectionName, Collection, Document, Settings};
use crate::error::{AppError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};

/// Store for the persisted document
#[derive(Clone)]
pub struct CollectionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CollectionStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                path,
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Full current document
    pub async fn snapshot(&self) -> Result<Document> {
        read_document(self.path()).await
    }

    /// All items of one collection, empty if the collection is absent
    pub async fn get<C: Collection>(&self) -> Result<Vec<C>> {
        let mut doc = self.snapshot().await?;
        Ok(std::mem::take(C::items_mut(&mut doc)))
    }

    /// Overwrite one collection, leaving every other collection untouched
    pub async fn set<C: Collection>(&self, items: Vec<C>) -> Result<()> {
        let count = items.len();
        self.update(move |doc| {
            *C::items_mut(doc) = items;
            Ok(())
        })
        .await?;

        tracing::debug!("Stored {} {} entries", count, C::NAME);
        Ok(())
    }

    /// One collection as untyped JSON values
    pub async fn get_values(&self, name: CollectionName) -> Result<Vec<Value>> {
        self.snapshot().await?.collection_values(name)
    }

    /// Overwrite one collection from untyped JSON values
    pub async fn set_values(&self, name: CollectionName, items: Vec<Value>) -> Result<()> {
        self.update(move |doc| doc.replace_collection_values(name, items))
            .await
    }

    pub async fn settings(&self) -> Result<Settings> {
        Ok(self.snapshot().await?.settings)
    }

    /// Overwrite the whole document
    pub async fn replace(&self, doc: &Document) -> Result<()> {
        let guard = self.lock().await;
        guard.write(doc).await
    }

    /// Read, mutate and write back under the store lock.
    ///
    /// Nothing is written when `apply` fails.
    pub async fn update<T, F>(&self, apply: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let guard = self.lock().await;
        let mut doc = guard.read().await?;
        let out = apply(&mut doc)?;
        guard.write(&doc).await?;
        Ok(out)
    }

    /// Hold the write lock across several reads and writes.
    ///
    /// Do not call other writing methods of this store while the guard is
    /// alive; they wait for the same lock.
    pub async fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            path: self.path(),
            _guard: self.inner.write_lock.lock().await,
        }
    }
}

/// Exclusive access to the backing file
pub struct StoreGuard<'a> {
    path: &'a Path,
    _guard: MutexGuard<'a, ()>,
}

impl StoreGuard<'_> {
    pub async fn read(&self) -> Result<Document> {
        read_document(self.path).await
    }

    pub async fn write(&self, doc: &Document) -> Result<()> {
        let content = serde_json::to_string_pretty(doc)?;
        write_atomically(self.path, content.as_bytes())
            .await
            .map_err(|e| storage_unavailable(self.path, "write", e))
    }
}

/// Strict read: a missing file is an empty document, an unreadable or
/// unparseable one is `StorageUnavailable`.
async fn read_document(path: &Path) -> Result<Document> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::default()),
        Err(e) => return Err(storage_unavailable(path, "read", e)),
    };

    if content.trim().is_empty() {
        return Ok(Document::default());
    }

    serde_json::from_str(&content).map_err(|e| storage_unavailable(path, "parse", e))
}

fn storage_unavailable(path: &Path, action: &str, err: impl std::fmt::Display) -> AppError {
    tracing::error!("Failed to {} document at {:?}: {}", action, path, err);
    AppError::StorageUnavailable(format!("failed to {} {}: {}", action, path.display(), err))
}

/// Write to a sibling temp file, sync it, then rename over the target
pub(crate) async fn write_atomically(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&temp_path, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Anniversary, AnniversaryCategory, Priority, Todo};
    use chrono::{NaiveDate, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_store() -> (CollectionStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::new(temp_dir.path().join("db.json"));
        (store, temp_dir)
    }

    fn todo(id: &str) -> Todo {
        Todo {
            id: id.to_string(),
            content: format!("todo {id}"),
            priority: Priority::Normal,
            completed: false,
            start_time: None,
            end_time: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_get_missing_collection_is_empty() {
        let (store, _temp) = create_test_store();

        let todos: Vec<Todo> = store.get().await.unwrap();
        assert!(todos.is_empty());
    }

    #[tokio::test]
    async fn test_set_leaves_other_collections_untouched() {
        let (store, _temp) = create_test_store();

        let anniversary = Anniversary {
            id: "a1".to_string(),
            title: "Wedding".to_string(),
            date: NaiveDate::from_ymd_opt(2015, 6, 20).unwrap(),
            category: AnniversaryCategory::Love,
            pinned: false,
        };
        store.set(vec![anniversary.clone()]).await.unwrap();
        store.set(vec![todo("t1"), todo("t2")]).await.unwrap();

        let anniversaries: Vec<Anniversary> = store.get().await.unwrap();
        let todos: Vec<Todo> = store.get().await.unwrap();
        assert_eq!(anniversaries, vec![anniversary]);
        assert_eq!(todos.len(), 2);
    }

    #[tokio::test]
    async fn test_reads_see_external_changes() {
        let (store, _temp) = create_test_store();
        store.set(vec![todo("t1")]).await.unwrap();

        // Another store instance on the same file stands in for an external edit
        let other = CollectionStore::new(store.path().to_path_buf());
        other.set::<Todo>(Vec::new()).await.unwrap();

        let todos: Vec<Todo> = store.get().await.unwrap();
        assert!(todos.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_unavailable() {
        let (store, _temp) = create_test_store();
        fs::write(store.path(), "{ not json").await.unwrap();

        let result = store.get::<Todo>().await;
        assert!(matches!(result, Err(AppError::StorageUnavailable(_))));

        // Writes must not clobber the unreadable file either
        let result = store.set(vec![todo("t1")]).await;
        assert!(matches!(result, Err(AppError::StorageUnavailable(_))));
        let content = fs::read_to_string(store.path()).await.unwrap();
        assert_eq!(content, "{ not json");
    }

    #[tokio::test]
    async fn test_failed_update_writes_nothing() {
        let (store, _temp) = create_test_store();
        store.set(vec![todo("t1")]).await.unwrap();

        let result: Result<()> = store
            .update(|doc| {
                doc.todos.clear();
                Err(AppError::validation("abort"))
            })
            .await;
        assert!(result.is_err());

        let todos: Vec<Todo> = store.get().await.unwrap();
        assert_eq!(todos.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_sets_do_not_lose_updates() {
        let (store, _temp) = create_test_store();

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(move |doc| {
                        doc.todos.push(todo(&i.to_string()));
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let todos: Vec<Todo> = store.get().await.unwrap();
        assert_eq!(todos.len(), 20);
    }

    #[tokio::test]
    async fn test_values_round_trip_through_typed_entities() {
        let (store, _temp) = create_test_store();

        store
            .set_values(
                CollectionName::Todos,
                vec![json!({
                    "id": "t1",
                    "content": "water plants",
                    "priority": "high",
                    "completed": false,
                    "createdAt": "2024-01-01T00:00:00.000Z"
                })],
            )
            .await
            .unwrap();

        let values = store.get_values(CollectionName::Todos).await.unwrap();
        assert_eq!(values[0]["priority"], json!("high"));
        assert_eq!(values[0]["completedAt"], Value::Null);

        let result = store
            .set_values(CollectionName::Todos, vec![json!({ "content": 1 })])
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
