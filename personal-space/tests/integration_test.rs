//! Integration tests for Personal Space
//!
//! These tests verify end-to-end behavior through the command layer:
//! - Bootstrap of a fresh data directory
//! - Todo lifecycle and ordering
//! - Export/import workflows and their safety guarantees

use personal_space::app::{setup, AppState};
use personal_space::commands;
use personal_space::config::{AppConfig, DEFAULT_ADMIN_PASSWORD};
use personal_space::database::{open_store, CreateTodoRequest, Priority, Todo};
use personal_space::error::AppError;
use personal_space::services::auth::seed_admin_user;
use personal_space::services::AuthSession;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Helper to set up a data directory and log in as the seeded admin
async fn create_test_app() -> (AppState, AuthSession, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let state = setup(AppConfig::new(temp_dir.path())).await.unwrap();
    let session = commands::login(&state, None, DEFAULT_ADMIN_PASSWORD.to_string())
        .await
        .unwrap();

    (state, session, temp_dir)
}

async fn read_live_document(state: &AppState) -> Vec<u8> {
    tokio::fs::read(state.config.document_path()).await.unwrap()
}

fn todo_fixture(
    content: &str,
    priority: Priority,
    completed: bool,
    end: Option<&str>,
    done: Option<&str>,
) -> Todo {
    serde_json::from_value(json!({
        "id": content,
        "content": content,
        "priority": priority.as_str(),
        "completed": completed,
        "endTime": end,
        "completedAt": done,
        "createdAt": "2023-06-01T00:00:00.000Z",
    }))
    .unwrap()
}

/// Recursively look for anything that resembles a credential
fn contains_credential(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.iter().any(|(key, v)| {
            key == "users" || key == "passwordHash" || key == "password" || contains_credential(v)
        }),
        Value::Array(items) => items.iter().any(contains_credential),
        Value::String(s) => s.starts_with("$argon2"),
        _ => false,
    }
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let config = AppConfig::new(temp_dir.path());

    let state = setup(config.clone()).await.unwrap();
    let first = read_live_document(&state).await;
    drop(state);

    let (store, report) = open_store(&config.document_path(), seed_admin_user)
        .await
        .unwrap();
    assert!(!report.changed());
    assert!(!report.seeded_admin);

    let doc = store.snapshot().await.unwrap();
    assert_eq!(doc.users.len(), 1);
    assert_eq!(doc.users[0].username, "admin");
    assert!(doc.talks.is_empty());
    assert!(doc.todos.is_empty());
    assert!(doc.anniversaries.is_empty());

    let second = tokio::fs::read(config.document_path()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let (state, _session, _temp) = create_test_app().await;

    let result = commands::login(&state, Some("admin".to_string()), "wrong".to_string()).await;
    assert!(matches!(result, Err(AppError::AuthRejected)));

    let result = commands::login(
        &state,
        Some("nobody".to_string()),
        DEFAULT_ADMIN_PASSWORD.to_string(),
    )
    .await;
    assert!(matches!(result, Err(AppError::AuthRejected)));
}

#[tokio::test]
async fn test_carried_over_admin_regains_access_after_reset() {
    let temp_dir = TempDir::new().unwrap();
    let config = AppConfig::new(temp_dir.path());
    let legacy = json!({
        "users": [{
            "id": "admin",
            "username": "admin",
            "password": "$2b$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy"
        }],
        "talks": [{"id": "t1", "content": "old post", "createdAt": "2023-01-01T00:00:00.000Z"}],
        "todos": [],
        "anniversaries": [],
        "settings": {}
    });
    tokio::fs::write(config.document_path(), legacy.to_string())
        .await
        .unwrap();

    let state = setup(config).await.unwrap();
    let result = commands::login(&state, None, DEFAULT_ADMIN_PASSWORD.to_string()).await;
    assert!(matches!(result, Err(AppError::AuthRejected)));

    state
        .auth_service
        .reset_password("admin", "fresh-start")
        .await
        .unwrap();
    let session = commands::login(&state, None, "fresh-start".to_string())
        .await
        .unwrap();
    assert_eq!(session.user_id, "admin");

    // Only the credential changed
    let doc = state.store.snapshot().await.unwrap();
    assert_eq!(doc.users.len(), 1);
    assert_eq!(doc.talks.len(), 1);

    commands::change_password(&state, &session, "second".to_string())
        .await
        .unwrap();
    assert!(commands::login(&state, None, "second".to_string()).await.is_ok());
    let result = commands::login(&state, None, "fresh-start".to_string()).await;
    assert!(matches!(result, Err(AppError::AuthRejected)));
}

#[tokio::test]
async fn test_todo_toggle_keeps_completion_stamp_consistent() {
    let (state, session, _temp) = create_test_app().await;

    let todo = commands::create_todo(
        &state,
        &session,
        CreateTodoRequest {
            content: "renew passport".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(!todo.completed);
    assert!(todo.completed_at.is_none());

    for round in 1..=5 {
        let toggled = commands::toggle_todo(&state, &session, todo.id.clone()).await.unwrap();
        assert_eq!(toggled.completed, round % 2 == 1);

        for stored in commands::list_todos(&state, &session).await.unwrap() {
            assert_eq!(stored.completed, stored.completed_at.is_some());
        }
    }

    let missing = commands::toggle_todo(&state, &session, "missing".to_string()).await;
    assert!(matches!(missing, Err(AppError::NotFound { .. })));
}

#[tokio::test]
async fn test_todo_sort_order() {
    let (state, session, _temp) = create_test_app().await;

    let a = todo_fixture("A", Priority::High, false, Some("2099-01-01"), None);
    let b = todo_fixture("B", Priority::Normal, false, Some("2020-01-01"), None);
    let c = todo_fixture("C", Priority::Low, true, None, Some("2024-01-01"));
    state.store.set(vec![c, a, b]).await.unwrap();

    let ordered: Vec<String> = commands::list_todos(&state, &session)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.content)
        .collect();
    assert_eq!(ordered, vec!["B", "A", "C"]);
}

#[tokio::test]
async fn test_todo_content_length_boundary() {
    let (state, session, _temp) = create_test_app().await;

    let at_limit = CreateTodoRequest {
        content: "x".repeat(1000),
        ..Default::default()
    };
    assert!(commands::create_todo(&state, &session, at_limit).await.is_ok());

    let over_limit = CreateTodoRequest {
        content: "x".repeat(1001),
        ..Default::default()
    };
    let result = commands::create_todo(&state, &session, over_limit).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    assert_eq!(commands::list_todos(&state, &session).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_export_import_round_trip() {
    let (state, session, _temp) = create_test_app().await;

    commands::create_entity(
        &state,
        &session,
        "talk",
        json!({"title": "Hello", "content": "first post", "tags": ["life", "notes"]}),
    )
    .await
    .unwrap();
    commands::create_entity(
        &state,
        &session,
        "todo",
        json!({"content": "call mom", "priority": "high"}),
    )
    .await
    .unwrap();
    commands::create_entity(
        &state,
        &session,
        "anniversary",
        json!({"title": "Wedding", "date": "2015-06-20", "category": "love"}),
    )
    .await
    .unwrap();
    commands::update_settings(&state, &session, json!({"siteTitle": "My Space"}))
        .await
        .unwrap();

    let before = state.store.snapshot().await.unwrap();
    let snapshot = commands::export_snapshot(&state, &session).await.unwrap();
    let exported = serde_json::to_value(snapshot).unwrap();

    // Wipe content so the import has something to restore
    commands::replace_collection(&state, &session, "talks", vec![]).await.unwrap();
    commands::replace_collection(&state, &session, "todos", vec![]).await.unwrap();

    let outcome = commands::import_snapshot(&state, &session, exported).await.unwrap();
    assert!(outcome.backed_up);
    assert!(outcome.backup_file.exists());

    let after = state.store.snapshot().await.unwrap();
    assert_eq!(after.talks, before.talks);
    assert_eq!(after.todos, before.todos);
    assert_eq!(after.anniversaries, before.anniversaries);
    assert_eq!(after.settings, before.settings);
    assert_eq!(after.users, before.users);
}

#[tokio::test]
async fn test_export_is_redacted() {
    let (state, session, _temp) = create_test_app().await;

    let download = commands::export_download(&state, &session).await.unwrap();
    assert!(download.file_name.ends_with(".json"));

    let parsed: Value = serde_json::from_str(&download.content).unwrap();
    assert!(parsed.get("_meta").is_some());
    assert!(!contains_credential(&parsed));
}

#[tokio::test]
async fn test_import_never_changes_users() {
    let (state, session, _temp) = create_test_app().await;
    let users_before = state.store.snapshot().await.unwrap().users;

    let forged = json!({
        "users": [{"id": "evil", "username": "admin", "passwordHash": "$argon2id$forged"}],
        "talks": [],
        "todos": [],
        "anniversaries": [],
        "settings": {},
    });
    commands::import_snapshot(&state, &session, forged).await.unwrap();

    let users_after = state.store.snapshot().await.unwrap().users;
    assert_eq!(users_after, users_before);

    // The original password still works
    assert!(commands::login(&state, None, DEFAULT_ADMIN_PASSWORD.to_string()).await.is_ok());
}

#[tokio::test]
async fn test_partial_import_rejected_without_writing() {
    let (state, session, _temp) = create_test_app().await;
    commands::create_entity(&state, &session, "talk", json!({"content": "keep me"}))
        .await
        .unwrap();
    let live_before = read_live_document(&state).await;

    let missing_settings = json!({"talks": [], "todos": [], "anniversaries": []});
    let result = commands::import_snapshot(&state, &session, missing_settings).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    assert_eq!(read_live_document(&state).await, live_before);
    assert!(commands::list_safety_backups(&state, &session).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_import_cleans_up_staged_file() {
    let (state, session, _temp) = create_test_app().await;

    let exported = commands::export_download(&state, &session).await.unwrap();
    let upload = exported.content.into_bytes();
    commands::import_upload(&state, &session, "backup.json".to_string(), upload)
        .await
        .unwrap();

    let rejected =
        commands::import_upload(&state, &session, "backup.txt".to_string(), b"{}".to_vec()).await;
    assert!(matches!(rejected, Err(AppError::Validation(_))));

    let mut entries = tokio::fs::read_dir(state.config.uploads_dir()).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());

    assert_eq!(commands::list_safety_backups(&state, &session).await.unwrap().len(), 1);
}
