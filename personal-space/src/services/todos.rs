//! Todos service
//!
//! Creation rules, the Pending/Done transition, and the listing order.

use crate::config::MAX_TODO_CONTENT_LENGTH;
use crate::database::{new_id, CollectionStore, CreateTodoRequest, Priority, Todo};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Completion state of a todo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoState {
    Pending,
    Done,
}

impl TodoState {
    pub fn of(todo: &Todo) -> Self {
        if todo.completed {
            TodoState::Done
        } else {
            TodoState::Pending
        }
    }
}

/// Flip a todo between Pending and Done, stamping or clearing `completed_at`
pub fn toggle_completion(todo: &mut Todo, now: DateTime<Utc>) -> TodoState {
    match TodoState::of(todo) {
        TodoState::Pending => {
            todo.completed = true;
            todo.completed_at = Some(now);
            TodoState::Done
        }
        TodoState::Done => {
            todo.completed = false;
            todo.completed_at = None;
            TodoState::Pending
        }
    }
}

/// Pending with a deadline in the past
pub fn is_overdue(todo: &Todo, now: DateTime<Utc>) -> bool {
    !todo.completed && todo.end_time.is_some_and(|deadline| deadline < now)
}

/// Time used to order completed todos.
///
/// Falls back to `end_time` for records that predate `completed_at`; bootstrap
/// backfills those, so the fallback only matters for unmigrated imports.
pub fn effective_completion_time(todo: &Todo) -> DateTime<Utc> {
    todo.completed_at.or(todo.end_time).unwrap_or(todo.created_at)
}

/// Listing order:
/// pending before done; among pending, overdue first, then priority, then
/// earliest deadline (no deadline last); among done, most recently completed.
pub fn compare_todos(a: &Todo, b: &Todo, now: DateTime<Utc>) -> Ordering {
    a.completed.cmp(&b.completed).then_with(|| {
        if a.completed {
            effective_completion_time(b).cmp(&effective_completion_time(a))
        } else {
            is_overdue(b, now)
                .cmp(&is_overdue(a, now))
                .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
                .then_with(|| match (a.end_time, b.end_time) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                })
        }
    })
}

pub fn sort_todos(todos: &mut [Todo], now: DateTime<Utc>) {
    todos.sort_by(|a, b| compare_todos(a, b, now));
}

/// Validate a creation request and build the new todo
pub fn build_todo(req: CreateTodoRequest, now: DateTime<Utc>) -> Result<Todo> {
    let length = req.content.chars().count();
    if length > MAX_TODO_CONTENT_LENGTH {
        return Err(AppError::validation(format!(
            "todo content is too long ({} characters, maximum {})",
            length, MAX_TODO_CONTENT_LENGTH
        )));
    }

    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::validation("todo content must not be empty"));
    }

    let priority = match req.priority.as_deref() {
        None | Some("") => Priority::default(),
        Some(raw) => raw.parse()?,
    };

    Ok(Todo {
        id: new_id(),
        content: content.to_string(),
        priority,
        completed: false,
        start_time: req.start_time,
        end_time: req.end_time,
        completed_at: None,
        created_at: now,
    })
}

/// Service for managing todos
#[derive(Clone)]
pub struct TodosService {
    store: CollectionStore,
}

impl TodosService {
    pub fn new(store: CollectionStore) -> Self {
        Self { store }
    }

    /// Create a new pending todo
    pub async fn create(&self, req: CreateTodoRequest) -> Result<Todo> {
        let todo = build_todo(req, Utc::now())?;

        let created = todo.clone();
        self.store
            .update(move |doc| {
                doc.todos.push(todo);
                Ok(())
            })
            .await?;

        tracing::info!("Todo created: {}", created.id);
        Ok(created)
    }

    /// All todos in listing order
    pub async fn list(&self) -> Result<Vec<Todo>> {
        self.list_at(Utc::now()).await
    }

    /// All todos in listing order, judging deadlines against `now`
    pub async fn list_at(&self, now: DateTime<Utc>) -> Result<Vec<Todo>> {
        let mut todos: Vec<Todo> = self.store.get().await?;
        sort_todos(&mut todos, now);
        Ok(todos)
    }

    /// Toggle completion and return the updated todo
    pub async fn toggle(&self, id: &str) -> Result<Todo> {
        let now = Utc::now();
        let todo = self
            .store
            .update(|doc| {
                let todo = doc
                    .todos
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| AppError::not_found("Todo", id))?;
                toggle_completion(todo, now);
                Ok(todo.clone())
            })
            .await?;

        tracing::debug!("Todo {} is now {:?}", todo.id, TodoState::of(&todo));
        Ok(todo)
    }

    /// Delete a todo in either state
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store
            .update(|doc| {
                let before = doc.todos.len();
                doc.todos.retain(|t| t.id != id);
                if doc.todos.len() == before {
                    return Err(AppError::not_found("Todo", id));
                }
                Ok(())
            })
            .await?;

        tracing::info!("Todo deleted: {}", id);
        Ok(())
    }

    /// Remove every completed todo, returning how many were removed
    pub async fn clear_completed(&self) -> Result<usize> {
        let removed = self
            .store
            .update(|doc| {
                let before = doc.todos.len();
                doc.todos.retain(|t| !t.completed);
                Ok(before - doc.todos.len())
            })
            .await?;

        tracing::info!("Cleared {} completed todos", removed);
        Ok(removed)
    }
}
