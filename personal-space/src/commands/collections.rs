//! Generic collection commands
//!
//! A name-addressed view over the document for admin tooling: read or
//! replace a whole collection, or create, toggle and delete a single entity
//! by kind. Typed commands in the sibling modules cover the same ground with
//! stronger signatures.

use crate::app::AppState;
use crate::database::{
    CollectionName, CreateAnniversaryRequest, CreateTalkRequest, CreateTodoRequest,
};
use crate::error::{AppError, Result};
use crate::services::AuthSession;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Entity kinds that can be created through the generic interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Talk,
    Todo,
    Anniversary,
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "talk" | "talks" => Ok(Self::Talk),
            "todo" | "todos" => Ok(Self::Todo),
            "anniversary" | "anniversaries" => Ok(Self::Anniversary),
            other => Err(AppError::validation(format!("unknown entity kind '{}'", other))),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Talk => "talk",
            Self::Todo => "todo",
            Self::Anniversary => "anniversary",
        })
    }
}

/// Boolean fields that can be flipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleField {
    Pin,
    Favorite,
    Completed,
}

impl FromStr for ToggleField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pin" | "pinned" | "isPinned" => Ok(Self::Pin),
            "favorite" | "isFavorite" => Ok(Self::Favorite),
            "completed" | "complete" => Ok(Self::Completed),
            other => Err(AppError::validation(format!("unknown toggle field '{}'", other))),
        }
    }
}

fn parse_body<T: DeserializeOwned>(kind: EntityKind, fields: Value) -> Result<T> {
    serde_json::from_value(fields)
        .map_err(|e| AppError::validation(format!("invalid {} fields: {}", kind, e)))
}

fn to_value<T: Serialize>(entity: &T) -> Result<Value> {
    Ok(serde_json::to_value(entity)?)
}

/// Read a collection by name. User entries never carry their password hash.
pub async fn get_collection(
    state: &AppState,
    _session: &AuthSession,
    name: &str,
) -> Result<Vec<Value>> {
    let name: CollectionName = name.parse()?;
    let mut items = state.store.get_values(name).await?;

    if name == CollectionName::Users {
        for item in &mut items {
            if let Some(user) = item.as_object_mut() {
                user.remove("passwordHash");
                user.remove("password");
            }
        }
    }

    Ok(items)
}

/// Replace a whole collection. Accounts cannot be replaced this way.
pub async fn replace_collection(
    state: &AppState,
    _session: &AuthSession,
    name: &str,
    items: Vec<Value>,
) -> Result<()> {
    let name: CollectionName = name.parse()?;
    if name == CollectionName::Users {
        return Err(AppError::validation("the users collection cannot be replaced"));
    }

    tracing::info!("Replacing collection {} with {} entries", name, items.len());
    state.store.set_values(name, items).await
}

/// Create an entity of `kind` from a JSON body
pub async fn create_entity(
    state: &AppState,
    session: &AuthSession,
    kind: &str,
    fields: Value,
) -> Result<Value> {
    let kind: EntityKind = kind.parse()?;
    tracing::debug!("{} creating {}", session.username, kind);

    match kind {
        EntityKind::Talk => {
            let req: CreateTalkRequest = parse_body(kind, fields)?;
            to_value(&state.talks_service.create(req).await?)
        }
        EntityKind::Todo => {
            let req: CreateTodoRequest = parse_body(kind, fields)?;
            to_value(&state.todos_service.create(req).await?)
        }
        EntityKind::Anniversary => {
            let req: CreateAnniversaryRequest = parse_body(kind, fields)?;
            to_value(&state.anniversaries_service.create(req).await?)
        }
    }
}

/// Flip `field` on the entity and return it
pub async fn toggle_field(
    state: &AppState,
    _session: &AuthSession,
    kind: &str,
    id: &str,
    field: &str,
) -> Result<Value> {
    let kind: EntityKind = kind.parse()?;
    let field: ToggleField = field.parse()?;

    match (kind, field) {
        (EntityKind::Talk, ToggleField::Pin) => {
            to_value(&state.talks_service.toggle_pin(id).await?)
        }
        (EntityKind::Talk, ToggleField::Favorite) => {
            to_value(&state.talks_service.toggle_favorite(id).await?)
        }
        (EntityKind::Todo, ToggleField::Completed) => {
            to_value(&state.todos_service.toggle(id).await?)
        }
        (EntityKind::Anniversary, ToggleField::Pin) => {
            to_value(&state.anniversaries_service.toggle_pin(id).await?)
        }
        (kind, field) => Err(AppError::validation(format!(
            "{:?} cannot be toggled on a {}",
            field, kind
        ))),
    }
}

/// Delete an entity by id
pub async fn delete_entity(
    state: &AppState,
    _session: &AuthSession,
    kind: &str,
    id: &str,
) -> Result<()> {
    match kind.parse()? {
        EntityKind::Talk => state.talks_service.delete(id).await,
        EntityKind::Todo => state.todos_service.delete(id).await,
        EntityKind::Anniversary => state.anniversaries_service.delete(id).await,
    }
}
