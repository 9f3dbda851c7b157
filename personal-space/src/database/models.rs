//! Document models
//!
//! Rust structs representing the persisted JSON document and its entities.
//! Field names are camelCase on disk to stay compatible with the browser UI.

use super::timestamps::{calendar_date, lenient, lenient_option};
use crate::config::MAX_TODO_CONTENT_LENGTH;
use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Generate a process-unique entity id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Login account. The hash is an Argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(alias = "password")]
    pub password_hash: String,
}

/// A short post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Talk {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(with = "lenient")]
    pub created_at: DateTime<Utc>,
}

/// Todo priority. Unknown stored values read as `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    /// Sort rank, lower sorts first
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Normal => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            other => Err(AppError::validation(format!(
                "invalid priority '{other}', expected one of: high, normal, low"
            ))),
        }
    }
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A todo item.
///
/// `completed_at` is set exactly when `completed` is true. `end_time` is the
/// deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, with = "lenient_option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "lenient_option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, with = "lenient_option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(with = "lenient")]
    pub created_at: DateTime<Utc>,
}

/// Anniversary category. Unknown values read as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum AnniversaryCategory {
    Birthday,
    Love,
    Work,
    Study,
    Festival,
    #[default]
    Other,
}

impl AnniversaryCategory {
    /// Lenient parse: anything unrecognized is `Other`
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("birthday") => AnniversaryCategory::Birthday,
            Some("love") => AnniversaryCategory::Love,
            Some("work") => AnniversaryCategory::Work,
            Some("study") => AnniversaryCategory::Study,
            Some("festival") => AnniversaryCategory::Festival,
            _ => AnniversaryCategory::Other,
        }
    }
}

impl From<String> for AnniversaryCategory {
    fn from(raw: String) -> Self {
        Self::parse_lenient(Some(&raw))
    }
}

/// A yearly recurring date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anniversary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub category: AnniversaryCategory,
    #[serde(default)]
    pub pinned: bool,
}

fn default_site_title() -> String {
    "Perimsx".to_string()
}

fn default_site_icon() -> String {
    "fas fa-meteor".to_string()
}

fn default_site_favicon() -> String {
    "/favicon.svg".to_string()
}

fn default_user_nickname() -> String {
    "Perimsx".to_string()
}

fn default_user_avatar() -> String {
    "https://ui-avatars.com/api/?name=P&background=5c8df0&color=fff&size=128".to_string()
}

fn default_badge_icon() -> String {
    "ri-verified-badge-fill".to_string()
}

fn default_badge_color() -> String {
    "#1da1f2".to_string()
}

fn default_primary_color() -> String {
    "#5c8df0".to_string()
}

fn default_verified() -> bool {
    true
}

/// Site and profile display settings.
///
/// Known fields get defaults; any other key is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_site_title")]
    pub site_title: String,
    #[serde(default = "default_site_icon")]
    pub site_icon: String,
    #[serde(default = "default_site_favicon")]
    pub site_favicon: String,
    #[serde(default = "default_user_nickname")]
    pub user_nickname: String,
    #[serde(default = "default_user_avatar")]
    pub user_avatar: String,
    #[serde(default)]
    pub user_bio: String,
    #[serde(default = "default_badge_icon")]
    pub badge_icon: String,
    #[serde(default = "default_badge_color")]
    pub badge_color: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_verified")]
    pub verified: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site_title: default_site_title(),
            site_icon: default_site_icon(),
            site_favicon: default_site_favicon(),
            user_nickname: default_user_nickname(),
            user_avatar: default_user_avatar(),
            user_bio: String::new(),
            badge_icon: default_badge_icon(),
            badge_color: default_badge_color(),
            primary_color: default_primary_color(),
            verified: default_verified(),
            extra: Map::new(),
        }
    }
}

/// The whole persisted dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub talks: Vec<Talk>,
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub anniversaries: Vec<Anniversary>,
    /// Opaque list kept for the UI; no lifecycle rules apply to it
    #[serde(default)]
    pub favorites: Vec<Value>,
    #[serde(default)]
    pub settings: Settings,
}

/// Names of the sequence collections inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionName {
    Users,
    Talks,
    Todos,
    Anniversaries,
    Favorites,
}

impl CollectionName {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionName::Users => "users",
            CollectionName::Talks => "talks",
            CollectionName::Todos => "todos",
            CollectionName::Anniversaries => "anniversaries",
            CollectionName::Favorites => "favorites",
        }
    }
}

impl FromStr for CollectionName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "users" => Ok(CollectionName::Users),
            "talks" => Ok(CollectionName::Talks),
            "todos" => Ok(CollectionName::Todos),
            "anniversaries" => Ok(CollectionName::Anniversaries),
            "favorites" => Ok(CollectionName::Favorites),
            other => Err(AppError::validation(format!("unknown collection '{other}'"))),
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity type stored as one named sequence of the [`Document`]
pub trait Collection: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const NAME: CollectionName;
    /// Human-readable entity name used in not-found errors
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn items(doc: &Document) -> &Vec<Self>;
    fn items_mut(doc: &mut Document) -> &mut Vec<Self>;
}

macro_rules! impl_collection {
    ($ty:ty, $name:expr, $kind:literal, $field:ident) => {
        impl Collection for $ty {
            const NAME: CollectionName = $name;
            const KIND: &'static str = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn items(doc: &Document) -> &Vec<Self> {
                &doc.$field
            }

            fn items_mut(doc: &mut Document) -> &mut Vec<Self> {
                &mut doc.$field
            }
        }
    };
}

impl_collection!(User, CollectionName::Users, "User", users);
impl_collection!(Talk, CollectionName::Talks, "Talk", talks);
impl_collection!(Todo, CollectionName::Todos, "Todo", todos);
impl_collection!(Anniversary, CollectionName::Anniversaries, "Anniversary", anniversaries);

impl Document {
    /// One collection as untyped JSON values
    pub fn collection_values(&self, name: CollectionName) -> Result<Vec<Value>> {
        let values = match name {
            CollectionName::Users => to_values(&self.users)?,
            CollectionName::Talks => to_values(&self.talks)?,
            CollectionName::Todos => to_values(&self.todos)?,
            CollectionName::Anniversaries => to_values(&self.anniversaries)?,
            CollectionName::Favorites => self.favorites.clone(),
        };
        Ok(values)
    }

    /// Replace one collection from untyped JSON values, converting each
    /// entry into its typed entity first.
    ///
    /// Todos must also pass the creation rules and carry `completedAt`
    /// exactly when `completed` is true; nothing is replaced otherwise.
    pub fn replace_collection_values(
        &mut self,
        name: CollectionName,
        items: Vec<Value>,
    ) -> Result<()> {
        match name {
            CollectionName::Users => self.users = from_values(name, items)?,
            CollectionName::Talks => self.talks = from_values(name, items)?,
            CollectionName::Todos => self.todos = todos_from_values(items)?,
            CollectionName::Anniversaries => self.anniversaries = from_values(name, items)?,
            CollectionName::Favorites => self.favorites = items,
        }
        Ok(())
    }
}

fn to_values<T: Serialize>(items: &[T]) -> Result<Vec<Value>> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(AppError::from))
        .collect()
}

fn todos_from_values(items: Vec<Value>) -> Result<Vec<Todo>> {
    let name = CollectionName::Todos;

    // Stored priorities read leniently, so check the raw strings first
    for (index, item) in items.iter().enumerate() {
        match item.get("priority").and_then(Value::as_str) {
            None | Some("") => {}
            Some(raw) => {
                raw.parse::<Priority>().map_err(|e| entry_error(name, index, e))?;
            }
        }
    }

    let todos: Vec<Todo> = from_values(name, items)?;
    for (index, todo) in todos.iter().enumerate() {
        if let Some(problem) = todo_problem(todo) {
            return Err(AppError::validation(format!(
                "invalid {name} entry at index {index}: {problem}"
            )));
        }
    }
    Ok(todos)
}

fn todo_problem(todo: &Todo) -> Option<String> {
    let length = todo.content.chars().count();
    if length > MAX_TODO_CONTENT_LENGTH {
        return Some(format!(
            "content is too long ({length} characters, maximum {MAX_TODO_CONTENT_LENGTH})"
        ));
    }
    if todo.content.trim().is_empty() {
        return Some("content must not be empty".to_string());
    }
    if todo.completed != todo.completed_at.is_some() {
        return Some("completedAt must be set exactly when completed is true".to_string());
    }
    None
}

fn entry_error(name: CollectionName, index: usize, error: AppError) -> AppError {
    let reason = match error {
        AppError::Validation(message) => message,
        other => other.to_string(),
    };
    AppError::validation(format!("invalid {name} entry at index {index}: {reason}"))
}

fn from_values<T: DeserializeOwned>(name: CollectionName, items: Vec<Value>) -> Result<Vec<T>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| {
                AppError::validation(format!("invalid {name} entry at index {index}: {e}"))
            })
        })
        .collect()
}

// ===== Creation requests =====

/// Fields accepted when creating a talk
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTalkRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Comma separated image URLs, merged before `images`
    #[serde(default)]
    pub image_urls: Option<String>,
    #[serde(default, alias = "videoUrl")]
    pub video: Option<String>,
}

/// Fields accepted when creating a todo
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, with = "lenient_option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "lenient_option")]
    pub end_time: Option<DateTime<Utc>>,
}

/// Fields accepted when creating an anniversary
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateAnniversaryRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub category: Option<String>,
}
