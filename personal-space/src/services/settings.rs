//! Settings service
//!
//! Site and profile settings live inside the document. Updates are partial:
//! the patch is merged over the stored settings rather than replacing them.

use crate::database::{CollectionStore, Settings};
use crate::error::{AppError, Result};
use serde_json::Value;

/// Merge a JSON object patch over `current`.
///
/// A `null` value resets that key to its default.
pub fn merge_settings(current: &Settings, patch: Value) -> Result<Settings> {
    let Value::Object(patch) = patch else {
        return Err(AppError::validation("settings update must be a JSON object"));
    };

    let mut merged = serde_json::to_value(current)?;
    if let Some(fields) = merged.as_object_mut() {
        for (key, value) in patch {
            if value.is_null() {
                fields.remove(&key);
            } else {
                fields.insert(key, value);
            }
        }
    }

    serde_json::from_value(merged)
        .map_err(|e| AppError::validation(format!("invalid settings update: {}", e)))
}

/// Service for managing site settings
#[derive(Clone)]
pub struct SettingsService {
    store: CollectionStore,
}

impl SettingsService {
    pub fn new(store: CollectionStore) -> Self {
        Self { store }
    }

    /// Load settings; defaults apply to any field not stored
    pub async fn load(&self) -> Result<Settings> {
        self.store.settings().await
    }

    /// Merge `patch` into the stored settings and return the result
    pub async fn update(&self, patch: Value) -> Result<Settings> {
        let settings = self
            .store
            .update(move |doc| {
                doc.settings = merge_settings(&doc.settings, patch)?;
                Ok(doc.settings.clone())
            })
            .await?;

        tracing::info!("Settings updated");
        Ok(settings)
    }
}
