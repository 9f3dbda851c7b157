//! Database module
//!
//! This module provides all persistence functionality including:
//! - Document bootstrap and legacy repair
//! - Model definitions
//! - Collection store for read/modify/write of the JSON document

pub mod models;
pub mod repository;
pub mod schema;
pub mod timestamps;

pub use models::*;
pub use repository::{CollectionStore, StoreGuard};
pub use schema::{initialize_document, BootstrapReport};

use crate::error::Result;
use std::path::Path;

/// Open the document at `db_path` and make sure it is initialized.
pub async fn open_store<F>(
    db_path: &Path,
    make_admin: F,
) -> Result<(CollectionStore, BootstrapReport)>
where
    F: FnOnce() -> Result<User>,
{
    tracing::info!("Opening document store at: {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let store = CollectionStore::new(db_path.to_path_buf());
    let report = initialize_document(&store, make_admin).await?;

    tracing::info!("Document store ready");

    Ok((store, report))
}
