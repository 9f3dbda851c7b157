//! Staged uploads
//!
//! An upload handler writes the incoming file into the uploads directory and
//! hands a [`StagedUpload`] to the import path. The staged file is removed
//! when the handle is dropped, whether the import succeeded or not.

use crate::config::{ALLOWED_UPLOAD_EXTENSION, MAX_UPLOAD_SIZE_BYTES};
use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// A file staged on disk for one request
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    original_name: String,
}

impl StagedUpload {
    /// Take ownership of a file another component already staged
    pub fn new(path: PathBuf, original_name: impl Into<String>) -> Self {
        Self {
            path,
            original_name: original_name.into(),
        }
    }

    /// Write `data` under `uploads_dir` with a unique name
    pub async fn stage(uploads_dir: &Path, original_name: &str, data: &[u8]) -> Result<Self> {
        fs::create_dir_all(uploads_dir).await?;

        let extension = Path::new(original_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        let path = uploads_dir.join(format!("{}{}", Uuid::new_v4(), extension));

        // Owned from here on, so a failed write still cleans up
        let staged = Self::new(path, original_name);
        let mut file = fs::File::create(&staged.path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        tracing::debug!("Staged upload {:?} ({} bytes)", staged.path, data.len());
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Check the declared name and the staged size, then read the bytes
    pub async fn read_json_bytes(&self) -> Result<Vec<u8>> {
        let is_json = Path::new(&self.original_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ALLOWED_UPLOAD_EXTENSION));
        if !is_json {
            return Err(AppError::validation(format!(
                "only .{} files can be imported, got '{}'",
                ALLOWED_UPLOAD_EXTENSION, self.original_name
            )));
        }

        let size = fs::metadata(&self.path).await?.len();
        if size > MAX_UPLOAD_SIZE_BYTES {
            return Err(AppError::validation(format!(
                "upload is {} bytes, limit is {} bytes",
                size, MAX_UPLOAD_SIZE_BYTES
            )));
        }

        Ok(fs::read(&self.path).await?)
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed staged upload {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove staged upload {:?}: {}", self.path, e),
        }
    }
}
