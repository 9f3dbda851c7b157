//! Storage module
//!
//! Scoped on-disk files handed between request handlers and services.

pub mod upload;

pub use upload::StagedUpload;
