//! Personal Space library
//!
//! A single-owner journal store: talks, todos and anniversaries kept in one
//! JSON document, with lifecycle rules for each entity and a redacted
//! export/import path for backups.

pub mod app;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;
