//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::AppConfig;
use crate::database::{open_store, CollectionStore};
use crate::error::Result;
use crate::services::auth::seed_admin_user;
use crate::services::{
    AnniversariesService, AuthService, BackupService, SettingsService, StatsService, TalksService,
    TodosService,
};

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: CollectionStore,
    pub auth_service: AuthService,
    pub talks_service: TalksService,
    pub todos_service: TodosService,
    pub anniversaries_service: AnniversariesService,
    pub settings_service: SettingsService,
    pub stats_service: StatsService,
    pub backup_service: BackupService,
}

impl AppState {
    pub fn new(config: AppConfig, store: CollectionStore) -> Self {
        Self {
            auth_service: AuthService::new(store.clone()),
            talks_service: TalksService::new(store.clone()),
            todos_service: TodosService::new(store.clone()),
            anniversaries_service: AnniversariesService::new(store.clone()),
            settings_service: SettingsService::new(store.clone()),
            stats_service: StatsService::new(store.clone()),
            backup_service: BackupService::new(store.clone(), config.backups_dir()),
            store,
            config,
        }
    }
}

/// Application setup - called once on startup
pub async fn setup(config: AppConfig) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("Data directory: {:?}", config.data_dir());

    // Create necessary directories
    tokio::fs::create_dir_all(config.data_dir()).await?;
    tokio::fs::create_dir_all(config.backups_dir()).await?;
    tokio::fs::create_dir_all(config.uploads_dir()).await?;

    let (store, report) = open_store(&config.document_path(), seed_admin_user).await?;
    if report.seeded_admin {
        tracing::warn!("Default admin account created; change its password after first login");
    }

    let state = AppState::new(config, store);

    tracing::info!("Application initialized successfully");

    Ok(state)
}
