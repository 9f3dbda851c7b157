//! Sidebar statistics commands

use crate::app::AppState;
use crate::error::Result;
use crate::services::{SiteStats, TagCount};

/// Talk, media and tag counts (public)
pub async fn get_stats(state: &AppState) -> Result<SiteStats> {
    state.stats_service.stats().await
}

/// Tag usage, most used first (public)
pub async fn get_tags(state: &AppState) -> Result<Vec<TagCount>> {
    state.stats_service.tags().await
}
