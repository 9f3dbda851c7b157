//! Stats service
//!
//! Read-only aggregates over talks for the profile sidebar.

use crate::database::{CollectionStore, Talk};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStats {
    pub talk_count: usize,
    /// Images plus one per video
    pub media_count: usize,
    /// Distinct tags
    pub tag_count: usize,
    /// Whole days since the oldest talk
    pub running_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

pub fn compute_stats(talks: &[Talk], now: DateTime<Utc>) -> SiteStats {
    let media_count = talks
        .iter()
        .map(|t| t.images.len() + usize::from(t.video.is_some()))
        .sum();

    let tag_count = talks
        .iter()
        .flat_map(|t| t.tags.iter())
        .collect::<HashSet<_>>()
        .len();

    let running_days = talks
        .iter()
        .map(|t| t.created_at)
        .min()
        .map(|oldest| (now - oldest).num_days().max(0))
        .unwrap_or(0);

    SiteStats {
        talk_count: talks.len(),
        media_count,
        tag_count,
        running_days,
    }
}

/// Tag usage, most used first, ties by name
pub fn count_tags(talks: &[Talk]) -> Vec<TagCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tag in talks.iter().flat_map(|t| t.tags.iter()) {
        *counts.entry(tag.as_str()).or_default() += 1;
    }

    let mut tags: Vec<TagCount> = counts
        .into_iter()
        .map(|(name, count)| TagCount {
            name: name.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps the BTreeMap's name order among equal counts
    tags.sort_by(|a, b| b.count.cmp(&a.count));
    tags
}

#[derive(Clone)]
pub struct StatsService {
    store: CollectionStore,
}

impl StatsService {
    pub fn new(store: CollectionStore) -> Self {
        Self { store }
    }

    pub async fn stats(&self) -> Result<SiteStats> {
        let talks: Vec<Talk> = self.store.get().await?;
        Ok(compute_stats(&talks, Utc::now()))
    }

    pub async fn tags(&self) -> Result<Vec<TagCount>> {
        let talks: Vec<Talk> = self.store.get().await?;
        Ok(count_tags(&talks))
    }
}
