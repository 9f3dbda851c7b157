//! Talks service
//!
//! Talks are immutable after creation except for their pin and favorite flags.

use crate::database::{new_id, CollectionStore, CreateTalkRequest, Document, Talk};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};

/// Pinned first, then newest first
pub fn sort_talks(talks: &mut [Talk]) {
    talks.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Normalize a creation request into a new talk
pub fn build_talk(req: CreateTalkRequest, now: DateTime<Utc>) -> Talk {
    let mut tags: Vec<String> = Vec::new();
    for tag in req.tags {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    let images = req
        .image_urls
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::to_string)
        .chain(req.images)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();

    let video = req
        .video
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());

    Talk {
        id: new_id(),
        title: req.title.trim().to_string(),
        content: req.content.trim().to_string(),
        tags,
        location: req.location.trim().to_string(),
        images,
        video,
        is_pinned: false,
        is_favorite: false,
        created_at: now,
    }
}

/// Which talk flag to flip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TalkFlag {
    Pinned,
    Favorite,
}

/// Service for managing talks
#[derive(Clone)]
pub struct TalksService {
    store: CollectionStore,
}

impl TalksService {
    pub fn new(store: CollectionStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, req: CreateTalkRequest) -> Result<Talk> {
        let talk = build_talk(req, Utc::now());

        let created = talk.clone();
        self.store
            .update(move |doc| {
                doc.talks.push(talk);
                Ok(())
            })
            .await?;

        tracing::info!("Talk created: {}", created.id);
        Ok(created)
    }

    /// All talks in listing order
    pub async fn list(&self) -> Result<Vec<Talk>> {
        let mut talks: Vec<Talk> = self.store.get().await?;
        sort_talks(&mut talks);
        Ok(talks)
    }

    /// Favorited talks in listing order
    pub async fn list_favorites(&self) -> Result<Vec<Talk>> {
        let mut talks = self.list().await?;
        talks.retain(|t| t.is_favorite);
        Ok(talks)
    }

    pub async fn toggle_pin(&self, id: &str) -> Result<Talk> {
        self.toggle(id, TalkFlag::Pinned).await
    }

    pub async fn toggle_favorite(&self, id: &str) -> Result<Talk> {
        self.toggle(id, TalkFlag::Favorite).await
    }

    /// Flip one flag and return the updated talk
    pub async fn toggle(&self, id: &str, flag: TalkFlag) -> Result<Talk> {
        let talk = self
            .store
            .update(|doc| {
                let talk = find_talk(doc, id)?;
                match flag {
                    TalkFlag::Pinned => talk.is_pinned = !talk.is_pinned,
                    TalkFlag::Favorite => talk.is_favorite = !talk.is_favorite,
                }
                Ok(talk.clone())
            })
            .await?;

        tracing::debug!(
            "Talk {} pinned={} favorite={}",
            talk.id,
            talk.is_pinned,
            talk.is_favorite
        );
        Ok(talk)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store
            .update(|doc| {
                find_talk(doc, id)?;
                doc.talks.retain(|t| t.id != id);
                Ok(())
            })
            .await?;

        tracing::info!("Talk deleted: {}", id);
        Ok(())
    }
}

fn find_talk<'a>(doc: &'a mut Document, id: &str) -> Result<&'a mut Talk> {
    doc.talks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| AppError::not_found("Talk", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::timestamps::parse_timestamp;
    use tempfile::TempDir;

    fn create_test_service() -> (TalksService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::new(temp_dir.path().join("db.json"));
        (TalksService::new(store), temp_dir)
    }

    fn talk(id: &str, pinned: bool, created_at: &str) -> Talk {
        Talk {
            id: id.to_string(),
            title: String::new(),
            content: id.to_string(),
            tags: Vec::new(),
            location: String::new(),
            images: Vec::new(),
            video: None,
            is_pinned: pinned,
            is_favorite: false,
            created_at: parse_timestamp(created_at).unwrap(),
        }
    }

    #[test]
    fn test_sort_pinned_then_newest() {
        let mut talks = vec![
            talk("old", false, "2024-01-01"),
            talk("pinned_old", true, "2023-01-01"),
            talk("new", false, "2025-01-01"),
            talk("pinned_new", true, "2024-06-01"),
        ];
        sort_talks(&mut talks);

        let order: Vec<&str> = talks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["pinned_new", "pinned_old", "new", "old"]);
    }

    #[test]
    fn test_build_normalizes_media_and_tags() {
        let req = CreateTalkRequest {
            content: "  sunset  ".to_string(),
            tags: vec!["travel".into(), " travel ".into(), "".into(), "sea".into()],
            images: vec!["/uploads/a.png".into(), "  ".into()],
            image_urls: Some("https://x/1.png, ,https://x/2.png".to_string()),
            video: Some("   ".to_string()),
            ..Default::default()
        };

        let built = build_talk(req, Utc::now());

        assert_eq!(built.content, "sunset");
        assert_eq!(built.tags, vec!["travel", "sea"]);
        assert_eq!(
            built.images,
            vec!["https://x/1.png", "https://x/2.png", "/uploads/a.png"]
        );
        assert!(built.video.is_none());
        assert!(!built.is_pinned);
        assert!(!built.is_favorite);
    }

    #[tokio::test]
    async fn test_toggle_flags() {
        let (service, _temp) = create_test_service();
        let created = service
            .create(CreateTalkRequest {
                content: "hello".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(service.toggle_pin(&created.id).await.unwrap().is_pinned);
        let favorite = service.toggle_favorite(&created.id).await.unwrap();
        assert!(favorite.is_favorite);
        assert!(favorite.is_pinned);

        assert_eq!(service.list_favorites().await.unwrap().len(), 1);
        assert!(!service.toggle_pin(&created.id).await.unwrap().is_pinned);
    }

    #[tokio::test]
    async fn test_delete() {
        let (service, _temp) = create_test_service();
        let created = service.create(CreateTalkRequest::default()).await.unwrap();

        service.delete(&created.id).await.unwrap();
        assert!(service.list().await.unwrap().is_empty());

        let result = service.delete(&created.id).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }
}
