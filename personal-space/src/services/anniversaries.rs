//! Anniversaries service
//!
//! Anniversaries recur yearly. The "upcoming" view measures each one against
//! its occurrence in the current year, so dates already passed this year have
//! a negative distance.

use crate::database::{
    new_id, timestamps::parse_date, Anniversary, AnniversaryCategory, CollectionStore,
    CreateAnniversaryRequest,
};
use crate::error::{AppError, Result};
use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;

/// An anniversary with its distance from today
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingAnniversary {
    #[serde(flatten)]
    pub anniversary: Anniversary,
    /// Days until this year's occurrence, negative once it has passed
    pub days_until: i64,
    /// Whole years since the original date
    pub years: i32,
}

/// The anniversary's month/day in `year`. Feb 29 falls back to Feb 28.
pub fn occurrence_in(date: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .unwrap_or(date)
}

/// Signed day distance from `today` to this year's occurrence
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (occurrence_in(date, today.year()) - today).num_days()
}

/// Whole years elapsed since `date`
pub fn years_since(date: NaiveDate, today: NaiveDate) -> i32 {
    let years = today.year() - date.year();
    if (today.month(), today.day()) < (date.month(), date.day()) {
        years - 1
    } else {
        years
    }
}

/// Pinned first, then ascending day distance
pub fn upcoming(anniversaries: Vec<Anniversary>, today: NaiveDate) -> Vec<UpcomingAnniversary> {
    let mut view: Vec<UpcomingAnniversary> = anniversaries
        .into_iter()
        .map(|anniversary| UpcomingAnniversary {
            days_until: days_until(anniversary.date, today),
            years: years_since(anniversary.date, today),
            anniversary,
        })
        .collect();

    view.sort_by(|a, b| {
        b.anniversary
            .pinned
            .cmp(&a.anniversary.pinned)
            .then_with(|| a.days_until.cmp(&b.days_until))
    });
    view
}

/// Validate a creation request and build the new anniversary
pub fn build_anniversary(req: CreateAnniversaryRequest) -> Result<Anniversary> {
    let date = parse_date(&req.date).ok_or_else(|| {
        AppError::validation(format!(
            "invalid anniversary date '{}', expected YYYY-MM-DD",
            req.date
        ))
    })?;

    Ok(Anniversary {
        id: new_id(),
        title: req.title.trim().to_string(),
        date,
        category: AnniversaryCategory::parse_lenient(req.category.as_deref()),
        pinned: false,
    })
}

/// Service for managing anniversaries
#[derive(Clone)]
pub struct AnniversariesService {
    store: CollectionStore,
}

impl AnniversariesService {
    pub fn new(store: CollectionStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, req: CreateAnniversaryRequest) -> Result<Anniversary> {
        let anniversary = build_anniversary(req)?;

        let created = anniversary.clone();
        self.store
            .update(move |doc| {
                doc.anniversaries.push(anniversary);
                Ok(())
            })
            .await?;

        tracing::info!("Anniversary created: {} ({:?})", created.id, created.category);
        Ok(created)
    }

    /// All anniversaries in stored order
    pub async fn list(&self) -> Result<Vec<Anniversary>> {
        self.store.get().await
    }

    /// Upcoming view relative to the local calendar date
    pub async fn upcoming(&self) -> Result<Vec<UpcomingAnniversary>> {
        self.upcoming_at(Local::now().date_naive()).await
    }

    pub async fn upcoming_at(&self, today: NaiveDate) -> Result<Vec<UpcomingAnniversary>> {
        Ok(upcoming(self.list().await?, today))
    }

    pub async fn toggle_pin(&self, id: &str) -> Result<Anniversary> {
        let anniversary = self
            .store
            .update(|doc| {
                let anniversary = doc
                    .anniversaries
                    .iter_mut()
                    .find(|a| a.id == id)
                    .ok_or_else(|| AppError::not_found("Anniversary", id))?;
                anniversary.pinned = !anniversary.pinned;
                Ok(anniversary.clone())
            })
            .await?;

        tracing::debug!("Anniversary {} pinned={}", anniversary.id, anniversary.pinned);
        Ok(anniversary)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store
            .update(|doc| {
                let before = doc.anniversaries.len();
                doc.anniversaries.retain(|a| a.id != id);
                if doc.anniversaries.len() == before {
                    return Err(AppError::not_found("Anniversary", id));
                }
                Ok(())
            })
            .await?;

        tracing::info!("Anniversary deleted: {}", id);
        Ok(())
    }
}
