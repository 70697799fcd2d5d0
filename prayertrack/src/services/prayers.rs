//! Prayers service
//!
//! Business logic for recording, listing and answering prayers.
//! Every call is scoped to the identity passed in.

use crate::config::{DEFAULT_PAGE_LIMIT, DEFAULT_PRAYER_TITLE, MAX_PAGE_LIMIT};
use crate::database::{
    Identity, NewPrayer, Pagination, Prayer, PrayerFilter, PrayerPage, Repository,
    UpdatePrayerRequest,
};
use crate::error::{AppError, Result};

/// Service for managing prayers
#[derive(Clone)]
pub struct PrayersService {
    repo: Repository,
}

impl PrayersService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Record a prayer by hand; the user is created on first use
    pub async fn create_prayer(&self, identity: &Identity, mut req: NewPrayer) -> Result<Prayer> {
        if req.content.trim().is_empty() {
            return Err(AppError::InvalidInput("Prayer content is required".to_string()));
        }
        if req.title.trim().is_empty() {
            req.title = DEFAULT_PRAYER_TITLE.to_string();
        }

        self.repo.ensure_user(identity).await?;
        let prayer = self.repo.create_prayer(&identity.user_id, req).await?;

        tracing::info!("Prayer created: {}", prayer.id);
        Ok(prayer)
    }

    pub async fn get_prayer(&self, identity: &Identity, id: &str) -> Result<Prayer> {
        self.repo.get_prayer(&identity.user_id, id).await
    }

    /// One page of the user's prayers, newest first
    pub async fn list_prayers(&self, identity: &Identity, filter: &PrayerFilter) -> Result<PrayerPage> {
        let page = filter.page.unwrap_or(1).max(1);
        let limit = filter.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        let offset = u64::from(page - 1) * u64::from(limit);

        let total_count = self.repo.count_prayers(&identity.user_id, filter).await?;
        let prayers = self
            .repo
            .list_prayers(&identity.user_id, filter, limit, offset)
            .await?;

        Ok(PrayerPage {
            prayers,
            pagination: Pagination::new(page, limit, u32::try_from(total_count).unwrap_or(u32::MAX)),
        })
    }

    pub async fn update_prayer(
        &self,
        identity: &Identity,
        id: &str,
        req: UpdatePrayerRequest,
    ) -> Result<Prayer> {
        if req.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(AppError::InvalidInput("Prayer content cannot be empty".to_string()));
        }
        if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::InvalidInput("Prayer title cannot be empty".to_string()));
        }

        tracing::debug!("Updating prayer: {}", id);
        self.repo.update_prayer(&identity.user_id, id, req).await
    }

    pub async fn mark_answered(&self, identity: &Identity, id: &str, answered: bool) -> Result<Prayer> {
        let prayer = self
            .update_prayer(
                identity,
                id,
                UpdatePrayerRequest {
                    is_answered: Some(answered),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!("Prayer {} marked answered={}", id, answered);
        Ok(prayer)
    }
}
