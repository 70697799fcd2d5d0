//! Prayer-related commands
//!
//! Listing, viewing and answering prayers for the calling identity.

use crate::app::AppState;
use crate::database::{
    Identity, NewPrayer, Prayer, PrayerFilter, PrayerPage, PrayerStatus, UpdatePrayerRequest,
};
use crate::error::{AppError, Result};
use crate::services::contact::ContactCard;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Query parameters for listing prayers, as they arrive from a caller
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPrayersQuery {
    /// "answered", "unanswered" or "all"
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub team_member: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// A prayer plus the ways to follow up with its petitioner
#[derive(Debug, Clone, Serialize)]
pub struct PrayerDetail {
    #[serde(flatten)]
    pub prayer: Prayer,
    pub contact: ContactCard,
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC)
fn parse_filter_date(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| AppError::InvalidInput(format!("Invalid {}: {}", field, value)))
}

impl ListPrayersQuery {
    pub fn into_filter(self) -> Result<PrayerFilter> {
        Ok(PrayerFilter {
            status: self
                .status
                .as_deref()
                .map(PrayerStatus::parse)
                .unwrap_or_default(),
            date_from: parse_filter_date("date_from", self.date_from.as_deref())?,
            date_to: parse_filter_date("date_to", self.date_to.as_deref())?,
            team_member: self.team_member,
            page: self.page,
            limit: self.limit,
        })
    }
}

/// List the caller's prayers with filters and paging
pub async fn list_prayers(
    state: &AppState,
    identity: &Identity,
    query: ListPrayersQuery,
) -> Result<PrayerPage> {
    let filter = query.into_filter()?;
    state.prayers_service.list_prayers(identity, &filter).await
}

/// Get one prayer with contact links
pub async fn get_prayer(state: &AppState, identity: &Identity, id: &str) -> Result<PrayerDetail> {
    let prayer = state.prayers_service.get_prayer(identity, id).await?;
    let contact = ContactCard::for_prayer(&prayer);
    Ok(PrayerDetail { prayer, contact })
}

pub async fn create_prayer(state: &AppState, identity: &Identity, req: NewPrayer) -> Result<Prayer> {
    state.prayers_service.create_prayer(identity, req).await
}

pub async fn update_prayer(
    state: &AppState,
    identity: &Identity,
    id: &str,
    req: UpdatePrayerRequest,
) -> Result<Prayer> {
    state.prayers_service.update_prayer(identity, id, req).await
}

pub async fn mark_answered(
    state: &AppState,
    identity: &Identity,
    id: &str,
    answered: bool,
) -> Result<Prayer> {
    state.prayers_service.mark_answered(identity, id, answered).await
}
