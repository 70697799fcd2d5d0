//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde so commands can hand them straight to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The authenticated user an operation runs on behalf of.
///
/// Authentication happens elsewhere; this is passed into every
/// store read and write so nothing depends on ambient session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            name: None,
        }
    }
}

/// Owner of prayer records
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A stored prayer request
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Prayer {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub petitioner: Option<String>,
    /// Free text such as "email", "text me", "either"
    pub contact_preference: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub location: Option<String>,
    pub is_answered: bool,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create prayer request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPrayer {
    pub title: String,
    pub content: String,
    pub petitioner: Option<String>,
    pub contact_preference: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub location: Option<String>,
    pub is_answered: bool,
    pub is_private: bool,
    /// Defaults to the insert time
    pub created_at: Option<DateTime<Utc>>,
}

/// Update prayer request; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePrayerRequest {
    pub is_answered: Option<bool>,
    pub is_private: Option<bool>,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Content and petitioner only, enough to rebuild import signatures
#[derive(Debug, Clone, FromRow)]
pub struct PrayerSignatureRow {
    pub content: String,
    pub petitioner: Option<String>,
}

/// Answered-state filter for listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerStatus {
    #[default]
    All,
    Answered,
    Unanswered,
}

impl PrayerStatus {
    /// Unknown values fall back to `All`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "answered" => Self::Answered,
            "unanswered" => Self::Unanswered,
            _ => Self::All,
        }
    }
}

/// Filters and paging for listing a user's prayers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrayerFilter {
    #[serde(default)]
    pub status: PrayerStatus,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Case-insensitive substring of the petitioner name
    pub team_member: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Paging metadata returned alongside a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub limit: u32,
}

impl Pagination {
    pub fn new(current_page: u32, limit: u32, total_count: u32) -> Self {
        let total_pages = total_count.div_ceil(limit.max(1));
        Self {
            current_page,
            total_pages,
            total_count,
            has_next_page: current_page < total_pages,
            has_prev_page: current_page > 1,
            limit,
        }
    }
}

/// One page of prayers
#[derive(Debug, Clone, Serialize)]
pub struct PrayerPage {
    pub prayers: Vec<Prayer>,
    pub pagination: Pagination,
}
