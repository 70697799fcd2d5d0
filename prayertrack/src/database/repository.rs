//! Repository layer for database operations
//!
//! CRUD operations for users and prayers. Every prayer query is scoped
//! to the owning user id.

use super::models::*;
use crate::config::{FALLBACK_USER_EMAIL, FALLBACK_USER_NAME};
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the user if absent; existing users are left untouched
    pub async fn ensure_user(&self, identity: &Identity) -> Result<User> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO users (id, email, name, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&identity.user_id)
        .bind(identity.email.as_deref().unwrap_or(FALLBACK_USER_EMAIL))
        .bind(identity.name.as_deref().unwrap_or(FALLBACK_USER_NAME))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            tracing::info!("Created user: {}", identity.user_id);
        }

        self.get_user(&identity.user_id)
            .await?
            .ok_or_else(|| AppError::Generic(format!("User vanished after insert: {}", identity.user_id)))
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Create a prayer owned by `user_id`
    pub async fn create_prayer(&self, user_id: &str, req: NewPrayer) -> Result<Prayer> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let prayer = sqlx::query_as::<_, Prayer>(
            r#"
            INSERT INTO prayers (
                id, user_id, title, content, petitioner, petitioner_search,
                contact_preference, contact_phone, contact_email, location,
                is_answered, is_private, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(&req.petitioner)
        .bind(req.petitioner.as_deref().map(fold_case))
        .bind(&req.contact_preference)
        .bind(&req.contact_phone)
        .bind(&req.contact_email)
        .bind(&req.location)
        .bind(req.is_answered)
        .bind(req.is_private)
        .bind(req.created_at.unwrap_or(now))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created prayer: {}", id);
        Ok(prayer)
    }

    /// Get a prayer by ID, only if it belongs to `user_id`
    pub async fn get_prayer(&self, user_id: &str, id: &str) -> Result<Prayer> {
        sqlx::query_as::<_, Prayer>("SELECT * FROM prayers WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::PrayerNotFound(id.to_string()))
    }

    /// Apply the fields present in `req` and bump `updated_at`
    pub async fn update_prayer(
        &self,
        user_id: &str,
        id: &str,
        req: UpdatePrayerRequest,
    ) -> Result<Prayer> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE prayers SET updated_at = ");
        query.push_bind(Utc::now());

        if let Some(is_answered) = req.is_answered {
            query.push(", is_answered = ").push_bind(is_answered);
        }
        if let Some(is_private) = req.is_private {
            query.push(", is_private = ").push_bind(is_private);
        }
        if let Some(title) = req.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(content) = req.content {
            query.push(", content = ").push_bind(content);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id.to_string())
            .push(" AND user_id = ")
            .push_bind(user_id.to_string());

        let rows_affected = query.build().execute(&self.pool).await?.rows_affected();

        if rows_affected == 0 {
            return Err(AppError::PrayerNotFound(id.to_string()));
        }

        tracing::debug!("Updated prayer: {}", id);
        self.get_prayer(user_id, id).await
    }

    /// Content and petitioner of every prayer the user owns
    pub async fn list_prayer_signatures(&self, user_id: &str) -> Result<Vec<PrayerSignatureRow>> {
        let rows = sqlx::query_as::<_, PrayerSignatureRow>(
            "SELECT content, petitioner FROM prayers WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Count prayers matching `filter`, ignoring paging
    pub async fn count_prayers(&self, user_id: &str, filter: &PrayerFilter) -> Result<i64> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM prayers");
        push_filters(&mut query, user_id, filter);

        let count = query.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Newest-first page of prayers matching `filter`
    pub async fn list_prayers(
        &self,
        user_id: &str,
        filter: &PrayerFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Prayer>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM prayers");
        push_filters(&mut query, user_id, filter);

        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let prayers = query.build_query_as::<Prayer>().fetch_all(&self.pool).await?;
        Ok(prayers)
    }
}

/// Append the WHERE clause shared by listing and counting
fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, user_id: &str, filter: &PrayerFilter) {
    query.push(" WHERE user_id = ").push_bind(user_id.to_string());

    match filter.status {
        PrayerStatus::Answered => {
            query.push(" AND is_answered = 1");
        }
        PrayerStatus::Unanswered => {
            query.push(" AND is_answered = 0");
        }
        PrayerStatus::All => {}
    }

    if let Some(from) = filter.date_from {
        query.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        query.push(" AND created_at <= ").push_bind(to);
    }

    if let Some(member) = filter.team_member.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        query
            .push(r" AND petitioner_search LIKE ")
            .push_bind(format!("%{}%", escape_like(&fold_case(member))))
            .push(r" ESCAPE '\'");
    }
}

/// Case folding used for `petitioner_search`, on write and on search alike
fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
