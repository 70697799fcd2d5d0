//! Spreadsheet sync
//!
//! Imports recent spreadsheet rows as prayers for one user.
//!
//! ## Flow
//!
//! ```text
//! SheetReader::fetch ──► Reconciler::reconcile ──► PrayerStore
//!   (candidate sheets,      (signature set,          (ensure user,
//!    recency filter)         batches of N)            one insert per row)
//! ```
//!
//! A row is identified by its signature (`content|petitioner`). Rows whose
//! signature is already stored, or was imported earlier in the same run,
//! are skipped. Inserts within a batch run concurrently; the next batch
//! starts once every insert of the current one has settled. A failed insert
//! is logged and counted as skipped.

use crate::config::SYNC_BATCH_SIZE;
use crate::database::{Identity, NewPrayer, Prayer, Repository};
use crate::error::{AppError, Result};
use crate::services::settings::SyncSettings;
use crate::services::sheets::{signature, SheetPrayer, SheetReader, SheetSource, SpreadsheetInfo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Persistence needed by the reconciler
#[async_trait]
pub trait PrayerStore: Send + Sync {
    /// Signatures of every prayer the user already owns
    async fn existing_signatures(&self, user_id: &str) -> Result<HashSet<String>>;

    /// Create the user if absent
    async fn ensure_user(&self, identity: &Identity) -> Result<()>;

    async fn create_prayer(&self, user_id: &str, prayer: NewPrayer) -> Result<Prayer>;
}

#[async_trait]
impl PrayerStore for Repository {
    async fn existing_signatures(&self, user_id: &str) -> Result<HashSet<String>> {
        let rows = self.list_prayer_signatures(user_id).await?;
        Ok(rows
            .iter()
            .map(|row| signature(&row.content, row.petitioner.as_deref()))
            .collect())
    }

    async fn ensure_user(&self, identity: &Identity) -> Result<()> {
        Repository::ensure_user(self, identity).await.map(|_| ())
    }

    async fn create_prayer(&self, user_id: &str, prayer: NewPrayer) -> Result<Prayer> {
        Repository::create_prayer(self, user_id, prayer).await
    }
}

/// Counts from one reconcile run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub imported: usize,
    /// Duplicates plus failed inserts
    pub skipped: usize,
    /// Inserts that errored; already included in `skipped`
    pub failed: usize,
    pub total: usize,
    pub batches: usize,
}

enum RecordOutcome {
    Imported,
    Duplicate,
    Failed,
}

/// Writes rows that are not already stored, in bounded concurrent batches
pub struct Reconciler {
    store: Arc<dyn PrayerStore>,
    batch_size: usize,
}

impl Reconciler {
    pub fn new(store: Arc<dyn PrayerStore>) -> Self {
        Self {
            store,
            batch_size: SYNC_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub async fn reconcile(
        &self,
        identity: &Identity,
        records: &[SheetPrayer],
    ) -> Result<ReconcileOutcome> {
        let existing = self.store.existing_signatures(&identity.user_id).await?;
        debug!(
            user_id = %identity.user_id,
            existing = existing.len(),
            "Loaded existing prayer signatures"
        );

        self.store.ensure_user(identity).await?;

        let seen = Mutex::new(existing);
        let mut outcome = ReconcileOutcome {
            total: records.len(),
            ..Default::default()
        };

        for (batch_index, batch) in records.chunks(self.batch_size).enumerate() {
            debug!(batch_index, batch_size = batch.len(), "Importing batch");

            let results = join_all(
                batch
                    .iter()
                    .map(|record| self.import_record(identity, record, &seen)),
            )
            .await;

            for result in results {
                match result {
                    RecordOutcome::Imported => outcome.imported += 1,
                    RecordOutcome::Duplicate => outcome.skipped += 1,
                    RecordOutcome::Failed => {
                        outcome.skipped += 1;
                        outcome.failed += 1;
                    }
                }
            }
            outcome.batches += 1;
        }

        info!(
            user_id = %identity.user_id,
            imported = outcome.imported,
            skipped = outcome.skipped,
            failed = outcome.failed,
            total = outcome.total,
            "Reconcile finished"
        );

        Ok(outcome)
    }

    /// The signature is claimed before the insert so a colliding row in
    /// the same batch is skipped; a failed insert releases the claim.
    async fn import_record(
        &self,
        identity: &Identity,
        record: &SheetPrayer,
        seen: &Mutex<HashSet<String>>,
    ) -> RecordOutcome {
        let signature = record.signature();

        if !seen.lock().await.insert(signature.clone()) {
            debug!("Skipping duplicate prayer: {:?}", signature);
            return RecordOutcome::Duplicate;
        }

        match self
            .store
            .create_prayer(&identity.user_id, record.to_new_prayer())
            .await
        {
            Ok(prayer) => {
                debug!("Imported prayer {}", prayer.id);
                RecordOutcome::Imported
            }
            Err(e) => {
                warn!("Error creating prayer {:?}: {}", signature, e);
                seen.lock().await.remove(&signature);
                RecordOutcome::Failed
            }
        }
    }
}

/// Result of a sync request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub message: String,
    pub imported: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Whether a sync could run right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub configured: bool,
    pub connected: bool,
    pub available_prayers: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Spreadsheet import entry point
#[derive(Clone)]
pub struct SyncService {
    store: Arc<dyn PrayerStore>,
    source: Option<Arc<dyn SheetSource>>,
    settings: SyncSettings,
}

impl SyncService {
    /// `source` is `None` when no API key or spreadsheet is configured
    pub fn new(
        store: Arc<dyn PrayerStore>,
        source: Option<Arc<dyn SheetSource>>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            source,
            settings,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.source.is_some()
    }

    fn reader(&self) -> Result<SheetReader> {
        let source = self.source.clone().ok_or_else(|| {
            AppError::NotConfigured(
                "Google Sheets API key not configured. Please add GOOGLE_SHEETS_API_KEY to your environment variables."
                    .to_string(),
            )
        })?;

        Ok(SheetReader::new(source)
            .with_sheet_names(self.settings.sheet_names.clone())
            .with_recency_months(self.settings.recency_months))
    }

    /// Import recent spreadsheet rows for `identity`
    pub async fn sync(&self, identity: &Identity) -> Result<SyncReport> {
        self.sync_at(identity, Utc::now()).await
    }

    /// Same as [`sync`](Self::sync) with an explicit clock for the recency window
    pub async fn sync_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<SyncReport> {
        info!(user_id = %identity.user_id, "Starting spreadsheet sync");

        let reader = self.reader()?;
        let records = reader.fetch(now).await.map_err(|e| {
            error!("Error fetching prayers from spreadsheet: {}", e);
            e
        })?;

        if records.is_empty() {
            return Ok(SyncReport {
                message: "No prayers found in spreadsheet".to_string(),
                imported: 0,
                skipped: 0,
                total: 0,
            });
        }

        let outcome = Reconciler::new(self.store.clone())
            .with_batch_size(self.settings.batch_size)
            .reconcile(identity, &records)
            .await?;

        Ok(SyncReport {
            message: "Successfully synced prayers from spreadsheet".to_string(),
            imported: outcome.imported,
            skipped: outcome.skipped,
            total: outcome.total,
        })
    }

    /// Probe the spreadsheet without writing anything
    pub async fn status(&self) -> SyncStatus {
        let reader = match self.reader() {
            Ok(reader) => reader,
            Err(_) => {
                return SyncStatus {
                    configured: false,
                    connected: false,
                    available_prayers: 0,
                    message: "Google Sheets API key not configured".to_string(),
                    error: None,
                }
            }
        };

        match reader.fetch(Utc::now()).await {
            Ok(prayers) => SyncStatus {
                configured: true,
                connected: true,
                available_prayers: prayers.len(),
                message: "Spreadsheet connection is working".to_string(),
                error: None,
            },
            Err(e) => {
                warn!("Spreadsheet connection test failed: {}", e);
                SyncStatus {
                    configured: true,
                    connected: false,
                    available_prayers: 0,
                    message: "Connection test failed".to_string(),
                    error: Some(format!(
                        "Cannot connect to the spreadsheet. Please check its sharing permissions and the API key. ({})",
                        e
                    )),
                }
            }
        }
    }

    pub async fn spreadsheet_info(&self) -> Result<SpreadsheetInfo> {
        self.reader()?.source().spreadsheet_info().await
    }
}
