//! Spreadsheet sync commands

use crate::app::AppState;
use crate::database::Identity;
use crate::error::Result;
use crate::services::sheets::SpreadsheetInfo;
use crate::services::sync::{SyncReport, SyncStatus};

/// Import recent prayers from the spreadsheet for the caller
pub async fn trigger_sync(state: &AppState, identity: &Identity) -> Result<SyncReport> {
    state.sync_service.sync(identity).await
}

/// Check configuration and connectivity without importing
pub async fn sync_status(state: &AppState) -> SyncStatus {
    state.sync_service.status().await
}

/// Spreadsheet title and tab names, for diagnosing a misnamed sheet
pub async fn spreadsheet_info(state: &AppState) -> Result<SpreadsheetInfo> {
    state.sync_service.spreadsheet_info().await
}
