//! Settings-related commands
//!
//! Sync tunables and the stored Sheets API key.

use crate::app::AppState;
use crate::error::Result;
use crate::services::{CredentialManager, SyncSettings};

/// Get current sync settings
pub async fn get_sync_settings(state: &AppState) -> Result<SyncSettings> {
    state.settings_service.get_sync().await
}

/// Update sync settings
/// Note: takes effect the next time the application starts
pub async fn update_sync_settings(state: &AppState, sync: SyncSettings) -> Result<()> {
    state.settings_service.update_sync(sync).await?;

    tracing::warn!("Sync settings updated. Restart required for changes to take effect.");

    Ok(())
}

/// Store the Sheets API key in the OS credential store
pub fn store_api_key(api_key: &str) -> Result<()> {
    CredentialManager::store_sheets_api_key(api_key)
}

/// Remove the stored Sheets API key
pub fn clear_api_key() -> Result<()> {
    CredentialManager::delete_sheets_api_key()
}

/// Whether an API key is held in the credential store
pub fn has_stored_api_key() -> bool {
    matches!(CredentialManager::get_sheets_api_key(), Ok(Some(_)))
}
