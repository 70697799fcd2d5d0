//! Application state and initialization
//!
//! All services are built here and handed to the commands through AppState.

use crate::config::{SheetsConfig, HTTP_TIMEOUT_SECS};
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::{
    CredentialManager, GoogleSheetsClient, PrayersService, SettingsService, SheetSource,
    SyncService,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DATABASE_FILE: &str = "prayers.db";

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub prayers_service: PrayersService,
    pub sync_service: SyncService,
    pub settings_service: SettingsService,
}

impl AppState {
    /// Wire services over an existing repository and an optional sheet source
    pub async fn new(
        data_dir: PathBuf,
        repo: Repository,
        source: Option<Arc<dyn SheetSource>>,
    ) -> Result<Self> {
        let settings_service = SettingsService::new(data_dir.clone());
        let sync_settings = settings_service.get_sync().await?;

        Ok(Self {
            prayers_service: PrayersService::new(repo.clone()),
            sync_service: SyncService::new(Arc::new(repo), source, sync_settings),
            settings_service,
            data_dir,
        })
    }
}

/// Build the spreadsheet client, or `None` when the import is not configured
pub fn sheet_source(config: &SheetsConfig) -> Result<Option<Arc<dyn SheetSource>>> {
    if !config.is_configured() {
        tracing::warn!("Spreadsheet import not configured; sync is disabled");
        return Ok(None);
    }

    let client = GoogleSheetsClient::from_config(config)?;
    tracing::info!(
        "Spreadsheet client ready ({}s timeout, {})",
        HTTP_TIMEOUT_SECS,
        config.base_url
    );
    Ok(Some(Arc::new(client)))
}

/// Application setup - called once on startup
pub async fn setup(data_dir: &Path, mut sheets: SheetsConfig) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("Data directory: {:?}", data_dir);

    std::fs::create_dir_all(data_dir)?;

    if sheets.api_key().is_none() {
        match CredentialManager::get_sheets_api_key() {
            Ok(Some(key)) => {
                tracing::debug!("Using Sheets API key from credential manager");
                sheets.api_key = Some(key);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not read credential store: {}", e),
        }
    }

    let pool = create_pool(&data_dir.join(DATABASE_FILE)).await?;
    let state = AppState::new(data_dir.to_path_buf(), Repository::new(pool), sheet_source(&sheets)?).await?;

    tracing::info!("Application initialized successfully");

    Ok(state)
}
