//! Settings service
//!
//! Persists import tunables in `settings.json` under the data directory.

use crate::config::{
    CANDIDATE_SHEET_NAMES, MAX_RECENCY_MONTHS, MAX_SHEET_NAME_LENGTH, MAX_SYNC_BATCH_SIZE,
    MIN_RECENCY_MONTHS, MIN_SYNC_BATCH_SIZE, RECENCY_MONTHS, SYNC_BATCH_SIZE,
};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Spreadsheet import configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Sheet tabs tried in order
    #[serde(default = "default_sheet_names")]
    pub sheet_names: Vec<String>,
    /// Records written concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Rows older than this many months are skipped
    #[serde(default = "default_recency_months")]
    pub recency_months: u32,
}

fn default_sheet_names() -> Vec<String> {
    CANDIDATE_SHEET_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_batch_size() -> usize {
    SYNC_BATCH_SIZE
}

fn default_recency_months() -> u32 {
    RECENCY_MONTHS
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            sheet_names: default_sheet_names(),
            batch_size: default_batch_size(),
            recency_months: default_recency_months(),
        }
    }
}

impl SyncSettings {
    pub fn validate(&self) -> Result<()> {
        if self.sheet_names.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one sheet name is required".to_string(),
            ));
        }
        if let Some(name) = self
            .sheet_names
            .iter()
            .find(|n| n.trim().is_empty() || n.len() > MAX_SHEET_NAME_LENGTH)
        {
            return Err(AppError::InvalidInput(format!("Invalid sheet name: {:?}", name)));
        }
        if !(MIN_SYNC_BATCH_SIZE..=MAX_SYNC_BATCH_SIZE).contains(&self.batch_size) {
            return Err(AppError::InvalidInput(format!(
                "Batch size must be between {} and {}",
                MIN_SYNC_BATCH_SIZE, MAX_SYNC_BATCH_SIZE
            )));
        }
        if !(MIN_RECENCY_MONTHS..=MAX_RECENCY_MONTHS).contains(&self.recency_months) {
            return Err(AppError::InvalidInput(format!(
                "Recency window must be between {} and {} months",
                MIN_RECENCY_MONTHS, MAX_RECENCY_MONTHS
            )));
        }
        Ok(())
    }
}

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            settings_path: data_dir.join("settings.json"),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let mut settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        if let Err(e) = settings.sync.validate() {
            tracing::warn!("Ignoring invalid sync settings ({}), using defaults", e);
            settings.sync = SyncSettings::default();
        }

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    pub async fn get_sync(&self) -> Result<SyncSettings> {
        Ok(self.load().await?.sync)
    }

    /// Validate and persist new sync settings
    pub async fn update_sync(&self, sync: SyncSettings) -> Result<()> {
        sync.validate()?;
        let mut settings = self.load().await?;
        settings.sync = sync;
        self.save(&settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().to_path_buf());
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        let settings = service.load().await.unwrap();

        assert_eq!(settings.sync.batch_size, 10);
        assert_eq!(settings.sync.recency_months, 2);
        assert_eq!(
            settings.sync.sheet_names,
            vec!["Sheet1", "Form Responses 1", "Prayer Requests", "Responses"]
        );
        assert!(temp.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn test_partial_file_gets_defaults() {
        let (service, temp) = create_test_service();
        std::fs::write(
            temp.path().join("settings.json"),
            r#"{ "sync": { "batch_size": 5 } }"#,
        )
        .unwrap();

        let sync = service.get_sync().await.unwrap();

        assert_eq!(sync.batch_size, 5);
        assert_eq!(sync.recency_months, RECENCY_MONTHS);
        assert_eq!(sync.sheet_names.len(), CANDIDATE_SHEET_NAMES.len());
    }

    #[tokio::test]
    async fn test_invalid_file_values_fall_back() {
        let (service, temp) = create_test_service();
        std::fs::write(
            temp.path().join("settings.json"),
            r#"{ "sync": { "batch_size": 0 } }"#,
        )
        .unwrap();

        assert_eq!(service.get_sync().await.unwrap(), SyncSettings::default());
    }

    #[tokio::test]
    async fn test_update_rejects_out_of_range() {
        let (service, _temp) = create_test_service();

        let too_big = SyncSettings {
            batch_size: MAX_SYNC_BATCH_SIZE + 1,
            ..Default::default()
        };
        assert!(matches!(
            service.update_sync(too_big).await,
            Err(AppError::InvalidInput(_))
        ));

        let no_sheets = SyncSettings {
            sheet_names: vec![],
            ..Default::default()
        };
        assert!(service.update_sync(no_sheets).await.is_err());
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let service = SettingsService::new(temp_dir.path().to_path_buf());
            let updated = SyncSettings {
                sheet_names: vec!["Intake".to_string()],
                batch_size: 4,
                recency_months: 6,
            };
            service.update_sync(updated).await.unwrap();
        }

        {
            let service = SettingsService::new(temp_dir.path().to_path_buf());
            let loaded = service.get_sync().await.unwrap();
            assert_eq!(loaded.sheet_names, vec!["Intake"]);
            assert_eq!(loaded.batch_size, 4);
            assert_eq!(loaded.recency_months, 6);
        }
    }
}
