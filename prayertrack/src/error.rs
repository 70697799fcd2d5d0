//! Error types for PrayerTrack
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to whatever surface calls the commands.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Spreadsheet unavailable: {0}")]
    SheetsUnavailable(String),

    #[error("Permission denied: make sure the spreadsheet is shared with \"Anyone with the link can view\"")]
    SheetsPermissionDenied,

    #[error("Spreadsheet not found: please check the spreadsheet ID ({0})")]
    SpreadsheetNotFound(String),

    #[error("Prayer not found: {0}")]
    PrayerNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("{0}")]
    Generic(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
