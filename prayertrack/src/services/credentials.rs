/// Credential Manager Service
/// Keeps the Google Sheets API key in the OS credential store
use crate::error::{AppError, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "PrayerTrack";
const SHEETS_API_KEY: &str = "google_sheets_api_key";

/// Credential manager for secure API key storage
pub struct CredentialManager;

impl CredentialManager {
    fn entry(service: &str, user: &str) -> Result<Entry> {
        Entry::new(service, user)
            .map_err(|e| AppError::Credential(format!("Failed to create keyring entry: {}", e)))
    }

    /// Store the Sheets API key in the OS credential store
    pub fn store_sheets_api_key(api_key: &str) -> Result<()> {
        store_secret(SERVICE_NAME, SHEETS_API_KEY, api_key)?;
        tracing::info!("Sheets API key stored in credential manager");
        Ok(())
    }

    /// Stored API key, or `None` if nothing is stored
    pub fn get_sheets_api_key() -> Result<Option<String>> {
        read_secret(SERVICE_NAME, SHEETS_API_KEY)
    }

    /// Delete the API key from the OS credential store
    pub fn delete_sheets_api_key() -> Result<()> {
        delete_secret(SERVICE_NAME, SHEETS_API_KEY)?;
        tracing::info!("Sheets API key removed from credential manager");
        Ok(())
    }
}

/// Write a secret and read it back through a fresh entry.
///
/// Without a native backend keyring keeps secrets in memory on the entry
/// itself, so the read-back fails and the caller gets an error instead of
/// a key that is gone on the next run.
fn store_secret(service: &str, user: &str, secret: &str) -> Result<()> {
    let secret = secret.trim();
    if secret.is_empty() {
        return Err(AppError::InvalidInput("API key cannot be empty".to_string()));
    }

    CredentialManager::entry(service, user)?
        .set_password(secret)
        .map_err(|e| AppError::Credential(format!("Failed to store API key: {}", e)))?;

    if read_secret(service, user)?.as_deref() != Some(secret) {
        return Err(AppError::Credential(
            "No persistent credential store is available on this system; set GOOGLE_SHEETS_API_KEY instead"
                .to_string(),
        ));
    }

    Ok(())
}

fn read_secret(service: &str, user: &str) -> Result<Option<String>> {
    match CredentialManager::entry(service, user)?.get_password() {
        Ok(secret) => Ok(Some(secret)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(AppError::Credential(format!("Failed to retrieve API key: {}", e))),
    }
}

fn delete_secret(service: &str, user: &str) -> Result<()> {
    match CredentialManager::entry(service, user)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(AppError::Credential(format!("Failed to delete API key: {}", e))),
    }
}
