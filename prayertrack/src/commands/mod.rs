//! Commands exposed to callers
//!
//! Each command takes the AppState (and the caller's identity where the
//! data is per-user) and returns Result<T, AppError>. Submodules:
//! - `prayers`: listing, viewing and answering prayers
//! - `sync`: spreadsheet import and status
//! - `settings`: sync settings and the stored API key

pub mod prayers;
pub mod settings;
pub mod sync;

use crate::app::AppState;

pub use prayers::*;
pub use settings::*;
pub use sync::*;

/// Get application information
pub fn get_app_info(state: &AppState) -> AppInfo {
    AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        data_dir: state.data_dir.to_string_lossy().to_string(),
        sync_configured: state.sync_service.is_configured(),
    }
}

/// Application information structure
#[derive(serde::Serialize)]
pub struct AppInfo {
    pub version: String,
    pub data_dir: String,
    pub sync_configured: bool,
}
