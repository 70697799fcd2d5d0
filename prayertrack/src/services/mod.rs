//! Services module
//!
//! Business logic services that coordinate between commands and repository.

pub mod contact;
pub mod credentials;
pub mod prayers;
pub mod settings;
pub mod sheets;
pub mod sync;

pub use credentials::CredentialManager;
pub use prayers::PrayersService;
pub use settings::{SettingsService, SyncSettings};
pub use sheets::{GoogleSheetsClient, SheetReader, SheetSource};
pub use sync::{PrayerStore, Reconciler, SyncService};
