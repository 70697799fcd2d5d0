//! Application configuration
//!
//! Central location for configuration constants, validation boundaries,
//! and the command-line/environment surface of the binary.

use crate::database::Identity;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

// ===== Spreadsheet Import =====

/// Number of records written concurrently before the next batch starts
pub const SYNC_BATCH_SIZE: usize = 10;

/// Smallest batch size accepted from settings.json
pub const MIN_SYNC_BATCH_SIZE: usize = 1;

/// Largest batch size accepted from settings.json.
/// SQLite serializes writers, so larger batches only queue on the busy timeout.
pub const MAX_SYNC_BATCH_SIZE: usize = 50;

/// Rows dated further back than this many calendar months are not imported
pub const RECENCY_MONTHS: u32 = 2;

/// Smallest recency window accepted from settings.json
pub const MIN_RECENCY_MONTHS: u32 = 1;

/// Largest recency window accepted from settings.json (2 years)
pub const MAX_RECENCY_MONTHS: u32 = 24;

/// Sheet tab names tried in order; the first that answers wins
pub const CANDIDATE_SHEET_NAMES: &[&str] =
    &["Sheet1", "Form Responses 1", "Prayer Requests", "Responses"];

/// Google Sheets caps tab names at 100 characters
pub const MAX_SHEET_NAME_LENGTH: usize = 100;

/// Column range read from each candidate sheet (8 columns, A through H)
pub const SHEET_COLUMN_RANGE: &str = "A:H";

/// Title given to imported prayers; the sheet has no title column
pub const DEFAULT_PRAYER_TITLE: &str = "Prayer Request";

/// Value shipped in the sample .env file; treated as "not configured"
pub const API_KEY_PLACEHOLDER: &str = "your-google-sheets-api-key-here";

/// Public Google Sheets REST endpoint
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

/// Timeout applied to every request against the spreadsheet API
pub const HTTP_TIMEOUT_SECS: u64 = 30;

// ===== Users =====

/// Email stored for users whose identity carries none
pub const FALLBACK_USER_EMAIL: &str = "user@example.com";

/// Display name stored for users whose identity carries none
pub const FALLBACK_USER_NAME: &str = "User";

// ===== Listing =====

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Upper bound on page size
pub const MAX_PAGE_LIMIT: u32 = 100;

// ===== Command Line =====

/// PrayerTrack - keep track of prayer requests and import them from Google Sheets
#[derive(Parser, Debug, Clone)]
#[command(name = "prayertrack", version)]
#[command(about = "Track prayer requests and import them from a Google Sheet")]
pub struct Args {
    /// Directory holding the database and settings.json
    #[arg(long, env = "PRAYERTRACK_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Spreadsheet source configuration
    #[command(flatten)]
    pub sheets: SheetsArgs,

    /// Identity the command runs as
    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SheetsArgs {
    /// Google Sheets API key (falls back to the OS credential store)
    #[arg(long = "sheets-api-key", env = "GOOGLE_SHEETS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// ID of the spreadsheet holding prayer requests
    #[arg(long, env = "SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    /// Base URL of the Sheets API
    #[arg(long = "sheets-base-url", env = "SHEETS_API_BASE_URL", default_value = DEFAULT_SHEETS_BASE_URL)]
    pub base_url: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct IdentityArgs {
    /// Authenticated user id
    #[arg(long = "user-id", env = "PRAYERTRACK_USER_ID")]
    pub user_id: Option<String>,

    /// Email recorded if the user has to be created
    #[arg(long = "user-email", env = "PRAYERTRACK_USER_EMAIL")]
    pub email: Option<String>,

    /// Name recorded if the user has to be created
    #[arg(long = "user-name", env = "PRAYERTRACK_USER_NAME")]
    pub name: Option<String>,
}

impl IdentityArgs {
    pub fn identity(&self) -> Option<Identity> {
        let user_id = self.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty())?;
        Some(Identity {
            user_id: user_id.to_string(),
            email: self.email.clone(),
            name: self.name.clone(),
        })
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Import recent prayer requests from the spreadsheet
    Sync,
    /// Check whether the spreadsheet is configured and reachable
    Status,
    /// Show the spreadsheet title and its tabs
    SheetInfo,
    /// List prayers with optional filters
    List {
        /// all, answered or unanswered
        #[arg(long, default_value = "all")]
        status: String,
        /// Earliest creation date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        date_from: Option<String>,
        /// Latest creation date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        date_to: Option<String>,
        /// Case-insensitive petitioner filter
        #[arg(long)]
        team_member: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: u32,
    },
    /// Show a single prayer with contact links
    Show { id: String },
    /// Record a new prayer request
    Add {
        content: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        petitioner: Option<String>,
        #[arg(long)]
        private: bool,
    },
    /// Mark a prayer as answered (or unanswered with --undo)
    Answer {
        id: String,
        #[arg(long)]
        undo: bool,
    },
    /// Change the title, content or privacy of a prayer
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        private: Option<bool>,
    },
    /// Show version, data directory and sync settings
    Info,
    /// Change sync settings; omitted values are kept
    Configure {
        /// Sheet names to try, in order (repeatable)
        #[arg(long = "sheet")]
        sheet_names: Vec<String>,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        recency_months: Option<u32>,
    },
    /// Store the Sheets API key in the OS credential store
    SetApiKey { key: String },
    /// Remove the Sheets API key from the OS credential store
    ClearApiKey,
}

/// Resolved spreadsheet configuration
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub api_key: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub base_url: String,
}

impl SheetsConfig {
    pub fn from_args(args: &SheetsArgs) -> Self {
        Self {
            api_key: args.api_key.clone(),
            spreadsheet_id: args.spreadsheet_id.clone(),
            base_url: args.base_url.clone(),
        }
    }

    /// API key, unless missing, blank or still the placeholder
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != API_KEY_PLACEHOLDER)
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some() && self.spreadsheet_id().is_some()
    }
}
