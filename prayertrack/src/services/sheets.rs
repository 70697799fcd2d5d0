//! Spreadsheet reader
//!
//! Pulls prayer requests out of a Google Sheet. Rows are mapped by
//! column position (the sheet is usually a Google Form response sheet):
//!
//! | Column | Field                      |
//! |--------|----------------------------|
//! | A      | request date               |
//! | B      | content                    |
//! | C      | petitioner                 |
//! | D      | contact preference         |
//! | E      | contact phone              |
//! | F      | contact email              |
//! | G      | contact email (second)     |
//! | H      | location                   |
//!
//! Only recent or undated rows are returned.

use crate::config::{
    SheetsConfig, CANDIDATE_SHEET_NAMES, DEFAULT_PRAYER_TITLE, HTTP_TIMEOUT_SECS, RECENCY_MONTHS,
    SHEET_COLUMN_RANGE,
};
use crate::database::NewPrayer;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Naive timestamp layouts seen in form exports, tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// A prayer request as read from one spreadsheet row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetPrayer {
    /// Raw text of the date cell
    pub request_date: Option<String>,
    /// `request_date` parsed, if it parses
    pub requested_at: Option<DateTime<Utc>>,
    pub content: String,
    pub petitioner: Option<String>,
    pub contact_preference: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub secondary_email: Option<String>,
    pub location: Option<String>,
    pub is_answered: bool,
    pub is_private: bool,
}

impl SheetPrayer {
    /// Map a data row positionally; missing or empty cells become `None`
    pub fn from_row(row: &[String]) -> Self {
        let cell = |index: usize| row.get(index).filter(|value| !value.is_empty()).cloned();

        let request_date = cell(0);
        let requested_at = request_date.as_deref().and_then(parse_request_date);

        Self {
            request_date,
            requested_at,
            content: cell(1).unwrap_or_default(),
            petitioner: cell(2),
            contact_preference: cell(3),
            contact_phone: cell(4),
            contact_email: cell(5),
            secondary_email: cell(6),
            location: cell(7),
            is_answered: false,
            is_private: false,
        }
    }

    /// Dedup key: content and petitioner joined by `|`
    pub fn signature(&self) -> String {
        signature(&self.content, self.petitioner.as_deref())
    }

    /// Primary email column, falling back to the second one
    pub fn resolved_email(&self) -> Option<&str> {
        self.contact_email
            .as_deref()
            .or(self.secondary_email.as_deref())
    }

    /// Undated and unparseable rows are always kept
    pub fn is_recent(&self, cutoff: DateTime<Utc>) -> bool {
        match (&self.request_date, self.requested_at) {
            (None, _) => true,
            (Some(raw), None) => {
                tracing::debug!("Keeping row with unparseable date: {:?}", raw);
                true
            }
            (Some(_), Some(at)) => at >= cutoff,
        }
    }

    pub fn to_new_prayer(&self) -> NewPrayer {
        NewPrayer {
            title: DEFAULT_PRAYER_TITLE.to_string(),
            content: self.content.clone(),
            petitioner: self.petitioner.clone(),
            contact_preference: self.contact_preference.clone(),
            contact_phone: self.contact_phone.clone(),
            contact_email: self.resolved_email().map(String::from),
            location: self.location.clone(),
            is_answered: self.is_answered,
            is_private: self.is_private,
            created_at: self.requested_at,
        }
    }
}

/// Build the dedup key for a content/petitioner pair
pub fn signature(content: &str, petitioner: Option<&str>) -> String {
    format!("{}|{}", content, petitioner.unwrap_or(""))
}

/// Parse the date cell of a row. Naive values are taken as UTC.
pub fn parse_request_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Some(naive) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(naive.and_utc());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Spreadsheet title and tabs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetInfo {
    pub title: Option<String>,
    pub sheets: Vec<SheetTab>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetTab {
    pub title: Option<String>,
    pub sheet_id: Option<i64>,
}

/// Source of raw spreadsheet cells
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Every row of `range` (A1 notation), cells rendered as text
    async fn fetch_values(&self, range: &str) -> Result<Vec<Vec<String>>>;

    async fn spreadsheet_info(&self) -> Result<SpreadsheetInfo>;
}

// ===== Google Sheets v4 REST client =====

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct SpreadsheetResponse {
    properties: Option<SpreadsheetProperties>,
    #[serde(default)]
    sheets: Vec<SheetResponse>,
}

#[derive(Deserialize)]
struct SpreadsheetProperties {
    title: Option<String>,
}

#[derive(Deserialize)]
struct SheetResponse {
    properties: Option<SheetProperties>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    title: Option<String>,
    sheet_id: Option<i64>,
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Reads a public (or key-accessible) spreadsheet with an API key
#[derive(Clone)]
pub struct GoogleSheetsClient {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    api_key: String,
}

impl GoogleSheetsClient {
    pub fn new(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("prayertrack/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            api_key: api_key.into(),
        })
    }

    /// Fails with `NotConfigured` when the key or spreadsheet id is missing
    pub fn from_config(config: &SheetsConfig) -> Result<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            AppError::NotConfigured(
                "Google Sheets API key not configured. Set GOOGLE_SHEETS_API_KEY or store one with `set-api-key`."
                    .to_string(),
            )
        })?;
        let spreadsheet_id = config.spreadsheet_id().ok_or_else(|| {
            AppError::NotConfigured("Spreadsheet ID not configured. Set SPREADSHEET_ID.".to_string())
        })?;

        Self::new(config.base_url.clone(), spreadsheet_id, api_key)
    }

    fn spreadsheet_url(&self) -> String {
        format!(
            "{}/v4/spreadsheets/{}",
            self.base_url,
            urlencoding::encode(&self.spreadsheet_id)
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::SheetsUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        match status {
            StatusCode::FORBIDDEN => return Err(AppError::SheetsPermissionDenied),
            StatusCode::NOT_FOUND => {
                return Err(AppError::SpreadsheetNotFound(self.spreadsheet_id.clone()))
            }
            _ if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::SheetsUnavailable(format!(
                    "Sheets API returned {}: {}",
                    status,
                    body.trim()
                )));
            }
            _ => {}
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SheetSource for GoogleSheetsClient {
    async fn fetch_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = format!("{}/values/{}", self.spreadsheet_url(), urlencoding::encode(range));
        let body: ValueRange = self.get_json(url, &[]).await?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn spreadsheet_info(&self) -> Result<SpreadsheetInfo> {
        let body: SpreadsheetResponse = self
            .get_json(
                self.spreadsheet_url(),
                &[("fields", "properties.title,sheets.properties(title,sheetId)")],
            )
            .await?;

        Ok(SpreadsheetInfo {
            title: body.properties.and_then(|p| p.title),
            sheets: body
                .sheets
                .into_iter()
                .filter_map(|sheet| sheet.properties)
                .map(|p| SheetTab {
                    title: p.title,
                    sheet_id: p.sheet_id,
                })
                .collect(),
        })
    }
}

// ===== Reader =====

/// Finds the prayer sheet and returns its recent rows
#[derive(Clone)]
pub struct SheetReader {
    source: Arc<dyn SheetSource>,
    sheet_names: Vec<String>,
    recency_months: u32,
}

impl SheetReader {
    pub fn new(source: Arc<dyn SheetSource>) -> Self {
        Self {
            source,
            sheet_names: CANDIDATE_SHEET_NAMES.iter().map(|s| s.to_string()).collect(),
            recency_months: RECENCY_MONTHS,
        }
    }

    pub fn with_sheet_names(mut self, sheet_names: Vec<String>) -> Self {
        self.sheet_names = sheet_names;
        self
    }

    pub fn with_recency_months(mut self, months: u32) -> Self {
        self.recency_months = months;
        self
    }

    pub fn source(&self) -> &Arc<dyn SheetSource> {
        &self.source
    }

    /// Rows of the first candidate sheet that answers, header excluded
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>> {
        let mut last_error = None;

        for name in &self.sheet_names {
            let range = format!("{}!{}", name, SHEET_COLUMN_RANGE);
            match self.source.fetch_values(&range).await {
                Ok(rows) => {
                    tracing::info!("Reading prayers from sheet '{}' ({} rows)", name, rows.len());
                    return Ok(rows.into_iter().skip(1).collect());
                }
                Err(e) => {
                    tracing::debug!("Sheet '{}' unavailable: {}", name, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::SheetsUnavailable("Could not find a valid sheet".to_string())
        }))
    }

    /// Non-empty rows dated within the recency window of `now`, plus undated ones
    pub async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<SheetPrayer>> {
        let rows = self.fetch_rows().await?;
        let cutoff = now.checked_sub_months(Months::new(self.recency_months));

        let prayers: Vec<SheetPrayer> = rows
            .iter()
            .map(|row| SheetPrayer::from_row(row))
            .filter(|prayer| !prayer.content.trim().is_empty())
            .filter(|prayer| cutoff.map_or(true, |cutoff| prayer.is_recent(cutoff)))
            .collect();

        tracing::info!(
            "{} of {} sheet rows are recent prayer requests",
            prayers.len(),
            rows.len()
        );

        Ok(prayers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Answers only for the sheet names it holds; records every range asked for
    #[derive(Default)]
    struct MockSheets {
        sheets: HashMap<String, Vec<Vec<String>>>,
        requested: Mutex<Vec<String>>,
    }

    impl MockSheets {
        fn with_sheet(mut self, name: &str, rows: Vec<Vec<&str>>) -> Self {
            let rows = rows
                .into_iter()
                .map(|row| row.into_iter().map(String::from).collect())
                .collect();
            self.sheets.insert(name.to_string(), rows);
            self
        }
    }

    #[async_trait]
    impl SheetSource for MockSheets {
        async fn fetch_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
            self.requested.lock().unwrap().push(range.to_string());
            let name = range.split('!').next().unwrap_or_default();
            self.sheets
                .get(name)
                .cloned()
                .ok_or_else(|| AppError::SheetsUnavailable(format!("Unable to parse range: {}", range)))
        }

        async fn spreadsheet_info(&self) -> Result<SpreadsheetInfo> {
            Ok(SpreadsheetInfo::default())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    const HEADER: [&str; 8] = [
        "Timestamp", "Request", "Name", "Contact", "Phone", "Email", "Email 2", "Location",
    ];

    #[test]
    fn test_parse_request_date_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 5, 9, 30, 0).unwrap();
        assert_eq!(parse_request_date("1/5/2025 9:30:00"), Some(expected));
        assert_eq!(parse_request_date("2025-01-05 09:30:00"), Some(expected));
        assert_eq!(parse_request_date("2025-01-05T09:30:00Z"), Some(expected));
        assert_eq!(
            parse_request_date("2025-01-05"),
            Some(Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_request_date("last tuesday"), None);
        assert_eq!(parse_request_date("  "), None);
    }

    #[test]
    fn test_from_row_handles_short_rows() {
        let row: Vec<String> = vec!["".to_string(), "Pray for rain".to_string()];
        let prayer = SheetPrayer::from_row(&row);

        assert_eq!(prayer.content, "Pray for rain");
        assert_eq!(prayer.request_date, None);
        assert_eq!(prayer.petitioner, None);
        assert_eq!(prayer.location, None);
        assert!(!prayer.is_answered);
        assert!(!prayer.is_private);
    }

    #[test]
    fn test_email_falls_back_to_second_column() {
        let row: Vec<String> = ["", "Content", "Jane", "email", "", "", "jane@example.com", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let prayer = SheetPrayer::from_row(&row);
        assert_eq!(prayer.resolved_email(), Some("jane@example.com"));

        let both: Vec<String> = ["", "Content", "Jane", "", "", "a@example.com", "b@example.com", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(SheetPrayer::from_row(&both).resolved_email(), Some("a@example.com"));
    }

    #[test]
    fn test_signature_uses_empty_petitioner() {
        let row: Vec<String> = vec!["".to_string(), "Healing".to_string()];
        assert_eq!(SheetPrayer::from_row(&row).signature(), "Healing|");
        assert_eq!(signature("Pray for healing", Some("Jane")), "Pray for healing|Jane");
    }

    #[test]
    fn test_to_new_prayer_uses_sheet_date() {
        let row: Vec<String> = ["6/1/2025 08:00:00", "Content", "", "", "555-0100", "", "x@example.com", "North"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let new_prayer = SheetPrayer::from_row(&row).to_new_prayer();

        assert_eq!(new_prayer.title, DEFAULT_PRAYER_TITLE);
        assert_eq!(new_prayer.contact_email.as_deref(), Some("x@example.com"));
        assert_eq!(new_prayer.location.as_deref(), Some("North"));
        assert_eq!(
            new_prayer.created_at,
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_tries_candidates_in_order() {
        let source = Arc::new(MockSheets::default().with_sheet(
            "Prayer Requests",
            vec![HEADER.to_vec(), vec!["", "Peace for the family", "Ann"]],
        ));
        let reader = SheetReader::new(source.clone());

        let prayers = reader.fetch(now()).await.unwrap();

        assert_eq!(prayers.len(), 1);
        assert_eq!(prayers[0].petitioner.as_deref(), Some("Ann"));
        assert_eq!(
            *source.requested.lock().unwrap(),
            vec!["Sheet1!A:H", "Form Responses 1!A:H", "Prayer Requests!A:H"]
        );
    }

    #[tokio::test]
    async fn test_all_candidates_failing_surfaces_last_error() {
        let reader = SheetReader::new(Arc::new(MockSheets::default()));

        let err = reader.fetch(now()).await.unwrap_err();

        match err {
            AppError::SheetsUnavailable(message) => assert!(message.contains("Responses!A:H")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_header_only_sheet_is_empty() {
        let reader = SheetReader::new(Arc::new(
            MockSheets::default().with_sheet("Sheet1", vec![HEADER.to_vec()]),
        ));
        assert!(reader.fetch(now()).await.unwrap().is_empty());

        let reader = SheetReader::new(Arc::new(MockSheets::default().with_sheet("Sheet1", vec![])));
        assert!(reader.fetch(now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_content_and_old_rows_are_dropped() {
        let reader = SheetReader::new(Arc::new(MockSheets::default().with_sheet(
            "Sheet1",
            vec![
                HEADER.to_vec(),
                vec!["6/1/2025 10:00:00", "Recent request", "Jane"],
                vec!["1/1/2025 10:00:00", "Old request", "Bob"],
                vec!["4/15/2025 12:00:00", "Right on the cutoff", "Cal"],
                vec!["", "Undated request"],
                vec!["sometime in spring", "Odd date request"],
                vec!["6/1/2025 10:00:00", "   ", "Blank"],
                vec!["6/1/2025 10:00:00"],
            ],
        )));

        let contents: Vec<String> = reader
            .fetch(now())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.content)
            .collect();

        assert_eq!(
            contents,
            vec![
                "Recent request",
                "Right on the cutoff",
                "Undated request",
                "Odd date request"
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_recency_window() {
        let reader = SheetReader::new(Arc::new(MockSheets::default().with_sheet(
            "Sheet1",
            vec![HEADER.to_vec(), vec!["1/1/2025 10:00:00", "Old request"]],
        )))
        .with_recency_months(6);

        assert_eq!(reader.fetch(now()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_google_client_reads_values() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/v4/spreadsheets/sheet-123/values/Form%20Responses%201"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "range": "'Form Responses 1'!A1:H3",
                "majorDimension": "ROWS",
                "values": [
                    ["Timestamp", "Request", "Name"],
                    ["6/10/2025 9:00:00", "Safe travels", "Dee", "text", 5550100]
                ]
            })))
            .mount(&server)
            .await;

        let client = GoogleSheetsClient::new(server.uri(), "sheet-123", "test-key").unwrap();
        let reader = SheetReader::new(Arc::new(client));

        let prayers = reader.fetch(now()).await.unwrap();

        assert_eq!(prayers.len(), 1);
        assert_eq!(prayers[0].content, "Safe travels");
        assert_eq!(prayers[0].contact_preference.as_deref(), Some("text"));
        assert_eq!(prayers[0].contact_phone.as_deref(), Some("5550100"));
    }

    #[tokio::test]
    async fn test_google_client_maps_error_statuses() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/private-sheet"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let private = GoogleSheetsClient::new(server.uri(), "private-sheet", "k").unwrap();
        assert!(matches!(
            private.spreadsheet_info().await,
            Err(AppError::SheetsPermissionDenied)
        ));

        let missing = GoogleSheetsClient::new(server.uri(), "missing-sheet", "k").unwrap();
        assert!(matches!(
            missing.spreadsheet_info().await,
            Err(AppError::SpreadsheetNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_google_client_spreadsheet_info() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "properties": { "title": "Prayer Requests 2025" },
                "sheets": [
                    { "properties": { "title": "Form Responses 1", "sheetId": 0 } },
                    { "properties": { "title": "Archive", "sheetId": 42 } }
                ]
            })))
            .mount(&server)
            .await;

        let client = GoogleSheetsClient::new(server.uri(), "sheet-123", "k").unwrap();
        let info = client.spreadsheet_info().await.unwrap();

        assert_eq!(info.title.as_deref(), Some("Prayer Requests 2025"));
        assert_eq!(info.sheets.len(), 2);
        assert_eq!(info.sheets[1].sheet_id, Some(42));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = SheetsConfig {
            api_key: None,
            spreadsheet_id: Some("sheet".to_string()),
            base_url: "http://localhost".to_string(),
        };
        assert!(matches!(
            GoogleSheetsClient::from_config(&config),
            Err(AppError::NotConfigured(_))
        ));
    }
}
