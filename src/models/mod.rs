use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{SheetError, SheetResult};

pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

/// Sheets API `values.get` response body
#[derive(Debug, Deserialize)]
pub struct ValueRange {
    pub range: Option<String>,
    #[serde(rename = "majorDimension")]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

impl ValueRange {
    /// Flatten the JSON cells into display strings.
    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect()
    }
}

fn cell_to_string(cell: serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Derived figures for one snapshot date
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub date: String,
    pub potential_inv: f32,
    pub acum_earned: f32,
    pub avg_records: f32,
    pub playing: f32,
    pub great_total: f32,
    pub to_play: f32,
    pub to_buy: f32,
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub spreadsheet_id: String,
    pub scopes: Vec<String>,
    pub snapshot_path: PathBuf,
    pub token_path: PathBuf,
    pub access_token: Option<String>,
    pub api_base: String,
    pub sheet_tab: String,
    pub snapshot_columns: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> SheetResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup (environment, map in tests)
    pub fn from_lookup<F>(lookup: F) -> SheetResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let spreadsheet_id = var("SPREADSHEET_ID")
            .ok_or_else(|| SheetError::config("SPREADSHEET_ID environment variable required"))?;

        let scopes = var("SCOPES")
            .map(|s| split_list(&s))
            .unwrap_or_else(|| vec![DEFAULT_SCOPE.to_string()]);

        let request_timeout_secs = match var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                SheetError::config(format!("REQUEST_TIMEOUT_SECS must be an integer, got {:?}", raw))
            })?,
            None => 30,
        };

        Ok(Config {
            spreadsheet_id,
            scopes,
            snapshot_path: var("SNAPSHOT_PATH")
                .unwrap_or_else(|| "snapshot.csv".to_string())
                .into(),
            token_path: var("SHEETS_TOKEN_PATH")
                .unwrap_or_else(|| "token.json".to_string())
                .into(),
            access_token: var("SHEETS_ACCESS_TOKEN"),
            api_base: var("SHEETS_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            sheet_tab: var("SHEET_TAB").unwrap_or_else(|| "dt".to_string()),
            snapshot_columns: split_list(&var("SNAPSHOT_COLUMNS").unwrap_or_else(|| "D,E,F,G".to_string())),
            request_timeout_secs,
        })
    }
}

/// Split a comma or whitespace separated list, dropping empty entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
