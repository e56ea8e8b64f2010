//! Error types for sheet fetching, snapshots and allocation math

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("No data found for spreadsheet {spreadsheet_id} (range {range})")]
    NoData { spreadsheet_id: String, range: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid column label: {0:?}")]
    InvalidColumn(String),

    #[error("Column {column} has no header cell")]
    MissingHeader { column: String },

    #[error("Snapshot not found: {}", .0.display())]
    SnapshotNotFound(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No snapshot row for date {date}")]
    MissingRow { date: String },

    #[error("Field {field} is missing or empty for date {date}")]
    MissingField { field: String, date: String },

    #[error("Field {field} has a non-numeric value {value:?}")]
    InvalidNumber { field: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type SheetResult<T> = Result<T, SheetError>;

impl SheetError {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for the "sheet returned nothing" condition
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }
}
