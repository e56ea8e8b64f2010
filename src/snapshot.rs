//! Local CSV snapshot of selected spreadsheet columns
//!
//! A snapshot is rebuilt wholesale from the sheet: every requested column is
//! fetched on its own, its first cell becomes the field name, and the columns
//! are laid side by side. The first field (column `A`) is the date index.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::api::SheetSource;
use crate::error::{SheetError, SheetResult};
use crate::utils::{is_column_label, parse_snapshot_date};

/// Columns always fetched ahead of the requested ones (date and identity fields)
pub const FIXED_COLUMNS: [&str; 3] = ["A", "B", "C"];

/// Date-indexed table of raw cell text
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// One date's worth of fields, borrowed from a [`SnapshotTable`]
#[derive(Debug, Clone, Copy)]
pub struct SnapshotRow<'a> {
    headers: &'a [String],
    values: &'a [String],
}

impl SnapshotTable {
    /// Build a table from `rows`, padding short rows with empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Lay named columns side by side. Row count is the longest column.
    pub fn from_columns(columns: Vec<(String, Vec<String>)>) -> Self {
        let height = columns.iter().map(|(_, values)| values.len()).max().unwrap_or(0);
        let headers = columns.iter().map(|(name, _)| name.clone()).collect();

        let rows = (0..height)
            .map(|i| {
                columns
                    .iter()
                    .map(|(_, values)| values.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find the row whose index cell matches `date`.
    ///
    /// Exact text wins; otherwise both sides are compared as calendar dates
    /// so `1/5/2024` finds `01/05/2024`.
    pub fn lookup(&self, date: &str) -> Option<SnapshotRow<'_>> {
        let date = date.trim();

        let found = self
            .rows
            .iter()
            .find(|row| row.first().map(|cell| cell.trim()) == Some(date))
            .or_else(|| {
                let wanted = parse_snapshot_date(date)?;
                self.rows
                    .iter()
                    .find(|row| row.first().and_then(|cell| parse_snapshot_date(cell)) == Some(wanted))
            })?;

        Some(SnapshotRow {
            headers: &self.headers,
            values: found,
        })
    }

    /// Write the table as CSV, replacing any previous snapshot at `path`.
    ///
    /// The data goes to a sibling temp file first and is renamed into place.
    pub fn save(&self, path: &Path) -> SheetResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = temp_path_for(path);
        let written = self.write_csv(&tmp_path);
        if let Err(e) = written {
            fs::remove_file(&tmp_path).ok();
            return Err(e);
        }

        fs::rename(&tmp_path, path)?;
        info!("Saved snapshot with {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    fn write_csv(&self, path: &Path) -> SheetResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a snapshot written by [`save`](Self::save).
    pub fn load(path: &Path) -> SheetResult<Self> {
        if !path.exists() {
            return Err(SheetError::SnapshotNotFound(path.to_path_buf()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!("Loaded snapshot with {} rows from {}", rows.len(), path.display());
        Ok(Self::new(headers, rows))
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}

impl<'a> SnapshotRow<'a> {
    /// The index cell
    pub fn date(&self) -> &'a str {
        self.values.first().map(String::as_str).unwrap_or("")
    }

    /// Value of the first field named `field`
    pub fn get(&self, field: &str) -> Option<&'a str> {
        let position = self.headers.iter().position(|h| h == field)?;
        self.values.get(position).map(String::as_str)
    }

    /// Like [`get`](Self::get), but an absent or blank value is an error.
    pub fn require(&self, field: &str) -> SheetResult<&'a str> {
        match self.get(field) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(SheetError::MissingField {
                field: field.to_string(),
                date: self.date().to_string(),
            }),
        }
    }
}

/// Fixed columns followed by the requested ones, upper-cased, each once.
pub fn column_plan(columns: &[String]) -> SheetResult<Vec<String>> {
    let mut plan: Vec<String> = Vec::with_capacity(FIXED_COLUMNS.len() + columns.len());

    for label in FIXED_COLUMNS.iter().map(|c| c.to_string()).chain(columns.iter().cloned()) {
        let label = label.trim().to_ascii_uppercase();
        if !is_column_label(&label) {
            return Err(SheetError::InvalidColumn(label));
        }
        if !plan.contains(&label) {
            plan.push(label);
        }
    }

    Ok(plan)
}

/// A1 range covering a whole column of `tab`
pub fn column_range(tab: &str, column: &str) -> String {
    let needs_quotes = !tab.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if needs_quotes {
        format!("'{}'!{}:{}", tab.replace('\'', "''"), column, column)
    } else {
        format!("{}!{}:{}", tab, column, column)
    }
}

/// Fetches spreadsheet columns and assembles them into a [`SnapshotTable`]
pub struct SnapshotBuilder<S: SheetSource> {
    source: S,
}

impl<S: SheetSource> SnapshotBuilder<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch every planned column. Any failure aborts the whole build.
    pub async fn build(&self, columns: &[String], tab: &str) -> SheetResult<SnapshotTable> {
        let plan = column_plan(columns)?;
        info!("Building snapshot from tab {} columns {:?}", tab, plan);

        let mut fetched = Vec::with_capacity(plan.len());
        for column in &plan {
            let range = column_range(tab, column);
            let rows = self.source.fetch_required(&range).await?;

            let mut cells = rows.into_iter().map(|row| row.into_iter().next().unwrap_or_default());
            let header = cells.next().unwrap_or_default().trim().to_string();
            if header.is_empty() {
                return Err(SheetError::MissingHeader { column: column.clone() });
            }

            let values: Vec<String> = cells.collect();
            debug!("Column {} ({}) has {} values", column, header, values.len());
            fetched.push((header, values));
        }

        Ok(SnapshotTable::from_columns(fetched))
    }

    /// Build and persist; nothing is written unless the build succeeds.
    pub async fn build_and_save(&self, columns: &[String], tab: &str, path: &Path) -> SheetResult<SnapshotTable> {
        let table = self.build(columns, tab).await?;
        table.save(path)?;
        Ok(table)
    }
}
