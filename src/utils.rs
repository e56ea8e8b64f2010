use chrono::{Local, NaiveDate};

/// Date format used as the snapshot index, e.g. `03/07/2024`
pub const SNAPSHOT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Today's local date rendered as a snapshot key
pub fn today_key() -> String {
    format_snapshot_date(Local::now().date_naive())
}

pub fn format_snapshot_date(date: NaiveDate) -> String {
    date.format(SNAPSHOT_DATE_FORMAT).to_string()
}

/// Parse a snapshot date key; accepts unpadded month/day like `3/7/2024`
pub fn parse_snapshot_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), SNAPSHOT_DATE_FORMAT).ok()
}

/// True when `label` is a column letter run such as `D` or `AB`
pub fn is_column_label(label: &str) -> bool {
    !label.is_empty() && label.len() <= 3 && label.chars().all(|c| c.is_ascii_alphabetic())
}
