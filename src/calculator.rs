//! Allocation math over a snapshot row
//!
//! Formulas as the tracking sheet defines them:
//!
//! ```text
//! great_total = potential_inv + acum_earned
//! to_play     = great_total * 0.5 + great_total * 0.5 * (1 - avg_records)
//! to_buy      = to_play - playing
//! ```

use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::{SheetError, SheetResult};
use crate::models::{Allocation, Config};
use crate::snapshot::{SnapshotRow, SnapshotTable};
use crate::utils::today_key;

pub const POTENTIAL_INV: &str = "Potential_Inv";
pub const ACUM_EARNED: &str = "AcumEarned";
pub const AVG_RECORDS: &str = "AvgRcrds";
pub const PLAYING: &str = "Playing";

pub fn calculate_great_total(potential_inv: f32, acum_earned: f32) -> f32 {
    potential_inv + acum_earned
}

pub fn calculate_to_play(great_total: f32, avg_records: f32) -> f32 {
    great_total * 0.5 + great_total * 0.5 * (1.0 - avg_records)
}

pub fn calculate_to_buy(to_play: f32, playing: f32) -> f32 {
    to_play - playing
}

/// Parse sheet currency text such as `$1,234.56`, `-$3` or `($12.00)`.
pub fn parse_currency(field: &str, raw: &str) -> SheetResult<f32> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body.chars().filter(|c| *c != '$' && *c != ',').collect();
    let value = parse_finite(field, raw, cleaned.trim())?;

    Ok(if negative { -value } else { value })
}

/// Parse percentage text such as `73%` into a fraction (`0.73`).
pub fn parse_percentage(field: &str, raw: &str) -> SheetResult<f32> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();

    let value = parse_finite(field, raw, number)?;

    Ok(value / 100.0)
}

/// `f32::from_str` also accepts `NaN` and `inf`; sheet cells never mean those.
fn parse_finite(field: &str, raw: &str, number: &str) -> SheetResult<f32> {
    number
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| SheetError::InvalidNumber {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// Compute the allocation for one snapshot row.
pub fn allocation_for_row(row: &SnapshotRow<'_>) -> SheetResult<Allocation> {
    let potential_inv = parse_currency(POTENTIAL_INV, row.require(POTENTIAL_INV)?)?;
    let acum_earned = parse_currency(ACUM_EARNED, row.require(ACUM_EARNED)?)?;
    let playing = parse_currency(PLAYING, row.require(PLAYING)?)?;
    let avg_records = parse_percentage(AVG_RECORDS, row.require(AVG_RECORDS)?)?;

    let great_total = calculate_great_total(potential_inv, acum_earned);
    let to_play = calculate_to_play(great_total, avg_records);
    let to_buy = calculate_to_buy(to_play, playing);

    debug!(
        "{}: great_total={} avg_records={} to_play={} to_buy={}",
        row.date(),
        great_total,
        avg_records,
        to_play,
        to_buy
    );

    Ok(Allocation {
        date: row.date().to_string(),
        potential_inv,
        acum_earned,
        avg_records,
        playing,
        great_total,
        to_play,
        to_buy,
    })
}

/// Loads the persisted snapshot and computes allocations from it
pub struct Calculator {
    snapshot_path: PathBuf,
}

impl Calculator {
    pub fn new(config: &Config) -> Self {
        Self::with_path(config.snapshot_path.clone())
    }

    pub fn with_path(snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
        }
    }

    /// Compute the allocation for `date` (`MM/DD/YYYY`), defaulting to today.
    pub fn compute(&self, date: Option<&str>) -> SheetResult<Allocation> {
        let table = SnapshotTable::load(&self.snapshot_path)?;

        let date = match date {
            Some(date) => date.trim().to_string(),
            None => today_key(),
        };

        let row = table
            .lookup(&date)
            .ok_or_else(|| SheetError::MissingRow { date: date.clone() })?;

        let allocation = allocation_for_row(&row)?;
        info!("Computed allocation for {}: to_buy={:.2}", allocation.date, allocation.to_buy);
        Ok(allocation)
    }
}
