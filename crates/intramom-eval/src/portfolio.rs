//! Holdings of the backtest portfolio and their snapshots on disk.

use std::fs;
use std::path::{Path, PathBuf};

use intramom_traits::{Date, Result, SecurityId};
use serde::{Deserialize, Serialize};

const SNAPSHOT_PREFIX: &str = "port_data_";
const SNAPSHOT_DATE_FORMAT: &str = "%Y%m%d";

/// One holding, equally weighted with the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Date the position was opened.
    pub date: Date,
    /// Security identifier.
    pub id: SecurityId,
    /// Synthetic factor value it was selected on.
    #[serde(rename = "factorvalue")]
    pub factor_value: f64,
    /// Price it was bought at.
    #[serde(rename = "buyprice")]
    pub buy_price: f64,
}

/// Holdings opened on a rebalance day.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    /// Rebalance day.
    pub opened: Date,
    /// NAV right before the positions were bought.
    pub entry_nav: f64,
    /// Positions, in selection order.
    pub positions: Vec<Position>,
}

impl Portfolio {
    /// Equally weighted simple return of the positions, given a price for each.
    ///
    /// `price` returns `None` when a security has no price; such a position
    /// counts as unchanged.
    pub fn average_return(&self, mut price: impl FnMut(&Position) -> Option<f64>) -> f64 {
        if self.positions.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .positions
            .iter()
            .map(|pos| price(pos).map_or(0.0, |p| p / pos.buy_price - 1.0))
            .sum();
        total / self.positions.len() as f64
    }

    /// NAV implied by a set of prices.
    pub fn value(&self, price: impl FnMut(&Position) -> Option<f64>) -> f64 {
        self.entry_nav * (1.0 + self.average_return(price))
    }
}

/// Keeps the lowest `fraction` of candidates by factor value.
///
/// Non-finite values are dropped first. Exactly `floor(n * fraction)` names
/// are kept, where `n` is the number of remaining candidates; ties are broken
/// by id.
pub fn select_lowest(
    mut candidates: Vec<(SecurityId, f64)>,
    fraction: f64,
) -> Vec<(SecurityId, f64)> {
    candidates.retain(|(_, value)| value.is_finite());
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    let keep = (candidates.len() as f64 * fraction).floor() as usize;
    candidates.truncate(keep);
    candidates
}

/// Path of the snapshot written on `date`.
pub fn snapshot_path(dir: &Path, date: Date) -> PathBuf {
    dir.join(format!(
        "{SNAPSHOT_PREFIX}{}.csv",
        date.format(SNAPSHOT_DATE_FORMAT)
    ))
}

/// Writes `positions` as `date,id,factorvalue,buyprice`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_snapshot(dir: &Path, date: Date, positions: &[Position]) -> Result<()> {
    fs::create_dir_all(dir)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(snapshot_path(dir, date))?;
    writer.write_record(["date", "id", "factorvalue", "buyprice"])?;
    for position in positions {
        writer.serialize(position)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a snapshot written by [`write_snapshot`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or a row fails to parse.
pub fn read_snapshot(path: &Path) -> Result<Vec<Position>> {
    let mut reader = csv::Reader::from_path(path)?;
    Ok(reader
        .deserialize::<Position>()
        .collect::<std::result::Result<Vec<_>, _>>()?)
}

/// The most recent snapshot in `dir` dated strictly before `before`.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be listed.
pub fn latest_snapshot_before(dir: &Path, before: Date) -> Result<Option<(Date, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut latest: Option<(Date, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(date) = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.strip_prefix(SNAPSHOT_PREFIX))
            .and_then(|stamp| Date::parse_from_str(stamp, SNAPSHOT_DATE_FORMAT).ok())
        else {
            continue;
        };
        if date < before && latest.as_ref().is_none_or(|(best, _)| date > *best) {
            latest = Some((date, path));
        }
    }
    Ok(latest)
}
