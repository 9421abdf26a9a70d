//! Dated factor weights.

use std::path::Path;

use intramom_traits::{Date, Result};
use serde::{Deserialize, Serialize};

/// Weights of `m0..m4` effective from a date on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeight {
    /// First date the weights apply to.
    pub date: Date,
    /// Weight of `m0`.
    pub w0: f64,
    /// Weight of `m1`.
    pub w1: f64,
    /// Weight of `m2`.
    pub w2: f64,
    /// Weight of `m3`.
    pub w3: f64,
    /// Weight of `m4`.
    pub w4: f64,
}

impl FactorWeight {
    /// The weights as an array, `w0` first.
    pub const fn weights(&self) -> [f64; 5] {
        [self.w0, self.w1, self.w2, self.w3, self.w4]
    }
}

/// Weight rows ordered by effective date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightSchedule {
    rows: Vec<FactorWeight>,
}

impl WeightSchedule {
    /// Creates a schedule from rows in any order.
    ///
    /// When two rows share a date the later one wins.
    pub fn new(mut rows: Vec<FactorWeight>) -> Self {
        rows.reverse();
        rows.sort_by_key(|row| row.date);
        rows.dedup_by_key(|row| row.date);
        Self { rows }
    }

    /// Reads a CSV with columns `date,w0,w1,w2,w3,w4`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a row fails to parse.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows = reader
            .deserialize::<FactorWeight>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(rows))
    }

    /// The most recent row effective on or before `date`.
    pub fn latest_on_or_before(&self, date: Date) -> Option<&FactorWeight> {
        let end = self.rows.partition_point(|row| row.date <= date);
        end.checked_sub(1).map(|idx| &self.rows[idx])
    }

    /// Rows, oldest first.
    pub fn rows(&self) -> &[FactorWeight] {
        &self.rows
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the schedule has no rows.
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    fn weight(date: Date, w0: f64) -> FactorWeight {
        FactorWeight {
            date,
            w0,
            w1: 0.0,
            w2: 0.0,
            w3: 0.0,
            w4: 0.0,
        }
    }

    #[test]
    fn test_latest_on_or_before() {
        let schedule = WeightSchedule::new(vec![
            weight(date(2024, 3, 1), 3.0),
            weight(date(2024, 1, 1), 1.0),
            weight(date(2024, 2, 1), 2.0),
        ]);
        assert!(schedule.latest_on_or_before(date(2023, 12, 31)).is_none());
        assert_eq!(schedule.latest_on_or_before(date(2024, 1, 1)).unwrap().w0, 1.0);
        assert_eq!(schedule.latest_on_or_before(date(2024, 2, 15)).unwrap().w0, 2.0);
        assert_eq!(schedule.latest_on_or_before(date(2025, 1, 1)).unwrap().w0, 3.0);
    }

    #[test]
    fn test_duplicate_dates_keep_last() {
        let schedule = WeightSchedule::new(vec![
            weight(date(2024, 1, 1), 1.0),
            weight(date(2024, 1, 1), 5.0),
        ]);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.rows()[0].w0, 5.0);
    }

    #[test]
    fn test_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.csv");
        std::fs::write(
            &path,
            "date,w0,w1,w2,w3,w4\n2024-02-01,0.1,0.2,0.3,0.2,0.2\n2024-01-02,1,0,0,0,0\n",
        )
        .unwrap();
        let schedule = WeightSchedule::from_csv(&path).unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(
            schedule.latest_on_or_before(date(2024, 2, 29)).unwrap().weights(),
            [0.1, 0.2, 0.3, 0.2, 0.2]
        );
    }
}
