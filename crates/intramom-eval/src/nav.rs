//! Net asset value series.

use std::fs;
use std::path::Path;

use intramom_traits::{Date, Result};
use serde::{Deserialize, Serialize};

/// NAV of the portfolio at the close of one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    /// Trading day.
    pub date: Date,
    /// Net asset value, 1.0 at inception.
    pub nav: f64,
}

/// Date-ordered NAV points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavSeries {
    points: Vec<NavPoint>,
}

impl NavSeries {
    /// A series starting at `nav` on `date`.
    pub fn starting_at(date: Date, nav: f64) -> Self {
        Self {
            points: vec![NavPoint { date, nav }],
        }
    }

    /// Appends a point.
    pub fn push(&mut self, date: Date, nav: f64) {
        self.points.push(NavPoint { date, nav });
    }

    /// The latest point.
    pub fn last(&self) -> Option<&NavPoint> {
        self.points.last()
    }

    /// NAV recorded on `date`.
    pub fn nav_on(&self, date: Date) -> Option<f64> {
        self.points
            .iter()
            .rev()
            .find(|point| point.date == date)
            .map(|point| point.nav)
    }

    /// Drops every point on or after `date`.
    pub fn truncate_from(&mut self, date: Date) {
        self.points.retain(|point| point.date < date);
    }

    /// All points, oldest first.
    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    /// Number of points.
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points.
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Simple returns between consecutive points.
    pub fn daily_returns(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|pair| pair[1].nav / pair[0].nav - 1.0)
            .collect()
    }

    /// Reads a CSV with columns `date,nav`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a row fails to parse.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut points = reader
            .deserialize::<NavPoint>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        points.sort_by_key(|point| point.date);
        Ok(Self { points })
    }

    /// Writes the series as CSV with columns `date,nav`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        for point in &self.points {
            writer.serialize(point)?;
        }
        writer.flush()?;
        Ok(())
    }
}
