//! Common types used throughout the intramom pipeline.
//!
//! This module defines the bar types handed out by market data providers,
//! the trading status of a security on a day, and [`FactorTable`], the
//! tabular record set exchanged with the factor store.

use chrono::{NaiveDateTime, NaiveTime};
use derive_more::Display;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{IntramomError, Result};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// A security identifier, e.g. `SH600000`.
pub type SecurityId = String;

/// Round `value` to `places` decimal places.
pub fn round_decimals(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Which print of a bar to read.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceField {
    /// The first print of the bar.
    #[display("open")]
    Open,
    /// The last print of the bar.
    #[display("close")]
    Close,
}

/// One minute bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinuteBar {
    /// Bar timestamp (the minute the bar closes).
    pub datetime: NaiveDateTime,
    /// Opening price.
    pub open: f64,
    /// Closing price.
    pub close: f64,
}

/// All minute bars of one security on one trading day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinuteBars {
    bars: Vec<MinuteBar>,
}

impl MinuteBars {
    /// Creates a bar set, ordering the bars by timestamp.
    pub fn new(mut bars: Vec<MinuteBar>) -> Self {
        bars.sort_by_key(|bar| bar.datetime);
        Self { bars }
    }

    /// Returns the bar stamped exactly `at`, if any.
    pub fn bar_at(&self, at: NaiveDateTime) -> Option<&MinuteBar> {
        self.bars
            .binary_search_by_key(&at, |bar| bar.datetime)
            .ok()
            .map(|idx| &self.bars[idx])
    }

    /// Returns the requested print of the bar stamped `date` at `time`.
    pub fn price_at(&self, date: Date, time: NaiveTime, field: PriceField) -> Option<f64> {
        self.bar_at(date.and_time(time)).map(|bar| match field {
            PriceField::Open => bar.open,
            PriceField::Close => bar.close,
        })
    }

    /// Returns the number of bars.
    pub const fn len(&self) -> usize {
        self.bars.len()
    }

    /// Returns whether there are no bars.
    pub const fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Iterates over the bars in time order.
    pub fn iter(&self) -> impl Iterator<Item = &MinuteBar> {
        self.bars.iter()
    }
}

impl From<Vec<MinuteBar>> for MinuteBars {
    fn from(bars: Vec<MinuteBar>) -> Self {
        Self::new(bars)
    }
}

/// One daily bar, prices forward-adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Trading date of the bar.
    pub date: Date,
    /// Opening price.
    pub open: f64,
    /// Closing price.
    pub close: f64,
    /// Traded volume.
    pub vol: f64,
    /// Traded amount.
    pub amount: f64,
    /// Cumulative adjustment factor.
    pub adj_factor: f64,
}

impl DailyBar {
    /// Volume-weighted average price, scaled by the adjustment factor.
    ///
    /// Returns `None` when nothing traded.
    pub fn vwap(&self) -> Option<f64> {
        (self.vol > 0.0).then(|| self.amount / self.vol * self.adj_factor)
    }

    /// VWAP when available, otherwise the close.
    pub fn vwap_or_close(&self) -> f64 {
        self.vwap().unwrap_or(self.close)
    }
}

/// How a daily bar lookup treats dates without a bar.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarLookup {
    /// Only a bar dated exactly on the requested day.
    #[display("exact")]
    Exact,
    /// The latest bar dated on or before the requested day.
    #[display("latest")]
    LatestOnOrBefore,
}

/// Trading status of a security on a given day.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradingStatus {
    /// Traded normally.
    #[display("normal")]
    Normal,
    /// Did not trade.
    #[display("suspended")]
    Suspended,
    /// Closed at the daily upper limit.
    #[display("limit_up")]
    LimitUp,
    /// Closed at the daily lower limit.
    #[display("limit_down")]
    LimitDown,
}

impl TradingStatus {
    /// Whether a new position can be opened in this state.
    pub const fn is_buyable(&self) -> bool {
        !matches!(self, Self::Suspended | Self::LimitUp)
    }
}

/// One row of a [`FactorTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct FactorRow {
    /// Date the values are stamped with.
    pub date: Date,
    /// Security identifier.
    pub id: SecurityId,
    /// Values in the order of [`FactorTable::columns`]. Missing values are NaN.
    pub values: Vec<f64>,
}

/// A dated table of factor values keyed by security, as kept in the factor store.
///
/// Every row carries a `date`, an `id` and one value per named column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactorTable {
    columns: Vec<String>,
    rows: Vec<FactorRow>,
}

impl FactorTable {
    /// Creates an empty table with the given value columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not have one value per column.
    pub fn push(&mut self, row: FactorRow) -> Result<()> {
        if row.values.len() != self.columns.len() {
            return Err(IntramomError::InvalidData(format!(
                "row for {} has {} values, table has {} columns",
                row.id,
                row.values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Value column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Table rows.
    pub fn rows(&self) -> &[FactorRow] {
        &self.rows
    }

    /// Position of a value column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, in row order.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist.
    pub fn column_values(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| IntramomError::InvalidData(format!("missing column {name}")))?;
        Ok(self.rows.iter().map(|row| row.values[idx]).collect())
    }

    /// Returns the number of rows.
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the table has no rows.
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Converts the table into a Polars DataFrame with `date`, `id` and the value columns.
    ///
    /// # Errors
    ///
    /// Returns an error if Polars rejects the columns.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.columns.len() + 2);
        columns.push(Column::new(
            "date".into(),
            self.rows
                .iter()
                .map(|row| row.date.to_string())
                .collect::<Vec<_>>(),
        ));
        columns.push(Column::new(
            "id".into(),
            self.rows
                .iter()
                .map(|row| row.id.as_str())
                .collect::<Vec<_>>(),
        ));
        for (idx, name) in self.columns.iter().enumerate() {
            let values: Vec<f64> = self.rows.iter().map(|row| row.values[idx]).collect();
            columns.push(Column::new(name.as_str().into(), values));
        }
        Ok(DataFrame::new(columns)?)
    }
}
