//! Trading calendar backed by an explicit list of trading days.

use std::path::Path;

use chrono::Datelike;
use intramom_traits::{Date, DayWindow, Result, SortOrder, TradingCalendar};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CalendarRecord {
    date: Date,
}

/// Trading calendar over a fixed, ordered set of trading days.
///
/// Month boundaries are derived from neighbouring trading days, so a boundary
/// is only reported when the neighbouring day is part of the calendar.
#[derive(Debug, Clone, Default)]
pub struct DayCalendar {
    days: Vec<Date>,
}

impl DayCalendar {
    /// Creates a calendar from trading days in any order; duplicates are dropped.
    pub fn new(mut days: Vec<Date>) -> Self {
        days.sort_unstable();
        days.dedup();
        Self { days }
    }

    /// Loads trading days from a CSV file with a `date` column (`YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a date fails to parse.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let days = reader
            .deserialize::<CalendarRecord>()
            .map(|record| record.map(|r| r.date))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(days))
    }

    /// All trading days, oldest first.
    pub fn days(&self) -> &[Date] {
        &self.days
    }

    fn position(&self, date: Date) -> Option<usize> {
        self.days.binary_search(&date).ok()
    }
}

fn same_month(a: Date, b: Date) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

impl TradingCalendar for DayCalendar {
    fn trading_days(&self, window: DayWindow, order: SortOrder) -> Result<Vec<Date>> {
        let range = match window {
            DayWindow::Between { start, end } => {
                let lo = self.days.partition_point(|d| *d < start);
                let hi = self.days.partition_point(|d| *d <= end);
                lo..hi.max(lo)
            }
            DayWindow::Ending { end, count } => {
                let hi = self.days.partition_point(|d| *d <= end);
                hi.saturating_sub(count)..hi
            }
            DayWindow::Starting { start, count } => {
                let lo = self.days.partition_point(|d| *d < start);
                lo..(lo + count).min(self.days.len())
            }
        };
        let mut days = self.days[range].to_vec();
        if order == SortOrder::Descending {
            days.reverse();
        }
        Ok(days)
    }

    fn is_month_start(&self, date: Date) -> bool {
        match self.position(date) {
            Some(idx) if idx > 0 => !same_month(self.days[idx - 1], date),
            _ => false,
        }
    }

    fn is_month_end(&self, date: Date) -> bool {
        match self.position(date) {
            Some(idx) if idx + 1 < self.days.len() => !same_month(self.days[idx + 1], date),
            _ => false,
        }
    }
}
