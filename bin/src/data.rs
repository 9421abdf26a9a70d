//! Data loading utilities for the intramom CLI.

use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use intramom_data::{CsvFactorStore, CsvMarketData, DayCalendar, SecurityList};
use intramom_traits::IntramomError;

use crate::config::Settings;

/// The collaborators every command works with.
pub(crate) struct Sources {
    pub(crate) calendar: Arc<DayCalendar>,
    pub(crate) market: Arc<CsvMarketData>,
    pub(crate) store: Arc<CsvFactorStore>,
}

impl Sources {
    /// Opens the trading calendar and wires up market data and the factor store.
    pub(crate) fn open(settings: &Settings) -> anyhow::Result<Self> {
        let calendar_file = settings.calendar_file();
        let calendar = DayCalendar::from_csv(&calendar_file)
            .with_context(|| format!("reading trading calendar {}", calendar_file.display()))?;
        Ok(Self {
            calendar: Arc::new(calendar),
            market: Arc::new(CsvMarketData::new(&settings.data_dir)),
            store: Arc::new(CsvFactorStore::new(&settings.db_dir)),
        })
    }
}

/// Load the security universe.
pub(crate) fn load_securities(settings: &Settings) -> anyhow::Result<SecurityList> {
    let path = settings.securities_file();
    SecurityList::from_csv(&path).with_context(|| format!("reading securities {}", path.display()))
}

/// Parse a date string in YYYY-MM-DD or YYYYMMDD format.
pub(crate) fn parse_date(date_str: &str) -> Result<NaiveDate, IntramomError> {
    let date_str = date_str.trim();
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_str, "%Y%m%d"))
        .map_err(|e| IntramomError::InvalidDate(format!("{date_str}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-01-15").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
        assert_eq!(parse_date("20240115").unwrap(), date);
    }

    #[test]
    fn test_parse_date_invalid() {
        let result = parse_date("invalid");
        assert!(result.is_err());
    }
}
