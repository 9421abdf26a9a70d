//! Market data kept as CSV files on disk.

use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use intramom_traits::{
    BarLookup, DailyBar, Date, IntramomError, MarketDataProvider, MinuteBar, MinuteBars, Result,
    SecurityId, TradingStatus, round_decimals,
};
use serde::Deserialize;
use tracing::debug;

use crate::KEY_FORMAT;

/// Default daily price limit as a fraction of the previous close.
pub const DEFAULT_PRICE_LIMIT: f64 = 0.10;

/// Default number of securities whose daily bars stay in memory.
pub const DEFAULT_DAILY_CACHE_CAPACITY: usize = 512;

const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct MinuteRecord {
    datetime: String,
    open: f64,
    close: f64,
}

/// Market data provider reading a directory of CSV files.
///
/// Layout under the root directory:
/// - `minute/<id>/<YYYYMMDD>.csv` with columns `datetime,open,close`
/// - `daily/<id>.csv` with columns `date,open,close,vol,amount,adj_factor`
///
/// Daily files are cached per security. Once the cache holds `capacity`
/// securities the oldest entry is evicted.
#[derive(Debug)]
pub struct CsvMarketData {
    root: PathBuf,
    price_limit: f64,
    cache_capacity: usize,
    daily_cache: Mutex<DailyCache>,
}

#[derive(Debug, Default)]
struct DailyCache {
    bars: HashMap<SecurityId, Arc<Vec<DailyBar>>>,
    order: VecDeque<SecurityId>,
}

impl DailyCache {
    fn get(&self, id: &str) -> Option<Arc<Vec<DailyBar>>> {
        self.bars.get(id).map(Arc::clone)
    }

    /// Inserts `bars` unless another reader got there first; returns the cached entry.
    fn insert(
        &mut self,
        id: &str,
        bars: Arc<Vec<DailyBar>>,
        capacity: usize,
    ) -> Arc<Vec<DailyBar>> {
        if let Some(cached) = self.get(id) {
            return cached;
        }
        while self.bars.len() >= capacity.max(1) {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.bars.remove(&oldest);
        }
        self.order.push_back(id.to_string());
        self.bars.insert(id.to_string(), Arc::clone(&bars));
        bars
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.bars.len()
    }
}

fn fetch_error(path: &Path, e: impl Display) -> IntramomError {
    IntramomError::DataFetch(format!("{}: {e}", path.display()))
}

impl CsvMarketData {
    /// Creates a provider rooted at `root` with the default price limit.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            price_limit: DEFAULT_PRICE_LIMIT,
            cache_capacity: DEFAULT_DAILY_CACHE_CAPACITY,
            daily_cache: Mutex::new(DailyCache::default()),
        }
    }

    /// Sets the daily price limit used to detect limit-up and limit-down closes.
    #[must_use]
    pub const fn with_price_limit(mut self, price_limit: f64) -> Self {
        self.price_limit = price_limit;
        self
    }

    /// Sets how many securities' daily bars are kept in memory.
    #[must_use]
    pub const fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    fn minute_path(&self, id: &str, date: Date) -> PathBuf {
        self.root
            .join("minute")
            .join(id)
            .join(format!("{}.csv", date.format(KEY_FORMAT)))
    }

    fn daily_path(&self, id: &str) -> PathBuf {
        self.root.join("daily").join(format!("{id}.csv"))
    }

    fn read_minute_file(path: &Path) -> Result<Vec<MinuteBar>> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| fetch_error(path, e))?;
        let mut bars = Vec::new();
        for record in reader.deserialize::<MinuteRecord>() {
            let record = record.map_err(|e| fetch_error(path, e))?;
            let datetime = NaiveDateTime::parse_from_str(record.datetime.trim(), MINUTE_FORMAT)
                .map_err(|e| {
                    IntramomError::InvalidData(format!(
                        "{}: bad timestamp {:?}: {e}",
                        path.display(),
                        record.datetime
                    ))
                })?;
            bars.push(MinuteBar {
                datetime,
                open: record.open,
                close: record.close,
            });
        }
        Ok(bars)
    }

    fn read_daily_file(&self, id: &str) -> Result<Vec<DailyBar>> {
        let path = self.daily_path(id);
        if !path.exists() {
            debug!(id, "no daily bar file");
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path).map_err(|e| fetch_error(&path, e))?;
        let mut bars = reader
            .deserialize::<DailyBar>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| fetch_error(&path, e))?;
        bars.sort_by_key(|bar| bar.date);
        Ok(bars)
    }

    fn lock_cache(&self) -> Result<std::sync::MutexGuard<'_, DailyCache>> {
        self.daily_cache
            .lock()
            .map_err(|_| IntramomError::Other("daily bar cache poisoned".to_string()))
    }

    fn daily_bars(&self, id: &str) -> Result<Arc<Vec<DailyBar>>> {
        let cached = self.lock_cache()?.get(id);
        if let Some(bars) = cached {
            return Ok(bars);
        }
        // Read without holding the lock so workers do not queue on file I/O.
        let bars = Arc::new(self.read_daily_file(id)?);
        Ok(self.lock_cache()?.insert(id, bars, self.cache_capacity))
    }
}

/// Picks a bar from date-ordered `bars` according to `lookup`.
pub(crate) fn lookup_bar(bars: &[DailyBar], date: Date, lookup: BarLookup) -> Option<DailyBar> {
    let end = bars.partition_point(|bar| bar.date <= date);
    let candidate = end.checked_sub(1).map(|idx| bars[idx])?;
    match lookup {
        BarLookup::Exact => (candidate.date == date).then_some(candidate),
        BarLookup::LatestOnOrBefore => Some(candidate),
    }
}

/// Derives the trading status on `date` from date-ordered `bars`.
pub(crate) fn status_from_bars(bars: &[DailyBar], date: Date, price_limit: f64) -> TradingStatus {
    let Ok(idx) = bars.binary_search_by_key(&date, |bar| bar.date) else {
        return TradingStatus::Suspended;
    };
    let bar = bars[idx];
    if bar.vol <= 0.0 {
        return TradingStatus::Suspended;
    }
    let Some(prev) = idx.checked_sub(1).map(|i| bars[i]) else {
        return TradingStatus::Normal;
    };

    const EPS: f64 = 1e-6;
    let up = round_decimals(prev.close * (1.0 + price_limit), 2);
    let down = round_decimals(prev.close * (1.0 - price_limit), 2);
    if bar.close >= up - EPS {
        TradingStatus::LimitUp
    } else if bar.close <= down + EPS {
        TradingStatus::LimitDown
    } else {
        TradingStatus::Normal
    }
}

impl MarketDataProvider for CsvMarketData {
    fn minute_bars(&self, id: &str, date: Date) -> Result<Option<MinuteBars>> {
        let path = self.minute_path(id, date);
        if !path.exists() {
            return Ok(None);
        }
        let bars = Self::read_minute_file(&path)?;
        if bars.is_empty() {
            return Ok(None);
        }
        Ok(Some(MinuteBars::new(bars)))
    }

    fn daily_bar(&self, id: &str, date: Date, lookup: BarLookup) -> Result<Option<DailyBar>> {
        let bars = self.daily_bars(id)?;
        Ok(lookup_bar(&bars, date, lookup))
    }

    fn trading_status(&self, id: &str, date: Date) -> Result<TradingStatus> {
        let bars = self.daily_bars(id)?;
        Ok(status_from_bars(&bars, date, self.price_limit))
    }
}
