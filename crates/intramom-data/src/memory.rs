//! In-process collaborators.

use std::collections::HashMap;
use std::sync::Mutex;

use intramom_traits::{
    BarLookup, DailyBar, Date, FactorStore, FactorTable, IntramomError, MarketDataProvider,
    MinuteBars, Result, SecurityId, TradingStatus,
};

use crate::market::{DEFAULT_PRICE_LIMIT, lookup_bar, status_from_bars};

/// Market data held in memory.
///
/// Trading status defaults to what the daily bars imply (see
/// [`CsvMarketData`](crate::CsvMarketData)) and can be overridden per day.
#[derive(Debug, Default)]
pub struct InMemoryMarketData {
    minute: HashMap<(SecurityId, Date), MinuteBars>,
    daily: HashMap<SecurityId, Vec<DailyBar>>,
    status: HashMap<(SecurityId, Date), TradingStatus>,
}

impl InMemoryMarketData {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the minute bars of `id` on `date`.
    pub fn insert_minute_bars(&mut self, id: &str, date: Date, bars: MinuteBars) {
        self.minute.insert((id.to_string(), date), bars);
    }

    /// Stores a daily bar of `id`, replacing any bar with the same date.
    pub fn insert_daily_bar(&mut self, id: &str, bar: DailyBar) {
        let bars = self.daily.entry(id.to_string()).or_default();
        match bars.binary_search_by_key(&bar.date, |b| b.date) {
            Ok(idx) => bars[idx] = bar,
            Err(idx) => bars.insert(idx, bar),
        }
    }

    /// Forces the trading status of `id` on `date`.
    pub fn set_status(&mut self, id: &str, date: Date, status: TradingStatus) {
        self.status.insert((id.to_string(), date), status);
    }
}

impl MarketDataProvider for InMemoryMarketData {
    fn minute_bars(&self, id: &str, date: Date) -> Result<Option<MinuteBars>> {
        Ok(self.minute.get(&(id.to_string(), date)).cloned())
    }

    fn daily_bar(&self, id: &str, date: Date, lookup: BarLookup) -> Result<Option<DailyBar>> {
        Ok(self
            .daily
            .get(id)
            .and_then(|bars| lookup_bar(bars, date, lookup)))
    }

    fn trading_status(&self, id: &str, date: Date) -> Result<TradingStatus> {
        if let Some(status) = self.status.get(&(id.to_string(), date)) {
            return Ok(*status);
        }
        Ok(self.daily.get(id).map_or(TradingStatus::Suspended, |bars| {
            status_from_bars(bars, date, DEFAULT_PRICE_LIMIT)
        }))
    }
}

/// Factor store held in memory.
#[derive(Debug, Default)]
pub struct MemoryFactorStore {
    tables: Mutex<HashMap<(String, Date), FactorTable>>,
}

impl MemoryFactorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys stored under `store_id`, oldest first.
    pub fn keys(&self, store_id: &str) -> Vec<Date> {
        let Ok(tables) = self.tables.lock() else {
            return Vec::new();
        };
        let mut keys: Vec<Date> = tables
            .keys()
            .filter(|(id, _)| id == store_id)
            .map(|(_, key)| *key)
            .collect();
        keys.sort_unstable();
        keys
    }
}

impl FactorStore for MemoryFactorStore {
    fn write(&self, store_id: &str, key: Date, table: &FactorTable) -> Result<()> {
        self.tables
            .lock()
            .map_err(|_| IntramomError::Other("factor store poisoned".to_string()))?
            .insert((store_id.to_string(), key), table.clone());
        Ok(())
    }

    fn read(&self, store_id: &str, key: Date) -> Result<Option<FactorTable>> {
        Ok(self
            .tables
            .lock()
            .map_err(|_| IntramomError::Other("factor store poisoned".to_string()))?
            .get(&(store_id.to_string(), key))
            .cloned())
    }
}
