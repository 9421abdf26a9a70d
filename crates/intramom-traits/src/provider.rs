//! Collaborator traits.
//!
//! The factor pipeline does not fetch data or keep files itself. It is handed
//! implementations of these traits: market data, a trading calendar, security
//! reference data and a factor store. All of them must be `Send + Sync` so the
//! loading aggregator can share them across worker tasks.

use crate::{
    BarLookup, DailyBar, Date, FactorTable, MinuteBars, Result, SecurityId, TradingStatus,
};

/// Ordering of a trading-day sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    Descending,
}

/// A window of trading days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayWindow {
    /// All trading days in `[start, end]`.
    Between {
        /// First calendar date (inclusive).
        start: Date,
        /// Last calendar date (inclusive).
        end: Date,
    },
    /// The last `count` trading days on or before `end`.
    Ending {
        /// Last calendar date (inclusive).
        end: Date,
        /// Number of trading days.
        count: usize,
    },
    /// The first `count` trading days on or after `start`.
    Starting {
        /// First calendar date (inclusive).
        start: Date,
        /// Number of trading days.
        count: usize,
    },
}

/// Source of minute bars, daily bars and trading status.
pub trait MarketDataProvider: Send + Sync {
    /// Minute bars of `id` on `date`, or `None` when the day has no data.
    fn minute_bars(&self, id: &str, date: Date) -> Result<Option<MinuteBars>>;

    /// Forward-adjusted daily bar of `id` for `date` under the given lookup rule.
    fn daily_bar(&self, id: &str, date: Date, lookup: BarLookup) -> Result<Option<DailyBar>>;

    /// Trading status of `id` on `date`.
    fn trading_status(&self, id: &str, date: Date) -> Result<TradingStatus>;
}

/// Trading calendar of the market.
pub trait TradingCalendar: Send + Sync {
    /// Trading days inside `window`, in the requested order.
    fn trading_days(&self, window: DayWindow, order: SortOrder) -> Result<Vec<Date>>;

    /// Whether `date` is the first trading day of its month.
    fn is_month_start(&self, date: Date) -> bool;

    /// Whether `date` is the last trading day of its month.
    fn is_month_end(&self, date: Date) -> bool;

    /// The trading day immediately before `date`.
    fn previous_trading_day(&self, date: Date) -> Result<Option<Date>> {
        let Some(day) = date.pred_opt() else {
            return Ok(None);
        };
        let days =
            self.trading_days(DayWindow::Ending { end: day, count: 1 }, SortOrder::Ascending)?;
        Ok(days.first().copied())
    }

    /// The trading day immediately after `date`.
    fn next_trading_day(&self, date: Date) -> Result<Option<Date>> {
        let Some(day) = date.succ_opt() else {
            return Ok(None);
        };
        let days = self.trading_days(
            DayWindow::Starting {
                start: day,
                count: 1,
            },
            SortOrder::Ascending,
        )?;
        Ok(days.first().copied())
    }
}

/// Security reference data.
pub trait SecurityBasics: Send + Sync {
    /// Ids of all securities listed strictly before `listed_before`.
    fn list_securities(&self, listed_before: Date) -> Result<Vec<SecurityId>>;
}

/// Persistent store of dated factor tables.
pub trait FactorStore: Send + Sync {
    /// Writes `table` under `store_id` and `key`, replacing any previous table.
    fn write(&self, store_id: &str, key: Date, table: &FactorTable) -> Result<()>;

    /// Reads the table stored under `store_id` and `key`, `None` if there is none.
    fn read(&self, store_id: &str, key: Date) -> Result<Option<FactorTable>>;
}
