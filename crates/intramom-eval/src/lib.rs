//! Backtesting for intramom.
//!
//! A long-only portfolio of the lowest decile of the synthetic intraday
//! momentum factor, rebalanced on the first trading day of each month:
//! - [`Backtest`]: the day-by-day engine with checkpoint resume
//! - [`NavSeries`]: the NAV path written to `port_nav.csv`
//! - [`Portfolio`] and [`Position`]: holdings, snapshotted per rebalance
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use intramom_data::{CsvFactorStore, CsvMarketData, DayCalendar};
//! use intramom_eval::{Backtest, BacktestConfig};
//! use intramom_traits::Date;
//!
//! let backtest = Backtest::new(
//!     BacktestConfig::default(),
//!     Arc::new(CsvMarketData::new("data")),
//!     Arc::new(DayCalendar::from_csv("data/trading_days.csv")?),
//!     Arc::new(CsvFactorStore::new("db")),
//! );
//! let result = backtest.run(
//!     Date::from_ymd_opt(2013, 1, 4).unwrap(),
//!     Date::from_ymd_opt(2017, 12, 29).unwrap(),
//! )?;
//! println!("Sharpe Ratio: {:.2}", result.sharpe_ratio);
//! # Ok::<(), intramom_traits::IntramomError>(())
//! ```

pub mod backtest;
pub mod nav;
pub mod portfolio;

// Re-export main types
pub use backtest::{Backtest, BacktestConfig, BacktestResult, NAV_FILE};
pub use nav::{NavPoint, NavSeries};
pub use portfolio::{Portfolio, Position, select_lowest};
