//! Intraday momentum signals.
//!
//! Splits each trading day into five legs (overnight and four intraday
//! sessions), sums every leg over a trailing window, and aggregates those
//! loadings across a security universe.
//!
//! # Components
//!
//! - [`IntradayMomentum`]: loadings `m0..m4` and `m_normal` for one security
//! - [`LoadingAggregator`]: the universe and date-range driver, with bounded
//!   parallelism and a cooldown between dates
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use intramom_data::{CsvFactorStore, CsvMarketData, DayCalendar, SecurityList};
//! use intramom_signals::{
//!     AggregatorConfig, IntradayMomentum, IntradayMomentumConfig, LoadingAggregator,
//! };
//! use intramom_traits::{Date, TradingCalendar};
//!
//! # async fn run() -> intramom_traits::Result<()> {
//! let calendar: Arc<dyn TradingCalendar> =
//!     Arc::new(DayCalendar::from_csv("data/trading_days.csv")?);
//! let calculator = IntradayMomentum::new(
//!     IntradayMomentumConfig::default(),
//!     Arc::new(CsvMarketData::new("data")),
//!     Arc::clone(&calendar),
//! );
//! let aggregator = LoadingAggregator::new(
//!     AggregatorConfig::default(),
//!     calculator,
//!     calendar,
//!     Arc::new(SecurityList::from_csv("data/securities.csv")?),
//!     Arc::new(CsvFactorStore::new("db")),
//! );
//! let start = Date::from_ymd_opt(2024, 1, 1).unwrap();
//! let _reports = aggregator.run(start, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod intraday;

pub use aggregator::{
    AggregatorConfig, DateReport, LOADING_STORE_ID, LoadingAggregator, TaskOutcome,
};
pub use intraday::{
    AnchorPrices, IntradayMomentum, IntradayMomentumConfig, IntradayReturnSet, LOADING_COLUMNS,
    MomentumLoading,
};
