#![doc(issue_tracker_base_url = "https://github.com/factordynamics/intramom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and collaborator traits for the intramom pipeline.
//!
//! The intraday momentum pipeline talks to four outside collaborators: a
//! market data provider, a trading calendar, a security reference list and a
//! factor store. This crate defines the traits those collaborators implement,
//! the value types that flow between them, and the shared error type.

/// The version of the intramom-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod provider;
pub mod types;

// Re-exports
pub use error::{IntramomError, Result};
pub use provider::{
    DayWindow, FactorStore, MarketDataProvider, SecurityBasics, SortOrder, TradingCalendar,
};
pub use types::{
    BarLookup, DailyBar, Date, FactorRow, FactorTable, MinuteBar, MinuteBars, PriceField,
    SecurityId, TradingStatus, round_decimals,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
