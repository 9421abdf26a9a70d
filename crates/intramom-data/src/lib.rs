//! Data collaborators for the intramom pipeline.
//!
//! Concrete implementations of the traits in `intramom-traits`:
//! - [`DayCalendar`]: trading calendar from a list of trading days
//! - [`SecurityList`]: listing dates of the security universe
//! - [`CsvMarketData`]: minute and daily bars kept as CSV files on disk
//! - [`CsvFactorStore`]: factor tables kept as one CSV file per date
//! - [`InMemoryMarketData`] and [`MemoryFactorStore`]: in-process variants
//!
//! # Example
//!
//! ```rust,no_run
//! use intramom_data::{CsvFactorStore, DayCalendar};
//!
//! let calendar = DayCalendar::from_csv("data/trading_days.csv")?;
//! let store = CsvFactorStore::new("db");
//! # Ok::<(), intramom_traits::IntramomError>(())
//! ```

mod basics;
mod calendar;
mod market;
mod memory;
mod store;

pub use basics::{Listing, SecurityList};
pub use calendar::DayCalendar;
pub use market::{CsvMarketData, DEFAULT_DAILY_CACHE_CAPACITY, DEFAULT_PRICE_LIMIT};
pub use memory::{InMemoryMarketData, MemoryFactorStore};
pub use store::CsvFactorStore;

pub(crate) const KEY_FORMAT: &str = "%Y%m%d";
