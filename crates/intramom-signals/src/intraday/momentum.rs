//! Per-security intraday momentum loadings.

use std::sync::Arc;

use intramom_traits::{
    Date, DayWindow, FactorRow, FactorTable, IntramomError, MarketDataProvider, Result,
    SecurityId, SortOrder, TradingCalendar, round_decimals,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::returns::{AnchorPrices, IntradayReturnSet, log_ratio};

/// Value columns of a momentum loading table, in order.
pub const LOADING_COLUMNS: [&str; 6] = ["m0", "m1", "m2", "m3", "m4", "m_normal"];

/// Decimal places kept in persisted loadings.
pub const LOADING_DECIMALS: i32 = 6;

/// Configuration for the intraday momentum calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntradayMomentumConfig {
    /// Paired return-days summed into each loading.
    pub days: usize,
    /// Trading days searched backwards for usable minute data.
    pub window_days: usize,
}

impl Default for IntradayMomentumConfig {
    fn default() -> Self {
        Self {
            days: 20,
            window_days: 90,
        }
    }
}

impl IntradayMomentumConfig {
    /// Create a new configuration.
    pub const fn new(days: usize, window_days: usize) -> Self {
        Self { days, window_days }
    }
}

/// Momentum loadings of one security on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentumLoading {
    /// Security identifier.
    pub id: SecurityId,
    /// Date the row is labelled with.
    pub date: Date,
    /// `[m0, m1, m2, m3, m4]`: each intraday leg summed over the lookback.
    pub momentum: [f64; 5],
    /// Close-to-close log-return from the oldest to the newest observation.
    pub m_normal: f64,
}

impl MomentumLoading {
    /// All six values in [`LOADING_COLUMNS`] order.
    pub fn values(&self) -> [f64; 6] {
        let [m0, m1, m2, m3, m4] = self.momentum;
        [m0, m1, m2, m3, m4, self.m_normal]
    }

    /// Copy with every value rounded to `places` decimals.
    #[must_use]
    pub fn rounded(&self, places: i32) -> Self {
        Self {
            id: self.id.clone(),
            date: self.date,
            momentum: self.momentum.map(|v| round_decimals(v, places)),
            m_normal: round_decimals(self.m_normal, places),
        }
    }

    /// The loading as a factor table row.
    pub fn to_row(&self) -> FactorRow {
        FactorRow {
            date: self.date,
            id: self.id.clone(),
            values: self.values().to_vec(),
        }
    }

    /// Builds loadings back from a table with [`LOADING_COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns an error if any loading column is missing.
    pub fn from_table(table: &FactorTable) -> Result<Vec<Self>> {
        let idx = LOADING_COLUMNS
            .iter()
            .map(|name| {
                table.column_index(name).ok_or_else(|| {
                    IntramomError::InvalidData(format!("loading table lacks column {name}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(table
            .rows()
            .iter()
            .map(|row| Self {
                id: row.id.clone(),
                date: row.date,
                momentum: [
                    row.values[idx[0]],
                    row.values[idx[1]],
                    row.values[idx[2]],
                    row.values[idx[3]],
                    row.values[idx[4]],
                ],
                m_normal: row.values[idx[5]],
            })
            .collect())
    }
}

/// Collects loadings into a table with [`LOADING_COLUMNS`].
///
/// # Errors
///
/// Never fails for well-formed loadings; the width check of
/// [`FactorTable::push`] is propagated.
pub fn loadings_to_table<'a>(
    loadings: impl IntoIterator<Item = &'a MomentumLoading>,
) -> Result<FactorTable> {
    let mut table = FactorTable::new(LOADING_COLUMNS);
    for loading in loadings {
        table.push(loading.to_row())?;
    }
    Ok(table)
}

/// Intraday momentum calculator.
///
/// Walks the trading days ending at the calculation date newest first,
/// collecting the five anchor prices of every day with complete minute data,
/// until `days + 1` observations are found. Consecutive observations are
/// paired into [`IntradayReturnSet`]s and each leg is summed.
#[derive(Clone)]
pub struct IntradayMomentum {
    config: IntradayMomentumConfig,
    market: Arc<dyn MarketDataProvider>,
    calendar: Arc<dyn TradingCalendar>,
}

impl std::fmt::Debug for IntradayMomentum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntradayMomentum")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IntradayMomentum {
    /// Create a calculator over the given collaborators.
    pub fn new(
        config: IntradayMomentumConfig,
        market: Arc<dyn MarketDataProvider>,
        calendar: Arc<dyn TradingCalendar>,
    ) -> Self {
        Self {
            config,
            market,
            calendar,
        }
    }

    /// The calculator configuration.
    pub const fn config(&self) -> &IntradayMomentumConfig {
        &self.config
    }

    /// Collects anchor prices newest first, stopping at `days + 1` observations.
    fn observations(&self, id: &str, calc_date: Date) -> Result<Vec<AnchorPrices>> {
        let wanted = self.config.days + 1;
        let window = self.calendar.trading_days(
            DayWindow::Ending {
                end: calc_date,
                count: self.config.window_days,
            },
            SortOrder::Descending,
        )?;

        let mut observations = Vec::with_capacity(wanted);
        for day in window {
            let Some(bars) = self.market.minute_bars(id, day)? else {
                trace!(id, %day, "no minute bars");
                continue;
            };
            let Some(prices) = AnchorPrices::from_bars(day, &bars) else {
                debug!(id, %day, "anchor bar missing, day skipped");
                continue;
            };
            observations.push(prices);
            if observations.len() == wanted {
                break;
            }
        }
        Ok(observations)
    }

    /// Computes the loadings of `id` as of `calc_date`.
    ///
    /// Returns `Ok(None)` when fewer than `days + 1` usable days exist in the
    /// window. The returned row is dated `calc_date` and unrounded.
    ///
    /// # Errors
    ///
    /// Returns an error if market data cannot be read or a price is not positive.
    pub fn calc_loading(&self, id: &str, calc_date: Date) -> Result<Option<MomentumLoading>> {
        let observations = self.observations(id, calc_date)?;
        if observations.len() <= self.config.days {
            debug!(
                id,
                %calc_date,
                found = observations.len(),
                "insufficient intraday history"
            );
            return Ok(None);
        }

        let mut momentum = [0.0; 5];
        for pair in observations.windows(2) {
            let set = IntradayReturnSet::between(&pair[0], &pair[1])?;
            for (acc, r) in momentum.iter_mut().zip(set.returns) {
                *acc += r;
            }
        }

        let (Some(newest), Some(oldest)) = (observations.first(), observations.last()) else {
            return Ok(None);
        };
        let m_normal = log_ratio(newest.p1500, oldest.p1500)?;

        Ok(Some(MomentumLoading {
            id: id.to_string(),
            date: calc_date,
            momentum,
            m_normal,
        }))
    }
}
