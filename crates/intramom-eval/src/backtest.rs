//! Monthly rebalanced backtest of the synthetic factor.
//!
//! On the first trading day of each month the portfolio is sold at the day's
//! VWAP, the lowest decile of the synthetic factor is bought at VWAP, and the
//! day closes marked at the close. Every other day the holdings are marked at
//! the close against their buy prices.

use std::path::PathBuf;
use std::sync::Arc;

use intramom_combine::{SYNTHETIC_COLUMN, SYNTHETIC_STORE_ID};
use intramom_traits::{
    BarLookup, Date, DayWindow, FactorStore, IntramomError, MarketDataProvider, Result, SortOrder,
    TradingCalendar,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::nav::{NavPoint, NavSeries};
use crate::portfolio::{
    Portfolio, Position, latest_snapshot_before, read_snapshot, select_lowest, write_snapshot,
};

/// File name of the NAV series inside the output directory.
pub const NAV_FILE: &str = "port_nav.csv";

/// Backtesting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Fraction of eligible securities bought at each rebalance
    pub selection_fraction: f64,
    /// Directory holding snapshots and the NAV series
    pub output_dir: PathBuf,
    /// Store id of the synthetic factor tables
    pub factor_store_id: String,
    /// Continue from the NAV series and snapshots already in `output_dir`
    pub resume: bool,
    /// Trading days per year, used to annualise the Sharpe ratio
    pub trading_days_per_year: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            selection_fraction: 0.1,
            output_dir: PathBuf::from("db/intraday_momentum_backtest"),
            factor_store_id: SYNTHETIC_STORE_ID.to_string(),
            resume: true,
            trading_days_per_year: 252,
        }
    }
}

/// Backtesting results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// NAV series, including any resumed history
    pub nav: Vec<NavPoint>,
    /// Total return over the whole series
    pub total_return: f64,
    /// Sharpe ratio of daily NAV returns (annualized)
    pub sharpe_ratio: f64,
    /// Maximum drawdown
    pub max_drawdown: f64,
    /// Rebalances performed in this run
    pub rebalances: usize,
    /// Securities held at the end of the run
    pub holdings: usize,
}

impl BacktestResult {
    /// Calculate Sharpe ratio from returns.
    pub fn calculate_sharpe(returns: &[f64], trading_days_per_year: usize) -> f64 {
        let valid_returns: Vec<f64> = returns.iter().copied().filter(|x| x.is_finite()).collect();

        if valid_returns.len() < 2 {
            return f64::NAN;
        }

        let mean = valid_returns.iter().sum::<f64>() / valid_returns.len() as f64;
        let variance = valid_returns
            .iter()
            .map(|r| (r - mean).powi(2))
            .sum::<f64>()
            / (valid_returns.len() - 1) as f64;
        let std = variance.sqrt();

        if std == 0.0 {
            f64::NAN
        } else {
            mean / std * (trading_days_per_year as f64).sqrt()
        }
    }

    /// Calculate maximum drawdown of a NAV path.
    pub fn calculate_max_drawdown(nav: &[f64]) -> f64 {
        let mut max_dd = 0.0;
        let mut peak = f64::NEG_INFINITY;

        for &value in nav {
            if value > peak {
                peak = value;
            }
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }

        max_dd
    }

    fn from_series(
        series: &NavSeries,
        rebalances: usize,
        holdings: usize,
        trading_days_per_year: usize,
    ) -> Self {
        let values: Vec<f64> = series.points().iter().map(|p| p.nav).collect();
        let total_return = match (values.first(), values.last()) {
            (Some(first), Some(last)) => last / first - 1.0,
            _ => 0.0,
        };
        Self {
            nav: series.points().to_vec(),
            total_return,
            sharpe_ratio: Self::calculate_sharpe(&series.daily_returns(), trading_days_per_year),
            max_drawdown: Self::calculate_max_drawdown(&values),
            rebalances,
            holdings,
        }
    }
}

/// Backtesting engine.
#[derive(Clone)]
pub struct Backtest {
    config: BacktestConfig,
    market: Arc<dyn MarketDataProvider>,
    calendar: Arc<dyn TradingCalendar>,
    store: Arc<dyn FactorStore>,
}

impl std::fmt::Debug for Backtest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backtest")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Backtest {
    /// Create a new backtest over the given collaborators.
    pub fn new(
        config: BacktestConfig,
        market: Arc<dyn MarketDataProvider>,
        calendar: Arc<dyn TradingCalendar>,
        store: Arc<dyn FactorStore>,
    ) -> Self {
        Self {
            config,
            market,
            calendar,
            store,
        }
    }

    /// The backtest configuration.
    pub const fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run the backtest over the trading days in `[start, end]`.
    ///
    /// Snapshots are written on every rebalance day and the NAV series is
    /// written once the last day is done.
    ///
    /// # Errors
    ///
    /// Returns an error if the range holds no trading day, a collaborator
    /// fails, or an output file cannot be written.
    pub fn run(&self, start: Date, end: Date) -> Result<BacktestResult> {
        let days = self
            .calendar
            .trading_days(DayWindow::Between { start, end }, SortOrder::Ascending)?;
        let Some(&first) = days.first() else {
            return Err(IntramomError::InvalidDate(format!(
                "no trading days between {start} and {end}"
            )));
        };
        let mut prev_day = match self.calendar.previous_trading_day(first)? {
            Some(day) => day,
            None => first.pred_opt().ok_or_else(|| {
                IntramomError::InvalidDate(format!("no day before {first}"))
            })?,
        };

        let (mut series, mut holding) = match self.resume(first)? {
            Some(state) => state,
            None => (NavSeries::starting_at(prev_day, 1.0), None),
        };
        info!(
            %first,
            last = ?days.last(),
            resumed_points = series.len() - 1,
            holdings = holding.as_ref().map_or(0, |p| p.positions.len()),
            "backtest starting"
        );

        let mut rebalances = 0;
        for day in days {
            let last_nav = series.last().map_or(1.0, |point| point.nav);
            let nav = if self.calendar.is_month_start(day) {
                let sell_nav = match &holding {
                    Some(portfolio) => portfolio.value(|pos| self.sell_price(&pos.id, day)),
                    None => last_nav,
                };
                holding = self.rebalance(day, prev_day, sell_nav)?;
                rebalances += 1;
                match &holding {
                    Some(portfolio) => portfolio.value(|pos| self.close_price(&pos.id, day)),
                    None => sell_nav,
                }
            } else {
                match &holding {
                    Some(portfolio) => portfolio.value(|pos| self.close_price(&pos.id, day)),
                    None => last_nav,
                }
            };
            debug!(%day, nav, "valued");
            series.push(day, nav);
            prev_day = day;
        }

        let nav_path = self.config.output_dir.join(NAV_FILE);
        series.write_csv(&nav_path)?;

        let holdings = holding.map_or(0, |p| p.positions.len());
        let result = BacktestResult::from_series(
            &series,
            rebalances,
            holdings,
            self.config.trading_days_per_year,
        );
        info!(
            path = %nav_path.display(),
            total_return = result.total_return,
            max_drawdown = result.max_drawdown,
            rebalances,
            "backtest done"
        );
        Ok(result)
    }

    /// Sells the old holdings and buys the new selection on `day`.
    ///
    /// Returns `None` when nothing could be bought; the portfolio then holds
    /// cash until the next rebalance.
    fn rebalance(&self, day: Date, prev_day: Date, entry_nav: f64) -> Result<Option<Portfolio>> {
        let Some(table) = self.store.read(&self.config.factor_store_id, prev_day)? else {
            warn!(%day, factor_date = %prev_day, "no synthetic factor table, holding cash");
            write_snapshot(&self.config.output_dir, day, &[])?;
            return Ok(None);
        };
        let column = table.column_index(SYNTHETIC_COLUMN).ok_or_else(|| {
            IntramomError::InvalidData(format!("factor table lacks {SYNTHETIC_COLUMN}"))
        })?;

        let mut candidates = Vec::with_capacity(table.len());
        for row in table.rows() {
            let status = self.market.trading_status(&row.id, day)?;
            if status.is_buyable() {
                candidates.push((row.id.clone(), row.values[column]));
            } else {
                debug!(%day, id = row.id, %status, "excluded from selection");
            }
        }
        let eligible = candidates.len();
        let selected = select_lowest(candidates, self.config.selection_fraction);

        let mut positions = Vec::with_capacity(selected.len());
        for (id, factor_value) in selected {
            let Some(bar) = self.market.daily_bar(&id, day, BarLookup::Exact)? else {
                warn!(%day, id, "no bar on rebalance day, not bought");
                continue;
            };
            positions.push(Position {
                date: day,
                id,
                factor_value,
                buy_price: bar.vwap_or_close(),
            });
        }
        write_snapshot(&self.config.output_dir, day, &positions)?;
        info!(%day, eligible, bought = positions.len(), "rebalanced");

        if positions.is_empty() {
            return Ok(None);
        }
        Ok(Some(Portfolio {
            opened: day,
            entry_nav,
            positions,
        }))
    }

    /// VWAP if the latest bar is from `day`, otherwise the latest close.
    fn sell_price(&self, id: &str, day: Date) -> Option<f64> {
        match self.market.daily_bar(id, day, BarLookup::LatestOnOrBefore) {
            Ok(Some(bar)) if bar.date == day => Some(bar.vwap_or_close()),
            Ok(Some(bar)) => Some(bar.close),
            Ok(None) => {
                warn!(%day, id, "no daily bar to sell at, valued at cost");
                None
            }
            Err(e) => {
                warn!(%day, id, error = %e, "daily bar lookup failed, valued at cost");
                None
            }
        }
    }

    /// Latest close on or before `day`.
    fn close_price(&self, id: &str, day: Date) -> Option<f64> {
        match self.market.daily_bar(id, day, BarLookup::LatestOnOrBefore) {
            Ok(bar) => bar.map(|bar| bar.close),
            Err(e) => {
                warn!(%day, id, error = %e, "daily bar lookup failed, valued at cost");
                None
            }
        }
    }

    /// Restores the NAV series and holdings written by an earlier run.
    fn resume(&self, first: Date) -> Result<Option<(NavSeries, Option<Portfolio>)>> {
        if !self.config.resume {
            return Ok(None);
        }
        let nav_path = self.config.output_dir.join(NAV_FILE);
        if !nav_path.exists() {
            return Ok(None);
        }
        let mut series = NavSeries::read_csv(&nav_path)?;
        series.truncate_from(first);
        if series.is_empty() {
            return Ok(None);
        }

        let Some((opened, path)) = latest_snapshot_before(&self.config.output_dir, first)? else {
            return Ok(Some((series, None)));
        };
        let positions = read_snapshot(&path)?;
        if positions.is_empty() {
            return Ok(Some((series, None)));
        }
        let nav_opened = series.nav_on(opened).ok_or_else(|| {
            IntramomError::InsufficientData(format!("no NAV recorded on snapshot date {opened}"))
        })?;

        // The snapshot day closed at entry * (1 + r), r the close-over-buy return.
        let mut portfolio = Portfolio {
            opened,
            entry_nav: 1.0,
            positions,
        };
        let growth = 1.0 + portfolio.average_return(|pos| self.close_price(&pos.id, opened));
        portfolio.entry_nav = nav_opened / growth;
        info!(%opened, entry_nav = portfolio.entry_nav, "resumed holdings from snapshot");
        Ok(Some((series, Some(portfolio))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_backtest_config_default() {
        let config = BacktestConfig::default();
        assert_eq!(config.selection_fraction, 0.1);
        assert_eq!(config.factor_store_id, "intraday_momentum_synthetic");
        assert_eq!(config.trading_days_per_year, 252);
        assert!(config.resume);
    }

    #[test]
    fn test_calculate_sharpe() {
        let returns = vec![0.01, -0.005, 0.015, 0.002, -0.003];
        let sharpe = BacktestResult::calculate_sharpe(&returns, 252);
        assert!(sharpe.is_finite());
        assert!(BacktestResult::calculate_sharpe(&[0.01], 252).is_nan());
        assert!(BacktestResult::calculate_sharpe(&[0.01, 0.01], 252).is_nan());
    }

    #[test]
    fn test_calculate_max_drawdown() {
        let nav = vec![1.0, 1.1, 1.21, 0.968, 1.0, 1.3];
        let max_dd = BacktestResult::calculate_max_drawdown(&nav);
        assert_relative_eq!(max_dd, 0.2, epsilon = 1e-12);
        assert_eq!(BacktestResult::calculate_max_drawdown(&[1.0, 1.1, 1.2]), 0.0);
    }
}
