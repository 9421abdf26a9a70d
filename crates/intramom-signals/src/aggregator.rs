//! Factor loading aggregator.
//!
//! Drives [`IntradayMomentum`] across the eligible universe for each
//! calculation date, one date at a time, with a bounded number of securities
//! computed concurrently.

use std::sync::Arc;
use std::time::Duration;

use chrono::Days;
use futures::stream::{self, StreamExt};
use intramom_traits::{
    Date, DayWindow, FactorStore, FactorTable, IntramomError, Result, SecurityBasics, SecurityId,
    SortOrder, TradingCalendar,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::intraday::{IntradayMomentum, LOADING_DECIMALS, MomentumLoading, loadings_to_table};

/// Store id under which momentum loadings are persisted.
pub const LOADING_STORE_ID: &str = "intraday_momentum";

/// Configuration for the loading aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Securities computed concurrently.
    pub workers: usize,
    /// Pause after each date, skipped after the last one.
    pub cooldown: Duration,
    /// Minimum calendar days between listing and calculation date.
    pub listing_age_days: u64,
    /// Only process dates that close a month.
    pub month_end_only: bool,
    /// Persist each date's table to the factor store.
    pub save: bool,
    /// Store id used when saving.
    pub store_id: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            cooldown: Duration::from_secs(360),
            listing_age_days: 90,
            month_end_only: true,
            save: false,
            store_id: LOADING_STORE_ID.to_string(),
        }
    }
}

/// Result of one per-security task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// Loadings computed and rounded.
    Computed(MomentumLoading),
    /// Not enough usable history in the lookback window.
    Insufficient {
        /// Security identifier.
        id: SecurityId,
    },
    /// The calculation failed.
    Failed {
        /// Security identifier.
        id: SecurityId,
        /// Error message.
        reason: String,
    },
}

impl TaskOutcome {
    /// Identifier of the security the task ran for.
    pub fn id(&self) -> &str {
        match self {
            Self::Computed(loading) => &loading.id,
            Self::Insufficient { id } | Self::Failed { id, .. } => id,
        }
    }
}

/// Outcome of one calculation date.
#[derive(Debug, Clone)]
pub struct DateReport {
    /// Date the loadings were computed as of; also the store key.
    pub calc_date: Date,
    /// Date each row is labelled with, the next trading day.
    pub label_date: Date,
    /// Computed loadings, sorted by id.
    pub table: FactorTable,
    /// Securities skipped for insufficient history.
    pub insufficient: usize,
    /// Securities whose calculation failed, with the reason.
    pub failed: Vec<(SecurityId, String)>,
}

/// Runs the momentum calculator over a universe and a date range.
#[derive(Clone)]
pub struct LoadingAggregator {
    config: AggregatorConfig,
    calculator: IntradayMomentum,
    calendar: Arc<dyn TradingCalendar>,
    basics: Arc<dyn SecurityBasics>,
    store: Arc<dyn FactorStore>,
}

impl std::fmt::Debug for LoadingAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingAggregator")
            .field("config", &self.config)
            .field("calculator", &self.calculator)
            .finish_non_exhaustive()
    }
}

impl LoadingAggregator {
    /// Create an aggregator.
    pub fn new(
        config: AggregatorConfig,
        calculator: IntradayMomentum,
        calendar: Arc<dyn TradingCalendar>,
        basics: Arc<dyn SecurityBasics>,
        store: Arc<dyn FactorStore>,
    ) -> Self {
        Self {
            config,
            calculator,
            calendar,
            basics,
            store,
        }
    }

    /// The aggregator configuration.
    pub const fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Calculation dates of a run.
    ///
    /// Without `end`, only the latest trading day on or before `start`.
    /// Otherwise every trading day in `[start, end]`, restricted to month ends
    /// when configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the calendar lookup fails.
    pub fn calc_dates(&self, start: Date, end: Option<Date>) -> Result<Vec<Date>> {
        let window = match end {
            Some(end) => DayWindow::Between { start, end },
            None => DayWindow::Ending {
                end: start,
                count: 1,
            },
        };
        let mut days = self.calendar.trading_days(window, SortOrder::Ascending)?;
        if self.config.month_end_only {
            days.retain(|day| self.calendar.is_month_end(*day));
        }
        Ok(days)
    }

    /// Computes the loadings of every eligible security on `calc_date`.
    ///
    /// Rows are rounded and labelled with the next trading day. The table is
    /// persisted under `calc_date` when `save` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the universe or calendar cannot be read, or if
    /// saving fails. Per-security failures are reported, not returned.
    pub async fn compute_date(&self, calc_date: Date) -> Result<DateReport> {
        let cutoff = calc_date
            .checked_sub_days(Days::new(self.config.listing_age_days))
            .ok_or_else(|| IntramomError::InvalidDate(format!("{calc_date} minus listing age")))?;
        let universe = self.basics.list_securities(cutoff)?;
        let label_date = match self.calendar.next_trading_day(calc_date)? {
            Some(next) => next,
            None => {
                warn!(%calc_date, "no next trading day known, labelling rows with calc date");
                calc_date
            }
        };
        info!(%calc_date, %label_date, securities = universe.len(), "computing intraday momentum");

        let outcomes: Vec<TaskOutcome> = stream::iter(universe)
            .map(|id| {
                let calculator = self.calculator.clone();
                async move {
                    let task_id = id.clone();
                    let joined = tokio::task::spawn_blocking(move || {
                        calculator.calc_loading(&task_id, calc_date)
                    })
                    .await;
                    match joined {
                        Ok(Ok(Some(loading))) => TaskOutcome::Computed(loading),
                        Ok(Ok(None)) => TaskOutcome::Insufficient { id },
                        Ok(Err(e)) => TaskOutcome::Failed {
                            id,
                            reason: e.to_string(),
                        },
                        Err(e) => TaskOutcome::Failed {
                            id,
                            reason: format!("task aborted: {e}"),
                        },
                    }
                }
            })
            .buffer_unordered(self.config.workers.max(1))
            .collect()
            .await;

        let mut loadings = Vec::with_capacity(outcomes.len());
        let mut insufficient = 0;
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Computed(loading) => {
                    let mut loading = loading.rounded(LOADING_DECIMALS);
                    loading.date = label_date;
                    loadings.push(loading);
                }
                TaskOutcome::Insufficient { id } => {
                    debug!(%calc_date, id, "insufficient data");
                    insufficient += 1;
                }
                TaskOutcome::Failed { id, reason } => {
                    error!(%calc_date, id, %reason, "loading calculation failed");
                    failed.push((id, reason));
                }
            }
        }
        loadings.sort_by(|a, b| a.id.cmp(&b.id));
        failed.sort();

        let table = loadings_to_table(&loadings)?;
        if self.config.save {
            self.store.write(&self.config.store_id, calc_date, &table)?;
        }
        info!(
            %calc_date,
            rows = table.len(),
            insufficient,
            failed = failed.len(),
            saved = self.config.save,
            "intraday momentum done"
        );

        Ok(DateReport {
            calc_date,
            label_date,
            table,
            insufficient,
            failed,
        })
    }

    /// Processes every calculation date of the run in order.
    ///
    /// # Errors
    ///
    /// Stops at the first date that fails; see [`Self::compute_date`].
    pub async fn run(&self, start: Date, end: Option<Date>) -> Result<Vec<DateReport>> {
        let dates = self.calc_dates(start, end)?;
        if dates.is_empty() {
            info!(%start, ?end, "no calculation dates in range");
        }

        let mut reports = Vec::with_capacity(dates.len());
        for (i, calc_date) in dates.iter().enumerate() {
            reports.push(self.compute_date(*calc_date).await?);

            let is_last = i + 1 == dates.len();
            if !is_last && !self.config.cooldown.is_zero() {
                info!(secs = self.config.cooldown.as_secs(), "cooling down");
                tokio::time::sleep(self.config.cooldown).await;
            }
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intraday::{ANCHOR_SCHEDULE, IntradayMomentumConfig};
    use intramom_data::{DayCalendar, InMemoryMarketData, Listing, MemoryFactorStore, SecurityList};
    use intramom_traits::{MinuteBar, MinuteBars};

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekdays(start: Date, end: Date) -> Vec<Date> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| chrono::Datelike::weekday(d).number_from_monday() <= 5)
            .collect()
    }

    fn flat_bars(day: Date, prices: [f64; 5]) -> MinuteBars {
        MinuteBars::new(
            ANCHOR_SCHEDULE
                .iter()
                .zip(prices)
                .map(|((h, m, _), p)| MinuteBar {
                    datetime: day.and_hms_opt(*h, *m, 0).unwrap(),
                    open: p,
                    close: p,
                })
                .collect(),
        )
    }

    struct Fixture {
        aggregator: LoadingAggregator,
        store: Arc<MemoryFactorStore>,
        days: Vec<Date>,
    }

    fn fixture(config: AggregatorConfig) -> Fixture {
        let days = weekdays(date(2023, 10, 2), date(2024, 2, 29));
        let mut market = InMemoryMarketData::new();
        for (i, day) in days.iter().enumerate() {
            let p = 10.0 + i as f64 * 0.01;
            market.insert_minute_bars("SH600000", *day, flat_bars(*day, [p; 5]));
            market.insert_minute_bars("SZ000001", *day, flat_bars(*day, [p * 2.0; 5]));
            // Zero 14:00 print: the calculation fails.
            market.insert_minute_bars("SZ000002", *day, flat_bars(*day, [p, p, p, 0.0, p]));
        }
        // Only two days of history.
        for day in &days[days.len() - 2..] {
            market.insert_minute_bars("SH600004", *day, flat_bars(*day, [10.0; 5]));
        }

        let basics = SecurityList::new(vec![
            Listing {
                id: "SZ000001".to_string(),
                list_date: date(2010, 1, 4),
            },
            Listing {
                id: "SH600000".to_string(),
                list_date: date(2010, 1, 4),
            },
            Listing {
                id: "SZ000002".to_string(),
                list_date: date(2010, 1, 4),
            },
            Listing {
                id: "SH600004".to_string(),
                list_date: date(2010, 1, 4),
            },
            // Too recent on every date of the fixture.
            Listing {
                id: "SH688999".to_string(),
                list_date: date(2024, 1, 2),
            },
        ]);

        let calendar: Arc<dyn TradingCalendar> = Arc::new(DayCalendar::new(days.clone()));
        let store = Arc::new(MemoryFactorStore::new());
        let calculator = IntradayMomentum::new(
            IntradayMomentumConfig::default(),
            Arc::new(market),
            Arc::clone(&calendar),
        );
        let aggregator = LoadingAggregator::new(
            config,
            calculator,
            calendar,
            Arc::new(basics),
            Arc::clone(&store) as Arc<dyn FactorStore>,
        );
        Fixture {
            aggregator,
            store,
            days,
        }
    }

    fn quick_config() -> AggregatorConfig {
        AggregatorConfig {
            cooldown: Duration::ZERO,
            ..AggregatorConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = AggregatorConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.cooldown, Duration::from_secs(360));
        assert_eq!(config.listing_age_days, 90);
        assert!(config.month_end_only);
        assert!(!config.save);
        assert_eq!(config.store_id, "intraday_momentum");
    }

    #[test]
    fn test_calc_dates() {
        let fx = fixture(quick_config());
        let dates = fx
            .aggregator
            .calc_dates(date(2023, 11, 1), Some(date(2024, 2, 29)))
            .unwrap();
        // February's end is unknown to the calendar, so only three month ends.
        assert_eq!(
            dates,
            vec![date(2023, 11, 30), date(2023, 12, 29), date(2024, 1, 31)]
        );

        // Single-date mode lands on the latest trading day on or before start.
        let single = fx.aggregator.calc_dates(date(2023, 12, 31), None).unwrap();
        assert_eq!(single, vec![date(2023, 12, 29)]);
    }

    #[tokio::test]
    async fn test_compute_date_reports_every_outcome() {
        let fx = fixture(AggregatorConfig {
            save: true,
            ..quick_config()
        });
        let calc_date = date(2024, 1, 31);
        let report = fx.aggregator.compute_date(calc_date).await.unwrap();

        assert_eq!(report.calc_date, calc_date);
        assert_eq!(report.label_date, date(2024, 2, 1));
        let ids: Vec<&str> = report.table.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["SH600000", "SZ000001"]);
        assert!(report.table.rows().iter().all(|r| r.date == date(2024, 2, 1)));
        assert_eq!(report.insufficient, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "SZ000002");

        let stored = fx.store.read(LOADING_STORE_ID, calc_date).unwrap().unwrap();
        assert_eq!(stored, report.table);
    }

    #[tokio::test]
    async fn test_results_do_not_depend_on_worker_count() {
        let calc_date = date(2024, 1, 31);
        let serial = fixture(AggregatorConfig {
            workers: 1,
            ..quick_config()
        });
        let parallel = fixture(AggregatorConfig {
            workers: 8,
            ..quick_config()
        });
        let a = serial.aggregator.compute_date(calc_date).await.unwrap();
        let b = parallel.aggregator.compute_date(calc_date).await.unwrap();
        assert_eq!(a.table, b.table);
        assert_eq!(a.failed, b.failed);
    }

    #[tokio::test]
    async fn test_run_without_save_leaves_store_empty() {
        let fx = fixture(quick_config());
        let reports = fx
            .aggregator
            .run(date(2023, 12, 1), Some(date(2024, 1, 31)))
            .await
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].calc_date, date(2023, 12, 29));
        assert_eq!(reports[1].label_date, date(2024, 2, 1));
        assert!(fx.store.keys(LOADING_STORE_ID).is_empty());
        assert!(fx.days.contains(&reports[0].label_date));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_only_between_dates() {
        let cooldown = Duration::from_secs(360);
        let fx = fixture(AggregatorConfig {
            cooldown,
            ..AggregatorConfig::default()
        });
        let started = tokio::time::Instant::now();
        let reports = fx
            .aggregator
            .run(date(2023, 11, 1), Some(date(2024, 1, 31)))
            .await
            .unwrap();
        assert_eq!(reports.len(), 3);
        // Two pauses for three dates, none after the last one.
        let elapsed = started.elapsed();
        assert!(elapsed >= cooldown * 2, "{elapsed:?}");
        assert!(elapsed < cooldown * 2 + Duration::from_secs(1), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_date_skips_cooldown() {
        let fx = fixture(AggregatorConfig::default());
        let started = tokio::time::Instant::now();
        let reports = fx.aggregator.run(date(2024, 1, 31), None).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_run_saves_under_calc_date() {
        let fx = fixture(AggregatorConfig {
            save: true,
            ..quick_config()
        });
        fx.aggregator
            .run(date(2023, 12, 1), Some(date(2024, 1, 31)))
            .await
            .unwrap();
        assert_eq!(
            fx.store.keys(LOADING_STORE_ID),
            vec![date(2023, 12, 29), date(2024, 1, 31)]
        );
    }
}
