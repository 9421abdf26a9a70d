//! Synthetic intraday momentum: loadings `m0..m4` weighted into one value.

use std::sync::Arc;

use intramom_signals::LOADING_STORE_ID;
use intramom_traits::{
    Date, DayWindow, FactorRow, FactorStore, FactorTable, Result, SortOrder, TradingCalendar,
    round_decimals,
};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::combiner::{Combiner, SignalScore};
use crate::linear::LinearCombiner;
use crate::weights::WeightSchedule;

/// Store id under which synthetic values are persisted.
pub const SYNTHETIC_STORE_ID: &str = "intraday_momentum_synthetic";

/// Value column of a synthetic table.
pub const SYNTHETIC_COLUMN: &str = "factorvalue";

/// Loading columns that enter the synthesis, in weight order.
pub const WEIGHTED_COLUMNS: [&str; 5] = ["m0", "m1", "m2", "m3", "m4"];

const SYNTHETIC_DECIMALS: i32 = 6;

/// Configuration for the factor synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizerConfig {
    /// Only process dates that close a month (range mode).
    pub month_end_only: bool,
    /// Persist synthetic tables to the factor store.
    pub save: bool,
    /// Store id the loadings are read from.
    pub loading_store_id: String,
    /// Store id the synthetic values are written to.
    pub synthetic_store_id: String,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            month_end_only: true,
            save: false,
            loading_store_id: LOADING_STORE_ID.to_string(),
            synthetic_store_id: SYNTHETIC_STORE_ID.to_string(),
        }
    }
}

/// Weights stored loadings into a single synthetic factor.
#[derive(Clone)]
pub struct FactorSynthesizer {
    config: SynthesizerConfig,
    weights: WeightSchedule,
    calendar: Arc<dyn TradingCalendar>,
    store: Arc<dyn FactorStore>,
}

impl std::fmt::Debug for FactorSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactorSynthesizer")
            .field("config", &self.config)
            .field("weights", &self.weights.len())
            .finish_non_exhaustive()
    }
}

impl FactorSynthesizer {
    /// Create a synthesizer.
    pub fn new(
        config: SynthesizerConfig,
        weights: WeightSchedule,
        calendar: Arc<dyn TradingCalendar>,
        store: Arc<dyn FactorStore>,
    ) -> Self {
        Self {
            config,
            weights,
            calendar,
            store,
        }
    }

    /// The synthesizer configuration.
    pub const fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    /// Synthesizes the loadings stored under `calc_date`.
    ///
    /// Returns `Ok(None)` when the loading table for the date is missing or
    /// empty, or when no weight is effective on it. Rows keep the loading table's dates and ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the loading table lacks a
    /// weighted column.
    pub fn synthesize(&self, calc_date: Date) -> Result<Option<FactorTable>> {
        let Some(loadings) = self.store.read(&self.config.loading_store_id, calc_date)? else {
            info!(%calc_date, "no intraday momentum loadings");
            return Ok(None);
        };
        if loadings.is_empty() {
            info!(%calc_date, "intraday momentum loadings are empty");
            return Ok(None);
        }
        let Some(weight) = self.weights.latest_on_or_before(calc_date) else {
            info!(%calc_date, "no factor weight effective");
            return Ok(None);
        };

        let signals = WEIGHTED_COLUMNS
            .iter()
            .map(|name| -> Result<SignalScore> {
                Ok(SignalScore {
                    name: (*name).to_string(),
                    scores: Array1::from_vec(loadings.column_values(name)?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let combiner = LinearCombiner::from_factor_weight(weight);
        let values = combiner.combine(&signals)?;
        let mut table = FactorTable::new([SYNTHETIC_COLUMN]);
        for (row, value) in loadings.rows().iter().zip(values.iter()) {
            table.push(FactorRow {
                date: row.date,
                id: row.id.clone(),
                values: vec![round_decimals(*value, SYNTHETIC_DECIMALS)],
            })?;
        }

        if self.config.save {
            self.store
                .write(&self.config.synthetic_store_id, calc_date, &table)?;
        }
        info!(
            %calc_date,
            weight_date = %weight.date,
            rows = table.len(),
            saved = self.config.save,
            "synthetic intraday momentum done"
        );
        Ok(Some(table))
    }

    /// Synthesizes every trading day in `[start, end]`, or only the latest
    /// trading day on or before `start` when `end` is `None`.
    ///
    /// Returns the dates that produced a table with their row counts.
    ///
    /// # Errors
    ///
    /// Stops at the first store failure.
    pub fn synthesize_range(&self, start: Date, end: Option<Date>) -> Result<Vec<(Date, usize)>> {
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

        let mut done = Vec::new();
        for day in days {
            if let Some(table) = self.synthesize(day)? {
                done.push((day, table.len()));
            }
        }
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::FactorWeight;
    use approx::assert_relative_eq;
    use intramom_data::{DayCalendar, MemoryFactorStore};
    use intramom_signals::LOADING_COLUMNS;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    fn loading_table(label: Date) -> FactorTable {
        let mut table = FactorTable::new(LOADING_COLUMNS);
        table
            .push(FactorRow {
                date: label,
                id: "SH600000".to_string(),
                values: vec![0.1, 0.2, 0.3, 0.4, 0.5, 9.0],
            })
            .unwrap();
        table
            .push(FactorRow {
                date: label,
                id: "SZ000001".to_string(),
                values: vec![-0.1, f64::NAN, 0.0, 0.2, 0.1, 9.0],
            })
            .unwrap();
        table
    }

    fn schedule(scale: f64) -> WeightSchedule {
        WeightSchedule::new(vec![FactorWeight {
            date: date(2024, 1, 1),
            w0: 1.0 * scale,
            w1: 0.5 * scale,
            w2: -1.0 * scale,
            w3: 2.0 * scale,
            w4: 0.25 * scale,
        }])
    }

    fn synthesizer(
        store: &Arc<MemoryFactorStore>,
        weights: WeightSchedule,
        save: bool,
    ) -> FactorSynthesizer {
        let days = vec![
            date(2024, 1, 30),
            date(2024, 1, 31),
            date(2024, 2, 1),
            date(2024, 2, 2),
        ];
        FactorSynthesizer::new(
            SynthesizerConfig {
                save,
                ..SynthesizerConfig::default()
            },
            weights,
            Arc::new(DayCalendar::new(days)),
            Arc::clone(store) as Arc<dyn FactorStore>,
        )
    }

    #[test]
    fn test_synthesize_weights_and_keeps_labels() {
        let store = Arc::new(MemoryFactorStore::new());
        store
            .write(LOADING_STORE_ID, date(2024, 1, 31), &loading_table(date(2024, 2, 1)))
            .unwrap();
        let synth = synthesizer(&store, schedule(1.0), true);

        let table = synth.synthesize(date(2024, 1, 31)).unwrap().unwrap();
        assert_eq!(table.columns(), [SYNTHETIC_COLUMN]);
        assert_eq!(table.rows()[0].date, date(2024, 2, 1));
        // 0.1 + 0.1 - 0.3 + 0.8 + 0.125
        assert_relative_eq!(table.rows()[0].values[0], 0.825, epsilon = 1e-12);
        // NaN counts as zero: -0.1 + 0 + 0 + 0.4 + 0.025
        assert_relative_eq!(table.rows()[1].values[0], 0.325, epsilon = 1e-12);

        let stored = store.read(SYNTHETIC_STORE_ID, date(2024, 1, 31)).unwrap();
        assert_eq!(stored, Some(table));
    }

    #[test]
    fn test_scaling_weights_scales_synthetic_values() {
        let store = Arc::new(MemoryFactorStore::new());
        store
            .write(LOADING_STORE_ID, date(2024, 1, 31), &loading_table(date(2024, 2, 1)))
            .unwrap();
        let base = synthesizer(&store, schedule(1.0), false)
            .synthesize(date(2024, 1, 31))
            .unwrap()
            .unwrap();
        let tripled = synthesizer(&store, schedule(3.0), false)
            .synthesize(date(2024, 1, 31))
            .unwrap()
            .unwrap();
        for (b, t) in base.rows().iter().zip(tripled.rows()) {
            assert_relative_eq!(t.values[0], 3.0 * b.values[0], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_missing_inputs_skip_the_date() {
        let store = Arc::new(MemoryFactorStore::new());
        let synth = synthesizer(&store, schedule(1.0), true);
        assert!(synth.synthesize(date(2024, 1, 31)).unwrap().is_none());

        // Loadings exist but every weight starts later.
        store
            .write(LOADING_STORE_ID, date(2024, 1, 31), &loading_table(date(2024, 2, 1)))
            .unwrap();
        let late = WeightSchedule::new(vec![FactorWeight {
            date: date(2024, 2, 1),
            w0: 1.0,
            w1: 1.0,
            w2: 1.0,
            w3: 1.0,
            w4: 1.0,
        }]);
        let synth = synthesizer(&store, late, true);
        assert!(synth.synthesize(date(2024, 1, 31)).unwrap().is_none());
        assert!(store.keys(SYNTHETIC_STORE_ID).is_empty());
    }

    #[test]
    fn test_empty_loadings_write_nothing() {
        let store = Arc::new(MemoryFactorStore::new());
        store
            .write(LOADING_STORE_ID, date(2024, 1, 31), &FactorTable::new(LOADING_COLUMNS))
            .unwrap();
        let synth = synthesizer(&store, schedule(1.0), true);

        assert!(synth.synthesize(date(2024, 1, 31)).unwrap().is_none());
        assert!(store.keys(SYNTHETIC_STORE_ID).is_empty());

        let done = synth
            .synthesize_range(date(2024, 1, 30), Some(date(2024, 2, 2)))
            .unwrap();
        assert!(done.is_empty());
    }

    #[test]
    fn test_synthesize_range_month_ends() {
        let store = Arc::new(MemoryFactorStore::new());
        store
            .write(LOADING_STORE_ID, date(2024, 1, 31), &loading_table(date(2024, 2, 1)))
            .unwrap();
        let synth = synthesizer(&store, schedule(1.0), true);
        let done = synth
            .synthesize_range(date(2024, 1, 30), Some(date(2024, 2, 2)))
            .unwrap();
        assert_eq!(done, vec![(date(2024, 1, 31), 2)]);
        assert_eq!(store.keys(SYNTHETIC_STORE_ID), vec![date(2024, 1, 31)]);
    }
}
