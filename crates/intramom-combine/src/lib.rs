//! Factor combination for intramom.
//!
//! This crate weights the five intraday momentum loadings into a single
//! synthetic factor. Weights come from a dated schedule and the latest row
//! effective on the factor date applies.
//!
//! # Examples
//!
//! ```rust,no_run
//! use intramom_combine::{Combiner, LinearCombiner, SignalScore, WeightSchedule};
//! use intramom_traits::Date;
//! use ndarray::Array1;
//!
//! let schedule = WeightSchedule::from_csv("db/intraday_momentum_weights.csv")?;
//! let date = Date::from_ymd_opt(2024, 1, 31).unwrap();
//! if let Some(weight) = schedule.latest_on_or_before(date) {
//!     let combiner = LinearCombiner::from_factor_weight(weight);
//!     let signals: Vec<SignalScore> = ["m0", "m1", "m2", "m3", "m4"]
//!         .iter()
//!         .map(|name| SignalScore {
//!             name: name.to_string(),
//!             scores: Array1::from_vec(vec![0.1, -0.2]),
//!         })
//!         .collect();
//!     let _composite = combiner.combine(&signals)?;
//! }
//! # Ok::<(), intramom_traits::IntramomError>(())
//! ```

mod combiner;
mod linear;
mod synthesizer;
mod weights;

// Re-export main types
pub use combiner::{Combiner, SignalScore};
pub use linear::{LinearCombiner, LinearConfig};
pub use synthesizer::{
    FactorSynthesizer, SYNTHETIC_COLUMN, SYNTHETIC_STORE_ID, SynthesizerConfig, WEIGHTED_COLUMNS,
};
pub use weights::{FactorWeight, WeightSchedule};
