//! Fixed linear weighting.

use intramom_traits::Result;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::combiner::{Combiner, SignalScore, common_len};
use crate::weights::FactorWeight;

/// Configuration for the linear combiner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConfig {
    /// Weight of each signal, in signal order.
    pub weights: Vec<f64>,
}

/// Dot product of factor values with fixed weights.
///
/// Missing values (NaN) count as zero.
///
/// # Examples
///
/// ```rust,no_run
/// use intramom_combine::{Combiner, LinearCombiner, SignalScore};
/// use ndarray::Array1;
///
/// let combiner = LinearCombiner::from_weights(vec![0.5, 0.5]);
/// let signals = vec![
///     SignalScore { name: "m0".to_string(), scores: Array1::from_vec(vec![0.2, -0.4]) },
///     SignalScore { name: "m1".to_string(), scores: Array1::from_vec(vec![0.6, f64::NAN]) },
/// ];
/// let composite = combiner.combine(&signals).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct LinearCombiner {
    config: LinearConfig,
}

impl LinearCombiner {
    /// Create a new linear combiner with the given configuration.
    pub const fn new(config: LinearConfig) -> Self {
        Self { config }
    }

    /// Create a combiner from bare weights.
    pub const fn from_weights(weights: Vec<f64>) -> Self {
        Self::new(LinearConfig { weights })
    }

    /// Create a combiner for `m0..m4` from a weight row.
    pub fn from_factor_weight(weight: &FactorWeight) -> Self {
        Self::from_weights(weight.weights().to_vec())
    }

    /// The weights.
    pub fn weights(&self) -> &[f64] {
        &self.config.weights
    }
}

impl Combiner for LinearCombiner {
    fn combine(&self, signals: &[SignalScore]) -> Result<Array1<f64>> {
        let n_assets = common_len(signals)?;
        if signals.len() != self.config.weights.len() {
            return Err(format!(
                "{} signals for {} weights",
                signals.len(),
                self.config.weights.len()
            )
            .into());
        }

        let mut loadings = Array2::<f64>::zeros((n_assets, signals.len()));
        for (mut column, signal) in loadings.axis_iter_mut(Axis(1)).zip(signals) {
            column.assign(&signal.scores);
        }
        loadings.mapv_inplace(|v| if v.is_nan() { 0.0 } else { v });

        let weights = Array1::from_vec(self.config.weights.clone());
        Ok(loadings.dot(&weights))
    }

    fn name(&self) -> &str {
        "linear"
    }
}
