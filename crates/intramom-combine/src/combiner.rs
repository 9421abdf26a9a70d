//! Core trait definition for factor combiners.

use intramom_traits::Result;
use ndarray::Array1;

/// One factor's values across a cross-section of securities.
#[derive(Debug, Clone)]
pub struct SignalScore {
    /// Factor name, e.g. `m0`.
    pub name: String,

    /// Value for each security, in a shared security order.
    pub scores: Array1<f64>,
}

/// Combines several factors into one composite value per security.
///
/// All implementations must be thread-safe (Send + Sync).
///
/// # Examples
///
/// ```rust,no_run
/// use intramom_combine::{Combiner, SignalScore};
/// use ndarray::Array1;
///
/// struct FirstOnly;
///
/// impl Combiner for FirstOnly {
///     fn combine(&self, signals: &[SignalScore]) -> intramom_traits::Result<Array1<f64>> {
///         Ok(signals[0].scores.clone())
///     }
///
///     fn name(&self) -> &str {
///         "first_only"
///     }
/// }
/// ```
pub trait Combiner: Send + Sync {
    /// Combine factor values into a composite vector.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No signals provided
    /// - Signal vectors have mismatched lengths
    /// - The combiner cannot accept the given number of signals
    fn combine(&self, signals: &[SignalScore]) -> Result<Array1<f64>>;

    /// Name of this combination strategy.
    fn name(&self) -> &str;
}

/// Checks that `signals` is non-empty and returns the shared length.
pub(crate) fn common_len(signals: &[SignalScore]) -> Result<usize> {
    let Some(first) = signals.first() else {
        return Err("Cannot combine zero signals".into());
    };
    let n_assets = first.scores.len();
    for signal in signals {
        if signal.scores.len() != n_assets {
            return Err(format!(
                "Signal '{}' has {} assets, expected {}",
                signal.name,
                signal.scores.len(),
                n_assets
            )
            .into());
        }
    }
    Ok(n_assets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_len() {
        let a = SignalScore {
            name: "m0".to_string(),
            scores: Array1::from_vec(vec![0.5, -0.2, 1.0]),
        };
        let b = SignalScore {
            name: "m1".to_string(),
            scores: Array1::from_vec(vec![0.1]),
        };
        assert_eq!(common_len(std::slice::from_ref(&a)).unwrap(), 3);
        assert!(common_len(&[a, b]).is_err());
        assert!(common_len(&[]).is_err());
    }
}
