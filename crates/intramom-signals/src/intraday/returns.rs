//! Anchor prices and the five intraday log-returns built from them.

use chrono::NaiveTime;
use intramom_traits::{Date, IntramomError, MinuteBars, PriceField, Result};

/// Intraday anchors: (hour, minute, print) in session order.
///
/// The 09:31 bar contributes its open, i.e. the opening auction print; the
/// others contribute the close of the bar ending at that minute.
pub const ANCHOR_SCHEDULE: [(u32, u32, PriceField); 5] = [
    (9, 31, PriceField::Open),
    (10, 30, PriceField::Close),
    (11, 30, PriceField::Close),
    (14, 0, PriceField::Close),
    (15, 0, PriceField::Close),
];

/// Prices of one security at the five intraday anchors of one trading day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPrices {
    /// Trading day.
    pub date: Date,
    /// Open print at 09:31.
    pub p0930: f64,
    /// Close print at 10:30.
    pub p1030: f64,
    /// Close print at 11:30.
    pub p1130: f64,
    /// Close print at 14:00.
    pub p1400: f64,
    /// Close print at 15:00.
    pub p1500: f64,
}

impl AnchorPrices {
    /// Reads the anchors out of a day's minute bars.
    ///
    /// Returns `None` if any anchor bar is missing.
    pub fn from_bars(date: Date, bars: &MinuteBars) -> Option<Self> {
        let mut prices = [0.0; 5];
        for (slot, (hour, minute, field)) in prices.iter_mut().zip(ANCHOR_SCHEDULE) {
            let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
            *slot = bars.price_at(date, time, field)?;
        }
        let [p0930, p1030, p1130, p1400, p1500] = prices;
        Some(Self {
            date,
            p0930,
            p1030,
            p1130,
            p1400,
            p1500,
        })
    }
}

/// Natural log of `num / den`.
///
/// # Errors
///
/// Returns [`IntramomError::Computation`] unless both prices are finite and positive.
pub fn log_ratio(num: f64, den: f64) -> Result<f64> {
    if !(num.is_finite() && den.is_finite() && num > 0.0 && den > 0.0) {
        return Err(IntramomError::Computation(format!(
            "log-return undefined for {num} / {den}"
        )));
    }
    Ok((num / den).ln())
}

/// The five log-returns of one paired return-day.
///
/// - `r0`: overnight, open of `newer` over the 15:00 close of `older`
/// - `r1`: 09:31 to 10:30 of `newer`
/// - `r2`: 10:30 to 11:30 of `newer`
/// - `r3`: 11:30 to 14:00 of `newer`
/// - `r4`: 14:00 to 15:00 of `newer`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntradayReturnSet {
    /// Day the intraday legs belong to.
    pub date: Date,
    /// `[r0, r1, r2, r3, r4]`.
    pub returns: [f64; 5],
}

impl IntradayReturnSet {
    /// Builds the return set of `newer` against the preceding observation `older`.
    ///
    /// The lookback walk visits days newest first, so `newer` is the
    /// observation collected just before `older`. Together the five legs span
    /// `older`'s 15:00 close to `newer`'s 15:00 close.
    ///
    /// # Errors
    ///
    /// Returns an error if any price involved is not positive.
    pub fn between(newer: &AnchorPrices, older: &AnchorPrices) -> Result<Self> {
        Ok(Self {
            date: newer.date,
            returns: [
                log_ratio(newer.p0930, older.p1500)?,
                log_ratio(newer.p1030, newer.p0930)?,
                log_ratio(newer.p1130, newer.p1030)?,
                log_ratio(newer.p1400, newer.p1130)?,
                log_ratio(newer.p1500, newer.p1400)?,
            ],
        })
    }

    /// Sum of the five legs.
    pub fn total(&self) -> f64 {
        self.returns.iter().sum()
    }
}
