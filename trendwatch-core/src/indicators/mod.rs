//! Indicator implementations shared by the trend, regime and signal components.
//!
//! Indicators are pure functions: price series in, numeric series out, one
//! value per bar. Each one is recomputed from scratch on every evaluation.

pub mod ema;
pub mod rsi;
pub mod sma;

pub use ema::{ema_of_series, ewm_alpha, Ema};
pub use rsi::{Rsi, RsiSmoothing};
pub use sma::rolling_mean;

use crate::domain::PriceSeries;
use crate::error::SignalError;

/// Trait for single-series indicators computed over a full price series.
///
/// # Look-ahead guard
/// The value at bar t may only depend on bars `0..=t`: computing on a prefix
/// must reproduce the prefix of the full computation.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_9", "rsi_14").
    fn name(&self) -> &str;

    /// Minimum number of bars needed before the output is meaningful.
    fn min_bars(&self) -> usize;

    /// Compute one value per bar.
    fn compute(&self, series: &PriceSeries) -> Result<Vec<f64>, SignalError>;

    /// Value at the last bar.
    fn latest(&self, series: &PriceSeries) -> Result<f64, SignalError> {
        let values = self.compute(series)?;
        values
            .last()
            .copied()
            .ok_or_else(|| SignalError::InvalidInput(format!("{}: empty output", self.name())))
    }
}

/// Create a synthetic series from close prices for testing.
///
/// open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> PriceSeries {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = (open.min(close) - 1.0).max(0.01);
            Bar::new(
                base_date + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
            )
        })
        .collect();
    PriceSeries::new(bars).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
