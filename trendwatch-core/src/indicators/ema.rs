//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = EMA[t-1] + k * (x[t] - EMA[t-1]), k = 2 / (span + 1)
//! Seed: EMA[0] = x[0] (no SMA warm-up, every bar has a value).
//! Lookback: 0.

use crate::domain::PriceSeries;
use crate::error::SignalError;

use super::Indicator;

/// EMA of closing prices.
#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Result<Self, SignalError> {
        if span == 0 {
            return Err(SignalError::InvalidParameter("EMA span must be >= 1".into()));
        }
        Ok(Self {
            span,
            name: format!("ema_{span}"),
        })
    }

    pub fn span(&self) -> usize {
        self.span
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn compute(&self, series: &PriceSeries) -> Result<Vec<f64>, SignalError> {
        ema_of_series(&series.closes(), self.span)
    }
}

/// Compute an EMA over an arbitrary numeric series.
///
/// Output has the same length as the input and `y[0] == x[0]`.
pub fn ema_of_series(values: &[f64], span: usize) -> Result<Vec<f64>, SignalError> {
    if span == 0 {
        return Err(SignalError::InvalidParameter("EMA span must be >= 1".into()));
    }
    ewm_alpha(values, 2.0 / (span as f64 + 1.0))
}

/// Exponential smoothing with an explicit factor `alpha` in (0, 1].
///
/// Same recurrence as `ema_of_series`; Wilder smoothing uses `alpha = 1/period`.
pub fn ewm_alpha(values: &[f64], alpha: f64) -> Result<Vec<f64>, SignalError> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(SignalError::InvalidParameter(format!(
            "smoothing factor must be in (0, 1], got {alpha}"
        )));
    }
    let Some(&first) = values.first() else {
        return Err(SignalError::InvalidInput("cannot smooth an empty series".into()));
    };

    let mut result = Vec::with_capacity(values.len());
    let mut prev = first;
    result.push(prev);
    for &x in &values[1..] {
        prev += alpha * (x - prev);
        result.push(prev);
    }
    Ok(result)
}
