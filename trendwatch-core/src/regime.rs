//! Regime classifier: uptrend / downtrend / ranging from a long-span EMA.
//!
//! Counts how many of the last `lookback` closes sit strictly above (bullish)
//! or strictly below (bearish) the long EMA at the same bar. A close exactly
//! on the EMA counts for neither side.

use serde::{Deserialize, Serialize};

use crate::domain::{PriceSeries, Regime};
use crate::error::SignalError;
use crate::indicators::ema_of_series;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeConfig {
    pub long_span: usize,
    pub lookback: usize,
    /// Minimum share of the lookback window on one side of the EMA.
    pub threshold: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            long_span: 60,
            lookback: 50,
            threshold: 0.85,
        }
    }
}

impl RegimeConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.long_span == 0 {
            return Err(SignalError::InvalidParameter("regime long_span must be >= 1".into()));
        }
        if self.lookback == 0 {
            return Err(SignalError::InvalidParameter("regime lookback must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(SignalError::InvalidParameter(format!(
                "regime threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Classification plus the numbers behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeReading {
    pub regime: Regime,
    pub bullish_ratio: f64,
    pub bearish_ratio: f64,
    /// Long EMA at the last bar.
    pub long_ema: f64,
}

#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    config: RegimeConfig,
}

impl RegimeClassifier {
    pub fn new(config: RegimeConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RegimeConfig {
        &self.config
    }

    pub fn classify(&self, series: &PriceSeries) -> Result<RegimeReading, SignalError> {
        self.classify_closes(&series.closes())
    }

    pub fn classify_closes(&self, closes: &[f64]) -> Result<RegimeReading, SignalError> {
        let lookback = self.config.lookback;
        if closes.len() < lookback {
            return Err(SignalError::insufficient(lookback, closes.len()));
        }

        let long_ema = ema_of_series(closes, self.config.long_span)?;
        let start = closes.len() - lookback;

        let (mut above, mut below) = (0usize, 0usize);
        for (close, ema) in closes[start..].iter().zip(&long_ema[start..]) {
            if close > ema {
                above += 1;
            } else if close < ema {
                below += 1;
            }
        }

        let bullish_ratio = above as f64 / lookback as f64;
        let bearish_ratio = below as f64 / lookback as f64;

        let regime = if bullish_ratio >= self.config.threshold {
            Regime::Uptrend
        } else if bearish_ratio >= self.config.threshold {
            Regime::Downtrend
        } else {
            Regime::Ranging
        };

        Ok(RegimeReading {
            regime,
            bullish_ratio,
            bearish_ratio,
            long_ema: long_ema[long_ema.len() - 1],
        })
    }
}
