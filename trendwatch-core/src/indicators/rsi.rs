//! Relative Strength Index (RSI).
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Gains and losses are taken from close-to-close deltas; the first bar has no
//! delta and contributes a zero gain and a zero loss.
//! Edge case: avg_loss == 0 → RSI = 100 (including the no-movement case).

use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::error::SignalError;

use super::ema::ewm_alpha;
use super::sma::rolling_mean;
use super::Indicator;

/// How the gain and loss legs are averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiSmoothing {
    /// Rolling arithmetic mean over `period` deltas.
    Simple,
    /// Exponential smoothing with factor `1/period`, seeded from the first element.
    #[default]
    Wilder,
}

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    smoothing: RsiSmoothing,
    name: String,
}

impl Rsi {
    pub fn new(period: usize, smoothing: RsiSmoothing) -> Result<Self, SignalError> {
        if period == 0 {
            return Err(SignalError::InvalidParameter("RSI period must be >= 1".into()));
        }
        Ok(Self {
            period,
            smoothing,
            name: format!("rsi_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// RSI over an arbitrary close series.
    pub fn compute_closes(&self, closes: &[f64]) -> Result<Vec<f64>, SignalError> {
        let n = closes.len();
        if n < self.min_bars() {
            return Err(SignalError::insufficient(self.min_bars(), n));
        }

        let mut gains = vec![0.0; n];
        let mut losses = vec![0.0; n];
        for i in 1..n {
            let delta = closes[i] - closes[i - 1];
            if delta > 0.0 {
                gains[i] = delta;
            } else if delta < 0.0 {
                losses[i] = -delta;
            }
        }

        let (avg_gain, avg_loss) = match self.smoothing {
            RsiSmoothing::Simple => (
                rolling_mean(&gains, self.period),
                rolling_mean(&losses, self.period),
            ),
            RsiSmoothing::Wilder => {
                let alpha = 1.0 / self.period as f64;
                (ewm_alpha(&gains, alpha)?, ewm_alpha(&losses, alpha)?)
            }
        };

        Ok(avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&g, &l)| compute_rsi(g, l))
            .collect())
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_bars(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, series: &PriceSeries) -> Result<Vec<f64>, SignalError> {
        self.compute_closes(&series.closes())
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        f64::NAN
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series};

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn equal_gains_give_100_wilder() {
        let rsi = Rsi::new(14, RsiSmoothing::Wilder).unwrap();
        let result = rsi.compute_closes(&rising(15)).unwrap();
        assert_eq!(result[14], 100.0);
    }

    #[test]
    fn equal_gains_give_100_simple() {
        let rsi = Rsi::new(14, RsiSmoothing::Simple).unwrap();
        let result = rsi.compute_closes(&rising(15)).unwrap();
        assert_eq!(result[14], 100.0);
        assert!(result[12].is_nan());
    }

    #[test]
    fn all_losses_give_0() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let rsi = Rsi::new(14, RsiSmoothing::Simple).unwrap();
        let result = rsi.compute_closes(&closes).unwrap();
        assert_approx(result[19], 0.0, 1e-9);
    }

    #[test]
    fn simple_mixed_known_value() {
        // period 2, closes 10, 12, 11: gains [0,2,0], losses [0,0,1]
        // avg_gain[2] = 1.0, avg_loss[2] = 0.5 → RSI = 100 - 100/3
        let rsi = Rsi::new(2, RsiSmoothing::Simple).unwrap();
        let result = rsi.compute_closes(&[10.0, 12.0, 11.0]).unwrap();
        assert_approx(result[2], 100.0 - 100.0 / 3.0, 1e-9);
    }

    #[test]
    fn wilder_mixed_known_value() {
        // period 2 → alpha 0.5, gains [0,2,0], losses [0,0,1]
        // avg_gain: 0, 1, 0.5; avg_loss: 0, 0, 0.5 → RSI[2] = 50
        let rsi = Rsi::new(2, RsiSmoothing::Wilder).unwrap();
        let result = rsi.compute_closes(&[10.0, 12.0, 11.0]).unwrap();
        assert_eq!(result[1], 100.0);
        assert_approx(result[2], 50.0, 1e-9);
    }

    #[test]
    fn bounds() {
        let series = make_series(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        for smoothing in [RsiSmoothing::Simple, RsiSmoothing::Wilder] {
            let rsi = Rsi::new(3, smoothing).unwrap();
            for (i, &v) in rsi.compute(&series).unwrap().iter().enumerate() {
                if !v.is_nan() {
                    assert!((0.0..=100.0).contains(&v), "RSI out of bounds at bar {i}: {v}");
                }
            }
        }
    }

    #[test]
    fn too_few_bars_is_insufficient_history() {
        let rsi = Rsi::new(14, RsiSmoothing::Wilder).unwrap();
        assert_eq!(
            rsi.compute_closes(&rising(14)),
            Err(SignalError::InsufficientHistory {
                required: 15,
                available: 14
            })
        );
    }

    #[test]
    fn smoothing_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&RsiSmoothing::Wilder).unwrap(),
            "\"wilder\""
        );
    }
}
