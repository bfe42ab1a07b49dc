//! Adaptive trend line: an adaptive-length moving average with a companion
//! fast line that chases local extremes.
//!
//! The slow line is an EMA-like recurrence whose smoothing factor `alpha`
//! restarts at `2/(length+1)` whenever price crosses the line, and grows by
//! `1/increment_count` each time price sets a new all-time running high
//! (while above the line) or running low (while below it). Growth is not
//! clamped: a long one-way run keeps accelerating the line.
//!
//! The slow line update deliberately uses the *previous* bar's alpha, so a
//! reset or increment only takes effect one bar later.
//!
//! Bar `i` depends only on `{close[i], high[i], low[i]}`, the previous close,
//! and the previous `AdaptiveState`. That recurrence is exposed as
//! [`AdaptiveTrendLine::step`].

use serde::{Deserialize, Serialize};

use crate::domain::{Bias, PriceSeries};
use crate::error::SignalError;
use crate::indicators::rolling_mean;

/// Extra bars required beyond `length` before the line is trusted.
pub const WARMUP_MARGIN: usize = 5;

/// Parameters of the adaptive trend line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendLineConfig {
    /// Warm-up window; also sets the reset coefficient `2/(length+1)`.
    pub length: usize,
    /// Alpha grows by `1/increment_count` on each new running extreme.
    pub increment_count: usize,
    /// Divisor applied to the fast line's pull toward the close.
    pub fast_span: usize,
}

impl Default for TrendLineConfig {
    fn default() -> Self {
        Self {
            length: 80,
            increment_count: 12,
            fast_span: 12,
        }
    }
}

impl TrendLineConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.length == 0 {
            return Err(SignalError::InvalidParameter("trend length must be >= 1".into()));
        }
        if self.increment_count == 0 {
            return Err(SignalError::InvalidParameter(
                "trend increment_count must be >= 1".into(),
            ));
        }
        if self.fast_span == 0 {
            return Err(SignalError::InvalidParameter(
                "trend fast_span must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Minimum series length accepted by the trend line.
    pub fn min_bars(&self) -> usize {
        self.length + WARMUP_MARGIN
    }

    fn reset_alpha(&self) -> f64 {
        2.0 / (self.length as f64 + 1.0)
    }

    fn increment(&self) -> f64 {
        1.0 / self.increment_count as f64
    }
}

/// Recurrence state after processing one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveState {
    pub ma: f64,
    pub fast_ma: f64,
    pub alpha: f64,
    pub running_high: f64,
    pub running_low: f64,
    /// Price crossed the slow line on this bar.
    pub crossed: bool,
}

/// The three prices the recurrence reads from each bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInput {
    pub close: f64,
    pub high: f64,
    pub low: f64,
}

/// Carried-forward context for a step: the previous state and the previous close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Previous {
    pub state: AdaptiveState,
    pub close: f64,
}

/// Final reading of the trend line at the last bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendLineOutput {
    pub ma: f64,
    pub fast_ma: f64,
    pub alpha: f64,
    pub bias: Bias,
}

#[derive(Debug, Clone)]
pub struct AdaptiveTrendLine {
    config: TrendLineConfig,
}

impl AdaptiveTrendLine {
    pub fn new(config: TrendLineConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrendLineConfig {
        &self.config
    }

    /// Advance the recurrence by one bar.
    ///
    /// `warm` is false while the `length`-bar initial mean is still undefined;
    /// during warm-up both lines track the close and alpha stays at zero.
    pub fn step(&self, prev: Option<&Previous>, input: StepInput, warm: bool) -> AdaptiveState {
        let running_high = prev.map_or(input.high, |p| p.state.running_high.max(input.high));
        let running_low = prev.map_or(input.low, |p| p.state.running_low.min(input.low));

        let p = match prev {
            Some(p) if warm => p,
            _ => {
                return AdaptiveState {
                    ma: input.close,
                    fast_ma: input.close,
                    alpha: 0.0,
                    running_high,
                    running_low,
                    crossed: false,
                }
            }
        };

        let close = input.close;
        let slow = p.state.ma;
        let crossed = (p.close <= slow && close > slow) || (p.close >= slow && close < slow);

        let alpha = if crossed {
            self.config.reset_alpha()
        } else if close > slow && running_high > p.state.running_high {
            p.state.alpha + self.config.increment()
        } else if close < slow && running_low < p.state.running_low {
            p.state.alpha + self.config.increment()
        } else {
            p.state.alpha
        };

        // One-bar lag: the coefficient is the previous bar's alpha.
        let ma = slow + p.state.alpha * (close - slow);

        let prev_fast = p.state.fast_ma;
        let pull = (close - prev_fast) / self.config.fast_span as f64;
        let fast_ma = if crossed {
            (close + prev_fast) / 2.0
        } else if close > ma {
            close.max(prev_fast) + pull
        } else {
            close.min(prev_fast) + pull
        };

        AdaptiveState {
            ma,
            fast_ma,
            alpha,
            running_high,
            running_low,
            crossed,
        }
    }

    /// Per-bar states for equal-length close/high/low slices.
    pub fn trace_slices(
        &self,
        close: &[f64],
        high: &[f64],
        low: &[f64],
    ) -> Result<Vec<AdaptiveState>, SignalError> {
        let n = close.len();
        if high.len() != n || low.len() != n {
            return Err(SignalError::InvalidInput(format!(
                "close/high/low lengths differ: {}/{}/{}",
                n,
                high.len(),
                low.len()
            )));
        }
        if n < self.config.min_bars() {
            return Err(SignalError::insufficient(self.config.min_bars(), n));
        }
        if let Some(i) = (0..n).find(|&i| {
            !(close[i].is_finite() && high[i].is_finite() && low[i].is_finite())
        }) {
            return Err(SignalError::InvalidInput(format!(
                "non-finite price at bar {i}"
            )));
        }

        let init_ma = rolling_mean(close, self.config.length);
        let mut states = Vec::with_capacity(n);
        let mut prev: Option<Previous> = None;

        for i in 0..n {
            let input = StepInput {
                close: close[i],
                high: high[i],
                low: low[i],
            };
            let state = self.step(prev.as_ref(), input, !init_ma[i].is_nan());
            states.push(state);
            prev = Some(Previous {
                state,
                close: close[i],
            });
        }

        Ok(states)
    }

    /// Per-bar states for a price series.
    pub fn trace(&self, series: &PriceSeries) -> Result<Vec<AdaptiveState>, SignalError> {
        self.trace_slices(&series.closes(), &series.highs(), &series.lows())
    }

    /// Reading at the last bar of the slices.
    pub fn evaluate_slices(
        &self,
        close: &[f64],
        high: &[f64],
        low: &[f64],
    ) -> Result<TrendLineOutput, SignalError> {
        let states = self.trace_slices(close, high, low)?;
        // trace_slices rejects anything shorter than min_bars() >= 6.
        let last = states[states.len() - 1];
        Ok(TrendLineOutput {
            ma: last.ma,
            fast_ma: last.fast_ma,
            alpha: last.alpha,
            bias: Bias::from_lines(last.fast_ma, last.ma),
        })
    }

    /// Reading at the last bar of the series.
    pub fn evaluate(&self, series: &PriceSeries) -> Result<TrendLineOutput, SignalError> {
        self.evaluate_slices(&series.closes(), &series.highs(), &series.lows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};

    fn line(length: usize) -> AdaptiveTrendLine {
        AdaptiveTrendLine::new(TrendLineConfig {
            length,
            increment_count: 12,
            fast_span: 12,
        })
        .unwrap()
    }

    fn flat_then_jump() -> Vec<f64> {
        let mut closes = vec![10.0; 10];
        closes.push(20.0);
        closes
    }

    #[test]
    fn jump_after_flat_is_a_crossover_and_resets_alpha() {
        let series = make_series(&flat_then_jump());
        let states = line(5).trace(&series).unwrap();
        let last = states.last().unwrap();
        assert!(last.crossed);
        assert_approx(last.alpha, 2.0 / 6.0, DEFAULT_EPSILON);
        // Slow line still used the previous (zero) alpha.
        assert_approx(last.ma, 10.0, DEFAULT_EPSILON);
        // Fast line averages the close with the previous fast value.
        assert_approx(last.fast_ma, 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn warmup_bars_track_close() {
        let closes: Vec<f64> = (0..12).map(|i| 10.0 + i as f64).collect();
        let series = make_series(&closes);
        let states = line(5).trace(&series).unwrap();
        for (i, state) in states.iter().take(4).enumerate() {
            assert_eq!(state.ma, closes[i]);
            assert_eq!(state.fast_ma, closes[i]);
            assert_eq!(state.alpha, 0.0);
        }
    }

    #[test]
    fn new_running_high_increments_alpha() {
        // Steady rise: after the crossover at the first warm bar, every later
        // bar sets a new running high while above the line.
        let closes: Vec<f64> = (0..14).map(|i| 10.0 + i as f64).collect();
        let series = make_series(&closes);
        let states = line(5).trace(&series).unwrap();
        let inc = 1.0 / 12.0;
        for i in 6..states.len() {
            if !states[i].crossed {
                assert_approx(states[i].alpha, states[i - 1].alpha + inc, 1e-12);
            }
        }
    }

    #[test]
    fn slow_line_uses_previous_alpha() {
        let closes: Vec<f64> = (0..14).map(|i| 10.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let series = make_series(&closes);
        let states = line(5).trace(&series).unwrap();
        for i in 5..states.len() {
            let expected = states[i - 1].ma + states[i - 1].alpha * (closes[i] - states[i - 1].ma);
            assert_approx(states[i].ma, expected, 1e-12);
        }
    }

    #[test]
    fn running_extremes_are_cumulative() {
        let closes = [10.0, 30.0, 5.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 12.0];
        let series = make_series(&closes);
        let states = line(5).trace(&series).unwrap();
        let highs = series.highs();
        let lows = series.lows();
        for i in 0..states.len() {
            let max = highs[..=i].iter().cloned().fold(f64::MIN, f64::max);
            let min = lows[..=i].iter().cloned().fold(f64::MAX, f64::min);
            assert_eq!(states[i].running_high, max);
            assert_eq!(states[i].running_low, min);
        }
    }

    #[test]
    fn bias_reports_fast_versus_slow() {
        let series = make_series(&flat_then_jump());
        let out = line(5).evaluate(&series).unwrap();
        assert_eq!(out.bias, Bias::Above);
    }

    #[test]
    fn insufficient_history() {
        let series = make_series(&[10.0; 9]);
        assert_eq!(
            line(5).evaluate(&series),
            Err(SignalError::InsufficientHistory {
                required: 10,
                available: 9
            })
        );
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let mut closes = vec![10.0; 12];
        closes[7] = f64::NAN;
        let highs = vec![11.0; 12];
        let lows = vec![9.0; 12];
        assert!(matches!(
            line(5).trace_slices(&closes, &highs, &lows),
            Err(SignalError::InvalidInput(_))
        ));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(matches!(
            line(5).trace_slices(&[1.0; 12], &[1.0; 11], &[1.0; 12]),
            Err(SignalError::InvalidInput(_))
        ));
    }

    #[test]
    fn zero_parameters_are_rejected() {
        for config in [
            TrendLineConfig { length: 0, ..Default::default() },
            TrendLineConfig { increment_count: 0, ..Default::default() },
            TrendLineConfig { fast_span: 0, ..Default::default() },
        ] {
            assert!(matches!(
                AdaptiveTrendLine::new(config),
                Err(SignalError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn evaluation_is_idempotent() {
        let closes: Vec<f64> = (0..120).map(|i| 50.0 + (i as f64 * 0.2).sin() * 8.0).collect();
        let series = make_series(&closes);
        let trend = AdaptiveTrendLine::new(TrendLineConfig::default()).unwrap();
        assert_eq!(trend.evaluate(&series).unwrap(), trend.evaluate(&series).unwrap());
    }
}
