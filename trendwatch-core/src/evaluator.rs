//! Signal evaluator: turns a price series into a raw BUY/SELL/none signal
//! for the latest bar.
//!
//! Rule sets by regime:
//! - uptrend: trend-following entries filtered by the long EMA and an RSI cap.
//! - ranging: mean-reversion entries on oversold dips, stop-loss style exits.
//! - downtrend: stand aside (no raw signal).
//!
//! The forced-exit override sits on top of all three. It is latched through
//! the `prior_forced_exit` flag supplied by the caller (the state store), so
//! the evaluator itself stays stateless.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Bias, PriceSeries, Regime, Signal};
use crate::error::SignalError;
use crate::indicators::{Ema, Indicator, Rsi};
use crate::regime::{RegimeClassifier, RegimeReading};
use crate::strategy::StrategyConfig;
use crate::trend::{AdaptiveTrendLine, TrendLineOutput};

/// Which rule produced the raw signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalReason {
    TrendEntry,
    TrendExit,
    MeanReversionEntry,
    StopLossExit,
    ForcedExit,
}

impl fmt::Display for SignalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalReason::TrendEntry => "trend entry",
            SignalReason::TrendExit => "trend exit",
            SignalReason::MeanReversionEntry => "mean-reversion entry",
            SignalReason::StopLossExit => "stop-loss exit",
            SignalReason::ForcedExit => "forced exit",
        })
    }
}

/// Indicator values at the evaluated bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub trend: TrendLineOutput,
    pub regime: RegimeReading,
    pub rsi: f64,
    pub entry_ema: f64,
    pub exit_ema: f64,
    pub forced_exit_ema: Option<f64>,
}

/// Result of evaluating one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub date: NaiveDate,
    pub raw_signal: Option<Signal>,
    pub reason: Option<SignalReason>,
    pub regime: Regime,
    pub forced_exit: bool,
    pub snapshot: IndicatorSnapshot,
}

#[derive(Debug, Clone)]
pub struct SignalEvaluator {
    config: StrategyConfig,
    trend: AdaptiveTrendLine,
    regime: RegimeClassifier,
    rsi: Rsi,
    entry_ema: Ema,
    exit_ema: Ema,
    forced_exit_ema: Option<Ema>,
}

impl SignalEvaluator {
    pub fn new(config: StrategyConfig) -> Result<Self, SignalError> {
        config.validate()?;
        let forced_exit_ema = if config.forced_exit.enabled {
            Some(Ema::new(config.forced_exit.span)?)
        } else {
            None
        };
        Ok(Self {
            trend: AdaptiveTrendLine::new(config.trend)?,
            regime: RegimeClassifier::new(config.regime)?,
            rsi: Rsi::new(config.oscillator.period, config.oscillator.smoothing)?,
            entry_ema: Ema::new(config.ranging.entry_span)?,
            exit_ema: Ema::new(config.ranging.exit_span)?,
            forced_exit_ema,
            config,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Shortest series every component accepts.
    pub fn required_bars(&self) -> usize {
        self.config
            .trend
            .min_bars()
            .max(self.config.regime.lookback)
            .max(self.rsi.min_bars())
    }

    /// Evaluate the latest bar.
    ///
    /// `prior_forced_exit` is the flag recorded for this instrument by the
    /// previous run (false when there is no record).
    pub fn evaluate(
        &self,
        series: &PriceSeries,
        prior_forced_exit: bool,
    ) -> Result<Evaluation, SignalError> {
        let required = self.required_bars();
        if series.len() < required {
            return Err(SignalError::insufficient(required, series.len()));
        }

        let closes = series.closes();
        let trend = self
            .trend
            .evaluate_slices(&closes, &series.highs(), &series.lows())?;
        let regime = self.regime.classify_closes(&closes)?;
        let rsi = last(&self.rsi.compute_closes(&closes)?)?;
        let entry_ema = self.entry_ema.latest(series)?;
        let exit_ema = self.exit_ema.latest(series)?;
        let forced_exit_ema = self
            .forced_exit_ema
            .as_ref()
            .map(|ema| ema.latest(series))
            .transpose()?;

        let snapshot = IndicatorSnapshot {
            close: series.last().close,
            trend,
            regime,
            rsi,
            entry_ema,
            exit_ema,
            forced_exit_ema,
        };

        let (raw_signal, reason, forced_exit) = self.decide(&snapshot, prior_forced_exit);

        Ok(Evaluation {
            date: series.last_date(),
            raw_signal,
            reason,
            regime: regime.regime,
            forced_exit,
            snapshot,
        })
    }

    /// Apply the forced-exit override on top of the regime rule set.
    fn decide(
        &self,
        snap: &IndicatorSnapshot,
        prior_forced_exit: bool,
    ) -> (Option<Signal>, Option<SignalReason>, bool) {
        if let Some(fe) = snap.forced_exit_ema {
            if snap.close < fe && !prior_forced_exit {
                return (Some(Signal::Sell), Some(SignalReason::ForcedExit), true);
            }
        }

        let fired = self.regime_rules(snap);
        let forced_exit = match fired {
            Some((Signal::Buy, _)) => false,
            _ => prior_forced_exit,
        };
        (fired.map(|(s, _)| s), fired.map(|(_, r)| r), forced_exit)
    }

    fn regime_rules(&self, snap: &IndicatorSnapshot) -> Option<(Signal, SignalReason)> {
        match snap.regime.regime {
            Regime::Uptrend => {
                let rules = &self.config.uptrend;
                let long_ema = snap.regime.long_ema;
                if snap.trend.bias == Bias::Above
                    && snap.close > long_ema
                    && snap.rsi < rules.buy_below
                {
                    Some((Signal::Buy, SignalReason::TrendEntry))
                } else if snap.trend.bias == Bias::Below
                    || snap.close < long_ema
                    || snap.rsi >= rules.sell_at_or_above
                {
                    Some((Signal::Sell, SignalReason::TrendExit))
                } else {
                    None
                }
            }
            Regime::Ranging => {
                let rules = &self.config.ranging;
                if snap.rsi < rules.buy_below && snap.close < snap.entry_ema {
                    Some((Signal::Buy, SignalReason::MeanReversionEntry))
                } else if snap.rsi > rules.sell_above && snap.close < snap.exit_ema {
                    Some((Signal::Sell, SignalReason::StopLossExit))
                } else {
                    None
                }
            }
            Regime::Downtrend => None,
        }
    }
}

fn last(values: &[f64]) -> Result<f64, SignalError> {
    values
        .last()
        .copied()
        .ok_or_else(|| SignalError::InvalidInput("indicator produced no values".into()))
}
