//! Strategy configuration and named presets.
//!
//! Every threshold used by the evaluator lives here. Rule-set variants are
//! expressed as presets (different numbers), never as different code paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SignalError;
use crate::indicators::RsiSmoothing;
use crate::regime::RegimeConfig;
use crate::trend::TrendLineConfig;

/// RSI oscillator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorConfig {
    pub period: usize,
    #[serde(default)]
    pub smoothing: RsiSmoothing,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            period: 14,
            smoothing: RsiSmoothing::Wilder,
        }
    }
}

/// Guards applied while the regime is `uptrend`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UptrendRules {
    /// BUY requires RSI strictly below this value.
    pub buy_below: f64,
    /// SELL fires when RSI reaches this value.
    pub sell_at_or_above: f64,
}

impl Default for UptrendRules {
    fn default() -> Self {
        Self {
            buy_below: 60.0,
            sell_at_or_above: 88.0,
        }
    }
}

/// Mean-reversion guards applied while the regime is `ranging`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangingRules {
    /// BUY requires RSI strictly below this value...
    pub buy_below: f64,
    /// ...and the close below the EMA of this span.
    pub entry_span: usize,
    /// SELL requires RSI strictly above this value...
    pub sell_above: f64,
    /// ...and the close below the EMA of this span.
    pub exit_span: usize,
}

impl Default for RangingRules {
    fn default() -> Self {
        Self {
            buy_below: 40.0,
            entry_span: 4,
            sell_above: 55.0,
            exit_span: 9,
        }
    }
}

/// Forced-exit override: SELL when the close drops below a medium-span EMA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForcedExitConfig {
    pub enabled: bool,
    pub span: usize,
}

impl Default for ForcedExitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            span: 25,
        }
    }
}

/// Complete parameter set for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub trend: TrendLineConfig,
    pub regime: RegimeConfig,
    pub oscillator: OscillatorConfig,
    pub uptrend: UptrendRules,
    pub ranging: RangingRules,
    pub forced_exit: ForcedExitConfig,
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        self.trend.validate()?;
        self.regime.validate()?;
        if self.oscillator.period == 0 {
            return Err(SignalError::InvalidParameter("oscillator period must be >= 1".into()));
        }
        if self.ranging.entry_span == 0 || self.ranging.exit_span == 0 {
            return Err(SignalError::InvalidParameter("ranging EMA spans must be >= 1".into()));
        }
        if self.forced_exit.enabled && self.forced_exit.span == 0 {
            return Err(SignalError::InvalidParameter("forced exit span must be >= 1".into()));
        }
        for (name, guard) in [
            ("uptrend.buy_below", self.uptrend.buy_below),
            ("uptrend.sell_at_or_above", self.uptrend.sell_at_or_above),
            ("ranging.buy_below", self.ranging.buy_below),
            ("ranging.sell_above", self.ranging.sell_above),
        ] {
            if !guard.is_finite() {
                return Err(SignalError::InvalidParameter(format!("{name} must be finite")));
            }
        }
        Ok(())
    }
}

/// Named rule sets.
///
/// The regime presets differ in how readily a trend is recognised and how
/// deep an oversold reading the ranging entry waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyPreset {
    /// Threshold 0.85, ranging BUY below RSI 40.
    #[default]
    RegimeAdaptive,
    /// Threshold 0.65, ranging BUY below RSI 45.
    RegimeRelaxed,
    /// Threshold 0.60, ranging BUY below RSI 50.
    RegimeLoose,
    /// Single rule set: adaptive-line bias filtered by EMA 50, no regime,
    /// no RSI guards, no forced exit.
    LuxalgoEma50,
}

impl StrategyPreset {
    pub const ALL: [StrategyPreset; 4] = [
        StrategyPreset::RegimeAdaptive,
        StrategyPreset::RegimeRelaxed,
        StrategyPreset::RegimeLoose,
        StrategyPreset::LuxalgoEma50,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyPreset::RegimeAdaptive => "regime_adaptive",
            StrategyPreset::RegimeRelaxed => "regime_relaxed",
            StrategyPreset::RegimeLoose => "regime_loose",
            StrategyPreset::LuxalgoEma50 => "luxalgo_ema50",
        }
    }

    pub fn config(&self) -> StrategyConfig {
        let base = StrategyConfig::default();
        match self {
            StrategyPreset::RegimeAdaptive => base,
            StrategyPreset::RegimeRelaxed => StrategyConfig {
                regime: RegimeConfig {
                    threshold: 0.65,
                    ..base.regime
                },
                ranging: RangingRules {
                    buy_below: 45.0,
                    ..base.ranging
                },
                ..base
            },
            StrategyPreset::RegimeLoose => StrategyConfig {
                regime: RegimeConfig {
                    threshold: 0.60,
                    ..base.regime
                },
                ranging: RangingRules {
                    buy_below: 50.0,
                    ..base.ranging
                },
                ..base
            },
            // Threshold 0 classifies every bar as uptrend; RSI never reaches 101.
            StrategyPreset::LuxalgoEma50 => StrategyConfig {
                regime: RegimeConfig {
                    long_span: 50,
                    threshold: 0.0,
                    ..base.regime
                },
                uptrend: UptrendRules {
                    buy_below: 101.0,
                    sell_at_or_above: 101.0,
                },
                forced_exit: ForcedExitConfig {
                    enabled: false,
                    ..base.forced_exit
                },
                ..base
            },
        }
    }
}

impl fmt::Display for StrategyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|p| p.name()).collect();
                format!("unknown preset '{s}' (expected one of: {})", names.join(", "))
            })
    }
}
