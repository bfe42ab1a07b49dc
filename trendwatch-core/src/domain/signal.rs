//! Discrete signal vocabulary: direction, regime, trend-line bias.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Alertable direction. "Hold" is represented as `Option::<Signal>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = String;

    /// Case-insensitive; accepts the spellings found in older state files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Signal::Buy),
            "SELL" => Ok(Signal::Sell),
            other => Err(format!("unknown signal '{other}'")),
        }
    }
}

/// Classified market condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Uptrend,
    Downtrend,
    Ranging,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Uptrend => "uptrend",
            Regime::Downtrend => "downtrend",
            Regime::Ranging => "ranging",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Regime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uptrend" | "up" | "bullish" => Ok(Regime::Uptrend),
            "downtrend" | "down" | "bearish" => Ok(Regime::Downtrend),
            "ranging" | "range" | "sideways" => Ok(Regime::Ranging),
            other => Err(format!("unknown regime '{other}'")),
        }
    }
}

/// Position of the fast line relative to the adaptive slow line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Above,
    Below,
}

impl Bias {
    pub fn from_lines(fast: f64, slow: f64) -> Self {
        if fast > slow {
            Bias::Above
        } else {
            Bias::Below
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        assert_eq!(
            serde_json::from_str::<Signal>("\"SELL\"").unwrap(),
            Signal::Sell
        );
    }

    #[test]
    fn signal_parses_case_insensitive() {
        assert_eq!("buy".parse::<Signal>().unwrap(), Signal::Buy);
        assert!("hold".parse::<Signal>().is_err());
    }

    #[test]
    fn regime_parses_aliases() {
        assert_eq!("Up".parse::<Regime>().unwrap(), Regime::Uptrend);
        assert_eq!("sideways".parse::<Regime>().unwrap(), Regime::Ranging);
        assert_eq!(Regime::Downtrend.to_string(), "downtrend");
    }

    #[test]
    fn bias_ties_resolve_below() {
        assert_eq!(Bias::from_lines(10.0, 10.0), Bias::Below);
        assert_eq!(Bias::from_lines(10.1, 10.0), Bias::Above);
    }
}
