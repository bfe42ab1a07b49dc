//! Serializable run configuration.
//!
//! A run config is a TOML file; every key is optional and falls back to the
//! defaults below, which reproduce the daily EGX job:
//!
//! ```toml
//! state_file = "last_signals.json"
//! history_days = 180
//! preset = "regime_adaptive"
//! parallel = false
//!
//! [provider]
//! kind = "yahoo"            # or "csv" (with `dir`), or "synthetic"
//! retries = 3               # yahoo only
//! retry_delay_ms = 500      # first backoff, doubled per retry
//!
//! [notifier]
//! kind = "telegram"         # or "stdout"
//!
//! [symbols]
//! COMI = "COMI.CA"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use trendwatch_core::data::{CsvProvider, DataProvider, SyntheticProvider, YahooProvider};
use trendwatch_core::strategy::{StrategyConfig, StrategyPreset};
use trendwatch_core::SignalError;

use crate::universe::Universe;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid strategy: {0}")]
    Strategy(#[from] SignalError),

    #[error("provider setup failed: {0}")]
    Provider(String),
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    Yahoo {
        #[serde(default = "default_retries")]
        retries: u32,
        #[serde(default = "default_retry_delay_ms")]
        retry_delay_ms: u64,
    },
    Csv {
        dir: PathBuf,
    },
    Synthetic,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::yahoo()
    }
}

impl ProviderConfig {
    /// Yahoo with the default retry policy.
    pub fn yahoo() -> Self {
        ProviderConfig::Yahoo {
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }

    pub fn build(&self) -> Result<Box<dyn DataProvider>, ConfigError> {
        Ok(match self {
            ProviderConfig::Yahoo {
                retries,
                retry_delay_ms,
            } => Box::new(
                YahooProvider::new()
                    .map_err(|e| ConfigError::Provider(e.to_string()))?
                    .with_retries(*retries, Duration::from_millis(*retry_delay_ms)),
            ),
            ProviderConfig::Csv { dir } => Box::new(CsvProvider::new(dir)),
            ProviderConfig::Synthetic => Box::new(SyntheticProvider::new()),
        })
    }
}

/// Where composed messages go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotifierConfig {
    #[default]
    Telegram,
    Stdout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub state_file: PathBuf,
    /// Calendar days of history requested per instrument.
    pub history_days: u32,
    pub preset: StrategyPreset,
    /// Full parameter override; takes precedence over `preset`.
    pub strategy: Option<StrategyConfig>,
    /// Evaluate instruments on the rayon pool.
    pub parallel: bool,
    /// Heading of the signals message.
    pub title: String,
    pub provider: ProviderConfig,
    pub notifier: NotifierConfig,
    pub symbols: Universe,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("last_signals.json"),
            history_days: 180,
            preset: StrategyPreset::default(),
            strategy: None,
            parallel: false,
            title: "EGX Trend Signals".into(),
            provider: ProviderConfig::default(),
            notifier: NotifierConfig::default(),
            symbols: Universe::default(),
        }
    }
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_days == 0 {
            return Err(ConfigError::Invalid("history_days must be >= 1".into()));
        }
        self.symbols.validate()?;
        self.strategy_config().validate()?;
        Ok(())
    }

    /// Effective strategy parameters.
    pub fn strategy_config(&self) -> StrategyConfig {
        self.strategy.unwrap_or_else(|| self.preset.config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.history_days, 180);
        assert_eq!(config.symbols.len(), 35);
        assert_eq!(config.provider, ProviderConfig::yahoo());
    }

    #[test]
    fn parses_full_config() {
        let toml_str = r#"
            state_file = "state/signals.json"
            history_days = 365
            preset = "regime_relaxed"
            parallel = true

            [provider]
            kind = "csv"
            dir = "data/bars"

            [notifier]
            kind = "stdout"

            [symbols]
            COMI = "COMI.CA"
            HRHO = "HRHO.CA"
        "#;
        let config = RunConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.preset, StrategyPreset::RegimeRelaxed);
        assert_eq!(
            config.provider,
            ProviderConfig::Csv {
                dir: PathBuf::from("data/bars")
            }
        );
        assert_eq!(config.notifier, NotifierConfig::Stdout);
        assert_eq!(config.symbols.len(), 2);
        assert_eq!(config.strategy_config().regime.threshold, 0.65);
    }

    #[test]
    fn yahoo_retry_policy_is_configurable() {
        let config = RunConfig::from_toml(
            "[provider]\nkind = \"yahoo\"\nretries = 5\nretry_delay_ms = 250\n",
        )
        .unwrap();
        assert_eq!(
            config.provider,
            ProviderConfig::Yahoo {
                retries: 5,
                retry_delay_ms: 250
            }
        );

        let config = RunConfig::from_toml("[provider]\nkind = \"yahoo\"\n").unwrap();
        assert_eq!(config.provider, ProviderConfig::yahoo());
        assert!(config.provider.build().is_ok());
    }

    #[test]
    fn strategy_override_wins_over_preset() {
        let toml_str = r#"
            preset = "regime_loose"
            [strategy.regime]
            long_span = 40
            lookback = 30
            threshold = 0.9
        "#;
        let config = RunConfig::from_toml(toml_str).unwrap();
        let strategy = config.strategy_config();
        assert_eq!(strategy.regime.lookback, 30);
        assert_eq!(strategy.ranging.buy_below, 40.0);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            RunConfig::from_toml("history_days = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RunConfig::from_toml("preset = \"yolo\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RunConfig::from_toml("[strategy.trend]\nlength = 0\nincrement_count = 12\nfast_span = 12"),
            Err(ConfigError::Strategy(_))
        ));
    }
}
