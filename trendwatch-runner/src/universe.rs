//! Instrument universe: display name → provider ticker.
//!
//! Stored as the `[symbols]` table of the run config. Iteration is always in
//! name order, which fixes the order of alerts and failures in every report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::ConfigError;

/// EGX constituents watched by default.
const EGX_SYMBOLS: [&str; 35] = [
    "OFH", "OLFI", "EMFD", "ETEL", "EAST", "EFIH", "ABUK", "OIH", "SWDY", "ISPH", "ATQA", "MTIE",
    "ELEC", "HRHO", "ORWE", "JUFO", "DSCW", "SUGR", "ELSH", "RMDA", "RAYA", "EEII", "MPCO",
    "GBCO", "TMGH", "ORHD", "AMOC", "FWRY", "COMI", "ADIB", "PHDC", "EGTS", "MCQE", "SKPC",
    "EGAL",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Universe {
    symbols: BTreeMap<String, String>,
}

impl Default for Universe {
    fn default() -> Self {
        Self::egx()
    }
}

impl Universe {
    pub fn new(symbols: BTreeMap<String, String>) -> Self {
        Self { symbols }
    }

    /// The default Egyptian Exchange list; tickers carry Yahoo's `.CA` suffix.
    pub fn egx() -> Self {
        Self {
            symbols: EGX_SYMBOLS
                .iter()
                .map(|name| (name.to_string(), format!("{name}.CA")))
                .collect(),
        }
    }

    /// Load a symbols file: a bare `NAME = "TICKER"` TOML table.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a bare `NAME = "TICKER"` TOML table.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let universe: Self = toml::from_str(content)?;
        universe.validate()?;
        Ok(universe)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("symbol universe is empty".into()));
        }
        if let Some((name, _)) = self.symbols.iter().find(|(_, t)| t.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("symbol '{name}' has an empty ticker")));
        }
        Ok(())
    }

    pub fn ticker(&self, name: &str) -> Option<&str> {
        self.symbols.get(name).map(String::as_str)
    }

    /// (name, ticker) pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.symbols.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.symbols.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
