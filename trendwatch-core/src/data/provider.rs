//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over bar sources (Yahoo Finance, CSV
//! directory, synthetic) so the runner can swap implementations and tests can
//! inject fakes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

/// Structured error types for data operations.
///
/// Every variant ends up in the run's data-failure list; none abort a batch.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no data for '{symbol}' in {path}")]
    MissingFile { symbol: String, path: String },

    #[error("csv error: {0}")]
    Csv(String),

    #[error("data unavailable: {0}")]
    Unavailable(String),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

/// Result of a successful fetch for a single ticker.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub ticker: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

/// Trait for daily bar sources.
///
/// Implementations return bars sorted by date ascending. Validation (finite
/// prices, strictly increasing dates) happens when the caller builds a
/// `PriceSeries`.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for a ticker over an inclusive date range.
    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;
}

impl<P: DataProvider + ?Sized> DataProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        (**self).fetch(ticker, start, end)
    }
}
