//! Synthetic provider for offline runs and demos.
//!
//! Produces a deterministic random walk per ticker. Bars are clearly fake and
//! tagged `DataSource::Synthetic`.

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    start_price: f64,
    daily_range: f64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            daily_range: 0.03,
        }
    }
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Random walk seeded from the ticker, skipping weekends.
    pub fn generate(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
        let seed: [u8; 32] = *blake3::hash(ticker.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::new();
        let mut price = self.start_price;
        let mut current = start;

        while current <= end {
            let weekday = current.weekday();
            if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
                let daily_return: f64 = rng.gen_range(-self.daily_range..self.daily_range);
                let open = price;
                let close = price * (1.0 + daily_return);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
                bars.push(Bar::new(current, open, high, low, close));
                price = close;
            }
            current += chrono::Duration::days(1);
        }

        bars
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars = self.generate(ticker, start, end);
        if bars.is_empty() {
            return Err(DataError::Unavailable(format!(
                "no trading days between {start} and {end}"
            )));
        }
        Ok(FetchResult {
            ticker: ticker.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }
}
