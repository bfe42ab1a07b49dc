//! Bar: the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLC bar for a single instrument.
///
/// Prices are expected to be positive and finite. Providers construct bars
/// freely; `PriceSeries::new` is where the invariants are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Reasons a bar (or a sequence of bars) is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar {date}: {field} is not finite")]
    NonFinite { date: NaiveDate, field: &'static str },

    #[error("bar {date}: {field} must be positive, got {value}")]
    NonPositive {
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },

    #[error("bar {date} is not after the previous bar {previous}")]
    OutOfOrder {
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("price series is empty")]
    Empty,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
        }
    }

    /// Check that every price is finite and positive.
    pub fn validate(&self) -> Result<(), BarError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() {
                return Err(BarError::NonFinite {
                    date: self.date,
                    field,
                });
            }
            if value <= 0.0 {
                return Err(BarError::NonPositive {
                    date: self.date,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            100.0,
            105.0,
            98.0,
            103.0,
        )
    }

    #[test]
    fn valid_bar_passes() {
        assert!(sample_bar().validate().is_ok());
    }

    #[test]
    fn nan_close_is_rejected() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(matches!(
            bar.validate(),
            Err(BarError::NonFinite { field: "close", .. })
        ));
    }

    #[test]
    fn zero_low_is_rejected() {
        let mut bar = sample_bar();
        bar.low = 0.0;
        assert!(matches!(
            bar.validate(),
            Err(BarError::NonPositive { field: "low", .. })
        ));
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
