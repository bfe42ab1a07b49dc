//! PriceSeries: validated, date-ordered bars for one instrument.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bar::{Bar, BarError};

/// Ordered sequence of daily bars.
///
/// Invariants (checked once in `new`): at least one bar, strictly
/// increasing dates, and positive finite prices. Calendar gaps are allowed
/// and never filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bar>", into = "Vec<Bar>")]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, BarError> {
        if bars.is_empty() {
            return Err(BarError::Empty);
        }
        for bar in &bars {
            bar.validate()?;
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(BarError::OutOfOrder {
                    previous: pair[0].date,
                    date: pair[1].date,
                });
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> &Bar {
        // Non-empty by construction.
        &self.bars[self.bars.len() - 1]
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last().date
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// Series truncated to the first `len` bars (used for prefix/look-ahead checks).
    pub fn prefix(&self, len: usize) -> Option<Self> {
        if len == 0 || len > self.bars.len() {
            return None;
        }
        Some(Self {
            bars: self.bars[..len].to_vec(),
        })
    }
}

impl TryFrom<Vec<Bar>> for PriceSeries {
    type Error = BarError;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        Self::new(bars)
    }
}

impl From<PriceSeries> for Vec<Bar> {
    fn from(series: PriceSeries) -> Self {
        series.bars
    }
}
