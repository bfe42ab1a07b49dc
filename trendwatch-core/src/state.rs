//! Signal state store: per-instrument memory of the last alerted signal.
//!
//! State machine per instrument:
//!
//! ```text
//! NoRecord ──first evaluation──▶ HasRecord(last_signal, regime, forced_exit)
//! HasRecord ──every evaluation──▶ HasRecord(..)
//! ```
//!
//! `last_signal` only moves when a non-null raw signal differs from it, and
//! that is also the only case that produces an [`AlertEvent`]. A null raw
//! signal carries the previous direction forward. Data failures never reach
//! the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{Regime, Signal, Symbol};
use crate::evaluator::{Evaluation, SignalReason};

/// Persisted memory for one instrument.
///
/// Deserialization also accepts the older shapes found in state files: a
/// bare `"BUY"`/`"SELL"` string, or an object keyed `last_signal` with an
/// optional `trend` field and arbitrary extra fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "StoredRecord")]
pub struct SignalRecord {
    pub last_signal: Option<Signal>,
    pub trend_regime: Option<Regime>,
    pub forced_exit: bool,
}

/// Every record shape the store has ever written.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Bare(Option<String>),
    Nested(NestedRecord),
}

#[derive(Deserialize)]
struct NestedRecord {
    #[serde(default)]
    last_signal: Option<String>,
    #[serde(default, alias = "trend")]
    trend_regime: Option<String>,
    #[serde(default)]
    forced_exit: bool,
}

impl From<StoredRecord> for SignalRecord {
    fn from(stored: StoredRecord) -> Self {
        match stored {
            StoredRecord::Bare(signal) => SignalRecord {
                last_signal: signal.and_then(|s| s.parse().ok()),
                ..Default::default()
            },
            StoredRecord::Nested(n) => SignalRecord {
                last_signal: n.last_signal.and_then(|s| s.parse().ok()),
                trend_regime: n.trend_regime.and_then(|s| s.parse().ok()),
                forced_exit: n.forced_exit,
            },
        }
    }
}

/// A new signal transition that must be delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub instrument: Symbol,
    pub signal: Signal,
    pub previous: Option<Signal>,
    pub regime: Regime,
    /// Date of the evaluated bar.
    pub timestamp: NaiveDate,
    pub close: f64,
    pub reason: Option<SignalReason>,
}

/// Pure transition: previous record + evaluation → next record and optional alert.
pub fn transition(
    instrument: &str,
    previous: Option<&SignalRecord>,
    evaluation: &Evaluation,
) -> (SignalRecord, Option<AlertEvent>) {
    let last_signal = previous.and_then(|r| r.last_signal);

    let alert = match evaluation.raw_signal {
        Some(signal) if Some(signal) != last_signal => Some(AlertEvent {
            instrument: instrument.to_string(),
            signal,
            previous: last_signal,
            regime: evaluation.regime,
            timestamp: evaluation.date,
            close: evaluation.snapshot.close,
            reason: evaluation.reason,
        }),
        _ => None,
    };

    let record = SignalRecord {
        last_signal: alert.as_ref().map(|a| a.signal).or(last_signal),
        trend_regime: Some(evaluation.regime),
        forced_exit: evaluation.forced_exit,
    };

    (record, alert)
}

/// Mapping instrument → record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalStateStore {
    records: BTreeMap<Symbol, SignalRecord>,
}

impl SignalStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: BTreeMap<Symbol, SignalRecord>) -> Self {
        Self { records }
    }

    pub fn get(&self, instrument: &str) -> Option<&SignalRecord> {
        self.records.get(instrument)
    }

    /// Forced-exit flag to feed into the next evaluation (false for NoRecord).
    pub fn prior_forced_exit(&self, instrument: &str) -> bool {
        self.get(instrument).is_some_and(|r| r.forced_exit)
    }

    /// Record a successful evaluation; returns the alert if the signal is new.
    pub fn apply(&mut self, instrument: &str, evaluation: &Evaluation) -> Option<AlertEvent> {
        let (record, alert) = transition(instrument, self.records.get(instrument), evaluation);
        self.records.insert(instrument.to_string(), record);
        alert
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SignalRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn records(&self) -> &BTreeMap<Symbol, SignalRecord> {
        &self.records
    }
}
