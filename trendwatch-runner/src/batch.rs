//! Batch evaluation over the universe.
//!
//! Each instrument is fetched, validated and evaluated independently. The
//! only shared input is the read-only prior forced-exit flag from the store,
//! so the per-instrument work may run on the rayon pool. Results are applied
//! to the store afterwards in name order, which makes the report and the
//! store identical for sequential and parallel runs.

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use trendwatch_core::data::{DataError, DataProvider};
use trendwatch_core::domain::{BarError, PriceSeries};
use trendwatch_core::evaluator::{Evaluation, SignalEvaluator};
use trendwatch_core::state::{AlertEvent, SignalStateStore};
use trendwatch_core::SignalError;

use crate::universe::Universe;

/// Why one instrument produced no evaluation.
#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("invalid series: {0}")]
    Series(#[from] BarError),

    #[error(transparent)]
    Signal(#[from] SignalError),
}

#[derive(Debug)]
pub struct DataFailure {
    pub instrument: String,
    pub ticker: String,
    pub error: InstrumentError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Last calendar day requested from the provider.
    pub as_of: NaiveDate,
    pub history_days: u32,
    pub parallel: bool,
}

impl BatchOptions {
    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        (self.as_of - Duration::days(i64::from(self.history_days)), self.as_of)
    }
}

/// Outcome of one batch.
#[derive(Debug, Default)]
pub struct RunReport {
    /// New signals, in instrument name order.
    pub alerts: Vec<AlertEvent>,
    pub data_failures: Vec<DataFailure>,
    /// Latest bar date among evaluated instruments.
    pub last_candle: Option<NaiveDate>,
    pub evaluated: usize,
}

impl RunReport {
    pub fn failed_instruments(&self) -> Vec<&str> {
        self.data_failures
            .iter()
            .map(|f| f.instrument.as_str())
            .collect()
    }
}

fn evaluate_one(
    ticker: &str,
    provider: &dyn DataProvider,
    evaluator: &SignalEvaluator,
    prior_forced_exit: bool,
    window: (NaiveDate, NaiveDate),
) -> Result<Evaluation, InstrumentError> {
    let fetched = provider.fetch(ticker, window.0, window.1)?;
    let series = PriceSeries::new(fetched.bars)?;
    Ok(evaluator.evaluate(&series, prior_forced_exit)?)
}

/// Evaluate every instrument in the universe and fold the results into `store`.
///
/// Failed instruments are listed in the report and their records are left
/// untouched. Never fails as a whole.
pub fn run_batch<'a>(
    universe: &'a Universe,
    provider: &dyn DataProvider,
    evaluator: &SignalEvaluator,
    store: &mut SignalStateStore,
    options: &BatchOptions,
) -> RunReport {
    let window = options.window();
    let pairs: Vec<(&'a str, &'a str)> = universe.iter().collect();
    info!(
        instruments = pairs.len(),
        provider = provider.name(),
        start = %window.0,
        end = %window.1,
        parallel = options.parallel,
        "starting batch"
    );

    let prior: &SignalStateStore = store;
    let work = |pair: &(&'a str, &'a str)| {
        let (name, ticker) = *pair;
        let result = evaluate_one(
            ticker,
            provider,
            evaluator,
            prior.prior_forced_exit(name),
            window,
        );
        (name, ticker, result)
    };

    let results: Vec<_> = if options.parallel {
        pairs.par_iter().map(work).collect()
    } else {
        pairs.iter().map(work).collect()
    };

    let mut report = RunReport::default();
    for (name, ticker, result) in results {
        match result {
            Ok(evaluation) => {
                debug!(
                    instrument = name,
                    date = %evaluation.date,
                    regime = %evaluation.regime,
                    raw_signal = ?evaluation.raw_signal,
                    forced_exit = evaluation.forced_exit,
                    "evaluated"
                );
                report.evaluated += 1;
                report.last_candle = report.last_candle.max(Some(evaluation.date));
                if let Some(alert) = store.apply(name, &evaluation) {
                    report.alerts.push(alert);
                }
            }
            Err(error) => {
                warn!(instrument = name, ticker, %error, "instrument skipped");
                report.data_failures.push(DataFailure {
                    instrument: name.to_string(),
                    ticker: ticker.to_string(),
                    error,
                });
            }
        }
    }

    info!(
        evaluated = report.evaluated,
        alerts = report.alerts.len(),
        failures = report.data_failures.len(),
        "batch complete"
    );
    report
}
