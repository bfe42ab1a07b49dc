//! One complete alert run: load state, evaluate the universe, persist,
//! deliver messages.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

use trendwatch_core::data::DataProvider;
use trendwatch_core::evaluator::SignalEvaluator;

use crate::alert::AlertComposer;
use crate::batch::{run_batch, BatchOptions, RunReport};
use crate::config::{ConfigError, RunConfig};
use crate::notify::Notifier;
use crate::persistence::{load_state, peek_state, save_state, StateFileError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("state error: {0}")]
    State(#[from] StateFileError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub as_of: NaiveDate,
    /// Leave the state file untouched: no write, no quarantine.
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub messages: Vec<String>,
    pub quarantined: Option<PathBuf>,
    pub state_written: bool,
    /// Messages the notifier failed to deliver.
    pub undelivered: usize,
}

/// Execute a run.
///
/// Instrument failures never abort the run. The state file is written before
/// messages are sent; a write failure is returned only after delivery has
/// been attempted.
pub fn execute(
    config: &RunConfig,
    provider: &dyn DataProvider,
    notifier: &dyn Notifier,
    options: &RunOptions,
) -> Result<RunOutcome, RunError> {
    let evaluator = SignalEvaluator::new(config.strategy_config()).map_err(ConfigError::from)?;
    // A dry run must leave the state file exactly as it found it.
    let loaded = if options.dry_run {
        peek_state(&config.state_file)?
    } else {
        load_state(&config.state_file)?
    };
    let mut store = loaded.store;

    let report = run_batch(
        &config.symbols,
        provider,
        &evaluator,
        &mut store,
        &BatchOptions {
            as_of: options.as_of,
            history_days: config.history_days,
            parallel: config.parallel,
        },
    );

    let messages = AlertComposer::new(config.title.as_str()).compose(&report);

    let saved = if options.dry_run {
        info!("dry run, state file not written");
        Ok(false)
    } else {
        save_state(&config.state_file, &store).map(|()| true)
    };

    let mut undelivered = 0;
    for message in &messages {
        if let Err(error) = notifier.send(message) {
            warn!(notifier = notifier.name(), %error, "message not delivered");
            undelivered += 1;
        }
    }

    let state_written = saved?;
    info!(
        alerts = report.alerts.len(),
        failures = report.data_failures.len(),
        messages = messages.len(),
        undelivered,
        state_written,
        "run finished"
    );

    Ok(RunOutcome {
        report,
        messages,
        quarantined: loaded.quarantined,
        state_written,
        undelivered,
    })
}
