//! Trendwatch Runner: daily batch orchestration on top of `trendwatch-core`.
//!
//! This crate provides:
//! - TOML run configuration and the instrument universe
//! - Batch evaluation (sequential or on the rayon pool)
//! - State file loading, legacy migration, quarantine and atomic writes
//! - Alert message composition and delivery (Telegram, stdout)
//! - Logging setup

pub mod alert;
pub mod batch;
pub mod config;
pub mod logging;
pub mod notify;
pub mod persistence;
pub mod run;
pub mod universe;

pub use alert::AlertComposer;
pub use batch::{run_batch, BatchOptions, DataFailure, InstrumentError, RunReport};
pub use config::{ConfigError, NotifierConfig, ProviderConfig, RunConfig};
pub use logging::{init_logging, LogFormat};
pub use notify::{Notifier, NotifyError, StdoutNotifier, TelegramCredentials, TelegramNotifier};
pub use persistence::{load_state, peek_state, save_state, LoadedState, StateFileError};
pub use run::{execute, RunError, RunOptions, RunOutcome};
pub use universe::Universe;
