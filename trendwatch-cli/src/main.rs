//! Trendwatch CLI: daily trend alerts, one-off evaluation and state inspection.
//!
//! Commands:
//! - `run`: evaluate the universe, update the state file, send alerts
//! - `evaluate`: evaluate a single ticker and print the result as JSON
//! - `state show`: print the persisted signal state
//! - `presets`: list the named strategy presets and their parameters

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use trendwatch_core::domain::PriceSeries;
use trendwatch_core::evaluator::SignalEvaluator;
use trendwatch_core::state::SignalStateStore;
use trendwatch_core::strategy::StrategyPreset;
use trendwatch_runner::{
    execute, init_logging, LogFormat, Notifier, NotifierConfig, ProviderConfig,
    RunConfig, RunOptions, StdoutNotifier, TelegramCredentials, TelegramNotifier, Universe,
};

#[derive(Parser)]
#[command(
    name = "trendwatch",
    version,
    about = "Trendwatch: end-of-day trend alerts with regime-aware rules"
)]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    Yahoo,
    Csv,
    Synthetic,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Path to a TOML run config. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Named preset: regime_adaptive, regime_relaxed, regime_loose, luxalgo_ema50.
    #[arg(long)]
    preset: Option<StrategyPreset>,

    /// Data provider override.
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,

    /// TOML file of `NAME = "TICKER"` pairs replacing the configured universe.
    #[arg(long)]
    symbols: Option<PathBuf>,

    /// Directory of `<TICKER>.csv` files (with `--provider csv`).
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    /// Last day of history to request (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the universe, update the state file and send alerts.
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// State file override.
        #[arg(long)]
        state: Option<PathBuf>,

        /// Evaluate instruments in parallel.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Print messages instead of sending them and leave the state file untouched.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Telegram bot token.
        #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
        telegram_token: Option<String>,

        /// Telegram chat id.
        #[arg(long, env = "TELEGRAM_CHAT_ID")]
        telegram_chat_id: Option<String>,
    },
    /// Evaluate one ticker and print the evaluation as JSON (state file untouched).
    Evaluate {
        /// Provider ticker, e.g. COMI.CA.
        ticker: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Treat a forced exit as already latched for this ticker.
        #[arg(long, default_value_t = false)]
        forced_exit: bool,
    },
    /// State file commands.
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// List strategy presets and their parameters.
    Presets,
}

#[derive(Subcommand)]
enum StateAction {
    /// Print the persisted signal state as JSON.
    Show {
        /// Path to a TOML run config (for its `state_file`).
        #[arg(long)]
        config: Option<PathBuf>,

        /// State file path.
        #[arg(long)]
        state: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    match cli.command {
        Commands::Run {
            source,
            state,
            parallel,
            dry_run,
            telegram_token,
            telegram_chat_id,
        } => run_cmd(
            source,
            state,
            parallel,
            dry_run,
            TelegramCredentials::from_parts(telegram_token, telegram_chat_id),
        ),
        Commands::Evaluate {
            ticker,
            source,
            forced_exit,
        } => evaluate_cmd(&ticker, source, forced_exit),
        Commands::State { action } => match action {
            StateAction::Show { config, state } => state_show_cmd(config, state),
        },
        Commands::Presets => presets_cmd(),
    }
}

/// Load the run config and apply CLI overrides.
fn resolve_config(source: &SourceArgs) -> Result<RunConfig> {
    let mut config = match &source.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(preset) = source.preset {
        config.preset = preset;
        config.strategy = None;
    }

    match (source.provider, &source.csv_dir) {
        (Some(ProviderKind::Yahoo), _) => {
            if !matches!(config.provider, ProviderConfig::Yahoo { .. }) {
                config.provider = ProviderConfig::yahoo();
            }
        }
        (Some(ProviderKind::Synthetic), _) => config.provider = ProviderConfig::Synthetic,
        (Some(ProviderKind::Csv), Some(dir)) | (None, Some(dir)) => {
            config.provider = ProviderConfig::Csv { dir: dir.clone() }
        }
        (Some(ProviderKind::Csv), None) => {
            if !matches!(config.provider, ProviderConfig::Csv { .. }) {
                bail!("--provider csv requires --csv-dir");
            }
        }
        (None, None) => {}
    }

    if let Some(path) = &source.symbols {
        config.symbols = Universe::from_file(path)?;
    }

    config.validate()?;
    Ok(config)
}

fn as_of(source: &SourceArgs) -> NaiveDate {
    source
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive())
}

fn run_cmd(
    source: SourceArgs,
    state: Option<PathBuf>,
    parallel: bool,
    dry_run: bool,
    credentials: Option<TelegramCredentials>,
) -> Result<()> {
    let mut config = resolve_config(&source)?;
    if let Some(path) = state {
        config.state_file = path;
    }
    config.parallel |= parallel;

    let provider = config.provider.build()?;
    let notifier: Box<dyn Notifier> = match (dry_run, config.notifier) {
        (true, _) | (false, NotifierConfig::Stdout) => Box::new(StdoutNotifier),
        (false, NotifierConfig::Telegram) => Box::new(TelegramNotifier::new(credentials)?),
    };

    info!(
        preset = %config.preset,
        instruments = config.symbols.len(),
        state_file = %config.state_file.display(),
        notifier = notifier.name(),
        dry_run,
        "run starting"
    );

    let outcome = execute(
        &config,
        provider.as_ref(),
        notifier.as_ref(),
        &RunOptions {
            as_of: as_of(&source),
            dry_run,
        },
    )?;

    if let Some(path) = &outcome.quarantined {
        eprintln!("Unreadable state file moved to {}", path.display());
    }
    if outcome.undelivered > 0 {
        eprintln!("{} message(s) could not be delivered", outcome.undelivered);
    }

    Ok(())
}

fn evaluate_cmd(ticker: &str, source: SourceArgs, forced_exit: bool) -> Result<()> {
    let config = resolve_config(&source)?;
    let evaluator = SignalEvaluator::new(config.strategy_config())?;
    let provider = config.provider.build()?;

    let end = as_of(&source);
    let start = end - chrono::Duration::days(i64::from(config.history_days));
    let fetched = provider
        .fetch(ticker, start, end)
        .with_context(|| format!("failed to fetch {ticker}"))?;
    let series = PriceSeries::new(fetched.bars)
        .with_context(|| format!("invalid price series for {ticker}"))?;
    let evaluation = evaluator.evaluate(&series, forced_exit)?;

    println!("{}", serde_json::to_string_pretty(&evaluation)?);
    Ok(())
}

fn state_show_cmd(config: Option<PathBuf>, state: Option<PathBuf>) -> Result<()> {
    let path = match (state, config) {
        (Some(path), _) => path,
        (None, Some(config)) => RunConfig::from_file(&config)?.state_file,
        (None, None) => RunConfig::default().state_file,
    };

    if !path.exists() {
        println!("No state file at {}", path.display());
        return Ok(());
    }

    // Read-only: an unreadable file is reported, not quarantined.
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let store: SignalStateStore = if content.trim().is_empty() {
        SignalStateStore::new()
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("state file {} is unreadable", path.display()))?
    };
    println!("{}", serde_json::to_string_pretty(&store)?);
    Ok(())
}

fn presets_cmd() -> Result<()> {
    for preset in StrategyPreset::ALL {
        let marker = if preset == StrategyPreset::default() {
            " (default)"
        } else {
            ""
        };
        println!("{preset}{marker}");
        println!("{}\n", serde_json::to_string_pretty(&preset.config())?);
    }
    Ok(())
}
