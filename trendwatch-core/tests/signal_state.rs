//! End-to-end tests: price series → evaluator → state store → alerts.

use chrono::NaiveDate;
use trendwatch_core::domain::{Bar, PriceSeries, Regime, Signal};
use trendwatch_core::evaluator::{SignalEvaluator, SignalReason};
use trendwatch_core::indicators::{Rsi, RsiSmoothing};
use trendwatch_core::regime::RegimeConfig;
use trendwatch_core::state::{SignalRecord, SignalStateStore};
use trendwatch_core::strategy::StrategyConfig;
use trendwatch_core::trend::{AdaptiveTrendLine, TrendLineConfig};
use trendwatch_core::SignalError;

fn series_from(closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let date = start + chrono::Duration::days(i as i64);
            Bar::new(date, c, c + 0.5, c - 0.5, c)
        })
        .collect();
    PriceSeries::new(bars).unwrap()
}

fn small_config() -> StrategyConfig {
    StrategyConfig {
        trend: TrendLineConfig {
            length: 10,
            increment_count: 12,
            fast_span: 12,
        },
        regime: RegimeConfig {
            long_span: 20,
            lookback: 20,
            threshold: 0.85,
        },
        ..StrategyConfig::default()
    }
}

/// Rising zigzag (+2 / -1.5) of `n` closes; odd `n` ends on a pullback, which
/// keeps RSI under the uptrend BUY cap.
fn rising_zigzag(n: usize) -> PriceSeries {
    let mut closes = vec![100.0];
    for i in 1..n {
        let step = if i % 2 == 1 { 2.0 } else { -1.5 };
        closes.push(closes[i - 1] + step);
    }
    series_from(&closes)
}

/// Flat oscillation between 100 and 101, then three 3-point drops to 91.
fn ranging_dip() -> PriceSeries {
    let mut closes: Vec<f64> = (0..40)
        .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
        .collect();
    closes.extend([97.0, 94.0, 91.0]);
    series_from(&closes)
}

/// Steady climb followed by a sharp drop on the last bar.
fn collapse() -> PriceSeries {
    let mut closes: Vec<f64> = (0..59).map(|i| 100.0 + i as f64).collect();
    closes.push(120.0);
    series_from(&closes)
}

#[test]
fn flat_then_jump_resets_alpha() {
    let mut closes = vec![10.0; 11];
    closes.push(20.0);
    let line = AdaptiveTrendLine::new(TrendLineConfig {
        length: 5,
        increment_count: 12,
        fast_span: 12,
    })
    .unwrap();
    let states = line.trace_slices(&closes, &closes, &closes).unwrap();
    let last = states.last().unwrap();
    assert!(last.crossed);
    assert!((last.alpha - 2.0 / 6.0).abs() < 1e-12);
}

#[test]
fn uptrend_pullback_raises_a_buy() {
    let evaluator = SignalEvaluator::new(small_config()).unwrap();
    let mut store = SignalStateStore::new();

    let evaluation = evaluator
        .evaluate(&rising_zigzag(41), store.prior_forced_exit("SWDY"))
        .unwrap();
    assert_eq!(evaluation.regime, Regime::Uptrend);
    assert_eq!(evaluation.raw_signal, Some(Signal::Buy));
    assert_eq!(evaluation.reason, Some(SignalReason::TrendEntry));
    assert!(evaluation.snapshot.rsi < 60.0);
    assert!(!evaluation.forced_exit);

    let alert = store.apply("SWDY", &evaluation).unwrap();
    assert_eq!(alert.signal, Signal::Buy);
    assert_eq!(alert.previous, None);
    assert_eq!(alert.close, 110.0);
    assert_eq!(
        store.get("SWDY"),
        Some(&SignalRecord {
            last_signal: Some(Signal::Buy),
            trend_regime: Some(Regime::Uptrend),
            forced_exit: false,
        })
    );
}

#[test]
fn repeated_buy_is_not_realerted() {
    let evaluator = SignalEvaluator::new(small_config()).unwrap();
    let mut store = SignalStateStore::from_records(
        [(
            "COMI".to_string(),
            SignalRecord {
                last_signal: Some(Signal::Buy),
                trend_regime: Some(Regime::Uptrend),
                forced_exit: false,
            },
        )]
        .into_iter()
        .collect(),
    );
    let before = *store.get("COMI").unwrap();

    let evaluation = evaluator
        .evaluate(&rising_zigzag(41), store.prior_forced_exit("COMI"))
        .unwrap();
    assert_eq!(evaluation.raw_signal, Some(Signal::Buy));

    assert!(store.apply("COMI", &evaluation).is_none());
    assert_eq!(store.get("COMI"), Some(&before));
}

#[test]
fn strictly_rising_closes_pin_rsi_at_100() {
    let closes: Vec<f64> = (0..15).map(|i| 20.0 + i as f64).collect();
    for smoothing in [RsiSmoothing::Simple, RsiSmoothing::Wilder] {
        let rsi = Rsi::new(14, smoothing).unwrap();
        let values = rsi.compute_closes(&closes).unwrap();
        assert_eq!(*values.last().unwrap(), 100.0);
    }
}

#[test]
fn short_history_fails_and_leaves_store_untouched() {
    let mut store = SignalStateStore::new();
    let evaluator = SignalEvaluator::new(small_config()).unwrap();
    let series = series_from(&[10.0; 12]);

    let result = evaluator.evaluate(&series, store.prior_forced_exit("ORWE"));
    assert!(matches!(
        result,
        Err(SignalError::InsufficientHistory {
            required: 20,
            available: 12
        })
    ));
    if let Ok(evaluation) = result {
        store.apply("ORWE", &evaluation);
    }
    assert!(store.get("ORWE").is_none());
}

#[test]
fn forced_exit_fires_once_across_runs() {
    let evaluator = SignalEvaluator::new(small_config()).unwrap();
    let series = collapse();
    let mut store = SignalStateStore::new();

    // Run 1: close drops under the forced-exit EMA.
    let evaluation = evaluator
        .evaluate(&series, store.prior_forced_exit("TMGH"))
        .unwrap();
    assert_eq!(evaluation.reason, Some(SignalReason::ForcedExit));
    let alert = store.apply("TMGH", &evaluation).unwrap();
    assert_eq!(alert.signal, Signal::Sell);
    assert!(store.get("TMGH").unwrap().forced_exit);

    // Run 2 on the same data: the latch suppresses a second forced exit and
    // the regular SELL is de-duplicated against the stored one.
    let evaluation = evaluator
        .evaluate(&series, store.prior_forced_exit("TMGH"))
        .unwrap();
    assert_ne!(evaluation.reason, Some(SignalReason::ForcedExit));
    assert_eq!(evaluation.raw_signal, Some(Signal::Sell));
    assert!(store.apply("TMGH", &evaluation).is_none());
    let record = store.get("TMGH").unwrap();
    assert!(record.forced_exit);
    assert_eq!(record.last_signal, Some(Signal::Sell));
}

#[test]
fn mean_reversion_buy_clears_the_latch() {
    let evaluator = SignalEvaluator::new(small_config()).unwrap();
    let series = ranging_dip();
    let mut store = SignalStateStore::new();

    // Run 1: the dip takes the close under the forced-exit EMA.
    let evaluation = evaluator
        .evaluate(&series, store.prior_forced_exit("MTIE"))
        .unwrap();
    assert_eq!(evaluation.reason, Some(SignalReason::ForcedExit));
    store.apply("MTIE", &evaluation);
    assert!(store.prior_forced_exit("MTIE"));

    // Run 2: latched, so the ranging rule set decides and buys the dip.
    let evaluation = evaluator
        .evaluate(&series, store.prior_forced_exit("MTIE"))
        .unwrap();
    assert_eq!(evaluation.regime, Regime::Ranging);
    assert_eq!(evaluation.raw_signal, Some(Signal::Buy));
    assert_eq!(evaluation.reason, Some(SignalReason::MeanReversionEntry));
    assert!(evaluation.snapshot.rsi < 40.0);
    assert!(evaluation.snapshot.close < evaluation.snapshot.entry_ema);
    assert!(!evaluation.forced_exit);

    let alert = store.apply("MTIE", &evaluation).unwrap();
    assert_eq!(alert.signal, Signal::Buy);
    assert_eq!(alert.previous, Some(Signal::Sell));
    assert!(!store.prior_forced_exit("MTIE"));
    assert_eq!(store.get("MTIE").unwrap().trend_regime, Some(Regime::Ranging));
}

#[test]
fn instruments_are_independent() {
    let evaluator = SignalEvaluator::new(small_config()).unwrap();
    let rising = series_from(&(0..60).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
    let falling = collapse();

    let mut forward = SignalStateStore::new();
    for (name, series) in [("A", &rising), ("B", &falling)] {
        let ev = evaluator.evaluate(series, forward.prior_forced_exit(name)).unwrap();
        forward.apply(name, &ev);
    }

    let mut backward = SignalStateStore::new();
    for (name, series) in [("B", &falling), ("A", &rising)] {
        let ev = evaluator.evaluate(series, backward.prior_forced_exit(name)).unwrap();
        backward.apply(name, &ev);
    }

    assert_eq!(forward, backward);
}
