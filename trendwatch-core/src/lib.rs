//! Trendwatch Core: indicators, regime classification, signal rules and
//! signal state for end-of-day trend alerts.
//!
//! This crate contains everything that decides *whether* to alert:
//! - Domain types (bars, validated price series, signals, regimes)
//! - Indicators (EMA, rolling mean, RSI)
//! - Adaptive trend line and regime classifier
//! - Strategy presets and the per-instrument signal evaluator
//! - Signal state store with de-duplication and the forced-exit latch
//! - Data providers (Yahoo Finance, CSV directory, synthetic)

pub mod data;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod indicators;
pub mod regime;
pub mod state;
pub mod strategy;
pub mod trend;

pub use error::SignalError;
