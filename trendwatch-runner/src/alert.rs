//! Message composition for a finished batch.
//!
//! A run sends at most two messages: the data-failure summary (when any
//! instrument failed) followed by either the signals message or a single
//! "no new signals" note naming the latest evaluated candle.

use trendwatch_core::domain::Signal;
use trendwatch_core::state::AlertEvent;

use crate::batch::RunReport;

#[derive(Debug, Clone)]
pub struct AlertComposer {
    title: String,
}

impl Default for AlertComposer {
    fn default() -> Self {
        Self::new("EGX Trend Signals")
    }
}

impl AlertComposer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// One alert block:
    ///
    /// ```text
    /// 🟢 BUY | COMI
    /// Price: 71.50
    /// Date: 2024-06-03
    /// Regime: uptrend | Reason: trend entry
    /// ```
    pub fn format_alert(alert: &AlertEvent) -> String {
        let marker = match alert.signal {
            Signal::Buy => "🟢",
            Signal::Sell => "🔴",
        };
        let mut text = format!(
            "{marker} {} | {}\nPrice: {:.2}\nDate: {}\nRegime: {}",
            alert.signal, alert.instrument, alert.close, alert.timestamp, alert.regime
        );
        if let Some(reason) = alert.reason {
            text.push_str(&format!(" | Reason: {reason}"));
        }
        text
    }

    pub fn signals_message(&self, alerts: &[AlertEvent]) -> String {
        let blocks: Vec<String> = alerts.iter().map(Self::format_alert).collect();
        format!("🚨 {}:\n\n{}", self.title, blocks.join("\n\n"))
    }

    pub fn failure_message(report: &RunReport) -> Option<String> {
        if report.data_failures.is_empty() {
            return None;
        }
        let lines: Vec<String> = report
            .data_failures
            .iter()
            .map(|f| format!("- {} ({}): {}", f.instrument, f.ticker, f.error))
            .collect();
        Some(format!(
            "⚠️ Failed to load data for {} instrument(s):\n{}",
            report.data_failures.len(),
            lines.join("\n")
        ))
    }

    pub fn no_signals_message(report: &RunReport) -> String {
        let last = report
            .last_candle
            .map_or_else(|| "unavailable".to_string(), |d| d.to_string());
        format!("ℹ️ No new signals\nLast candle: {last}")
    }

    /// All messages for a report, in sending order.
    pub fn compose(&self, report: &RunReport) -> Vec<String> {
        let mut messages = Vec::with_capacity(2);
        messages.extend(Self::failure_message(report));
        if report.alerts.is_empty() {
            messages.push(Self::no_signals_message(report));
        } else {
            messages.push(self.signals_message(&report.alerts));
        }
        messages
    }
}
