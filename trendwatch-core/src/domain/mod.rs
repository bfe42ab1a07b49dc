//! Domain types for TrendWatch

pub mod bar;
pub mod series;
pub mod signal;

pub use bar::{Bar, BarError};
pub use series::PriceSeries;
pub use signal::{Bias, Regime, Signal};

/// Instrument identifier type alias (the display name used as state key).
pub type Symbol = String;
