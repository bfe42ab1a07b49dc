//! Errors raised by the indicator and signal components.

use thiserror::Error;

use crate::domain::BarError;

/// Failure of a single instrument's evaluation.
///
/// None of these are fatal for a batch: the runner reports the instrument as
/// a data failure and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("insufficient history: need {required} bars, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl SignalError {
    pub fn insufficient(required: usize, available: usize) -> Self {
        Self::InsufficientHistory {
            required,
            available,
        }
    }
}

impl From<BarError> for SignalError {
    fn from(e: BarError) -> Self {
        SignalError::InvalidInput(e.to_string())
    }
}
