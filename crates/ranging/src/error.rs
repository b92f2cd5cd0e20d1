//! Ranging error types

use std::time::Duration;

use contracts::{ContractError, EchoEdge};
use thiserror::Error;

/// Pulse measurement errors
#[derive(Debug, Error)]
pub enum RangingError {
    /// Echo edge did not arrive within the bound
    #[error("no {edge} echo edge within {waited:?}")]
    Timeout { edge: EchoEdge, waited: Duration },

    /// Pin could not be driven or read
    #[error("{line} pin error: {kind:?}")]
    Pin {
        line: &'static str,
        kind: embedded_hal::digital::ErrorKind,
    },
}

impl From<RangingError> for ContractError {
    fn from(err: RangingError) -> Self {
        match err {
            RangingError::Timeout { edge, waited } => ContractError::SensorTimeout { edge, waited },
            RangingError::Pin { line, kind } => ContractError::gpio(line, format!("{kind:?}")),
        }
    }
}
