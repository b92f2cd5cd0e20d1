//! Dispatcher error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Every pool slot is taken; the submission was dropped
    #[error("upload pool for sink '{sink_name}' exhausted ({capacity} in flight), record dropped")]
    PoolExhausted { sink_name: String, capacity: usize },

    /// Shutdown started; no new work accepted
    #[error("sink '{sink_name}' is shutting down, record dropped")]
    Closed { sink_name: String },

    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
