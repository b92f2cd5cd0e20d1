//! Error types for CLI operations.

use std::path::Path;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// The sensing thread could not be started or panicked
    #[error("Sensing thread failed: {message}")]
    SensingThread { message: String },
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn sensing_thread(message: impl Into<String>) -> Self {
        Self::SensingThread {
            message: message.into(),
        }
    }
}
