//! Layered error definitions
//!
//! Categorized by source: config / sensor / actuator / capture / upload

use std::time::Duration;

use thiserror::Error;

/// Echo edge a pulse measurement was waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoEdge {
    /// Echo line never went high
    Rising,
    /// Echo line never went low again
    Falling,
}

impl std::fmt::Display for EchoEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rising => write!(f, "rising"),
            Self::Falling => write!(f, "falling"),
        }
    }
}

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Sensor Errors =====
    /// No echo edge within the bounded wait
    #[error("sensor timeout: no {edge} echo edge after {waited:?}")]
    SensorTimeout { edge: EchoEdge, waited: Duration },

    /// GPIO line could not be driven or read
    #[error("gpio fault on '{line}': {message}")]
    GpioFault { line: String, message: String },

    // ===== Actuator Errors =====
    /// Output device rejected a command
    #[error("actuator '{device}' error: {message}")]
    Actuator { device: String, message: String },

    // ===== Capture Errors =====
    /// Camera could not deliver a frame
    #[error("capture failure on camera '{camera}': {message}")]
    CaptureFailure { camera: String, message: String },

    // ===== Upload Errors =====
    /// Record could not be delivered to the collector
    #[error("upload failure on sink '{sink_name}': {message}")]
    UploadFailure { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create GPIO fault
    pub fn gpio(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GpioFault {
            line: line.into(),
            message: message.into(),
        }
    }

    /// Create actuator error
    pub fn actuator(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Actuator {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create capture failure
    pub fn capture(camera: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CaptureFailure {
            camera: camera.into(),
            message: message.into(),
        }
    }

    /// Create upload failure
    pub fn upload(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UploadFailure {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether the sensing loop should keep running after this error
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::SensorTimeout { .. }
                | Self::GpioFault { .. }
                | Self::Actuator { .. }
                | Self::CaptureFailure { .. }
                | Self::UploadFailure { .. }
        )
    }
}
