//! # Dispatcher
//!
//! Fire-and-forget delivery of capture records.
//!
//! Responsibilities:
//! - Run each capture + upload as an independent task on a bounded pool
//! - Drop (log, count) submissions when the pool is exhausted
//! - Keep transport failures inside the task
//! - Wait for in-flight work within a grace period on shutdown

pub mod alert;
pub mod error;
pub mod metrics;
pub mod sinks;
pub mod upload;

pub use alert::AlertDispatcher;
pub use contracts::{RecordSink, UploadPayload};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, UploadMetrics};
pub use sinks::{create_sink, ConfiguredSink, HttpSink, LogSink, StreamSink};
pub use upload::{ShutdownReport, UploadSink, UploadTask};
