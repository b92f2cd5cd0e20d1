//! RecordSink trait - UploadSink output interface
//!
//! Defines the abstract interface for delivery transports.

use crate::{ContractError, UploadPayload};

/// Record delivery trait
///
/// Deliveries run concurrently from independent tasks, so implementations
/// take `&self` and serialize internally where the transport requires it.
#[trait_variant::make(RecordSink: Send)]
pub trait LocalRecordSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one record
    ///
    /// # Errors
    /// Returns `UploadFailure` (should include context)
    async fn deliver(&self, payload: &UploadPayload) -> Result<(), ContractError>;

    /// Release transport resources
    async fn close(&self) -> Result<(), ContractError>;
}
