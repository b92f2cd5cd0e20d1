//! LogSink - logs a record summary via tracing

use contracts::{ContractError, RecordSink, UploadPayload};
use tracing::{info, instrument};

/// Sink for dry runs; nothing leaves the process
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl RecordSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_sink_deliver", skip(self, payload), fields(sink = %self.name))]
    async fn deliver(&self, payload: &UploadPayload) -> Result<(), ContractError> {
        info!(
            distance_m = payload.distance_m,
            date = %payload.date,
            time = %payload.time,
            camera = %payload.camera,
            image_b64_len = payload.image_b64.len(),
            "Record received"
        );
        Ok(())
    }

    async fn close(&self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
