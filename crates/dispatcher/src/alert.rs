//! Critical-entry handler: capture + upload off the sensing thread

use std::sync::Arc;

use capture::CapturePipeline;
use contracts::{AlertHandler, ContractError, Measurement, Notice, RecordSink};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::upload::{post_notice, UploadSink};

/// Turns each critical-zone entry into one capture + upload task
///
/// `on_critical_entry` only claims a pool slot and returns; the capture runs
/// on a blocking worker inside that slot.
pub struct AlertDispatcher<S> {
    uploads: Arc<UploadSink<S>>,
    capture: Arc<CapturePipeline>,
    notices: Option<mpsc::Sender<Notice>>,
}

impl<S> AlertDispatcher<S>
where
    S: RecordSink + Sync + 'static,
{
    pub fn new(uploads: Arc<UploadSink<S>>, capture: Arc<CapturePipeline>) -> Self {
        Self {
            uploads,
            capture,
            notices: None,
        }
    }

    pub fn with_notices(mut self, notices: mpsc::Sender<Notice>) -> Self {
        self.notices = Some(notices);
        self
    }

    pub fn uploads(&self) -> &Arc<UploadSink<S>> {
        &self.uploads
    }
}

impl<S> AlertHandler for AlertDispatcher<S>
where
    S: RecordSink + Sync + 'static,
{
    fn on_critical_entry(&self, measurement: Measurement) {
        let capture = Arc::clone(&self.capture);
        let submitted = self
            .uploads
            .submit_with(move || capture.record(&measurement).map_err(ContractError::from));

        match submitted {
            Ok(task_id) => debug!(task_id, distance_m = measurement.distance_m, "Capture scheduled"),
            Err(e) => {
                warn!(error = %e, "Critical entry not captured");
                post_notice(self.notices.as_ref(), "Upload skipped");
            }
        }
    }
}
