//! UploadSink - bounded pool of capture + upload tasks

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};

use contracts::{CaptureRecord, ContractError, Notice, RecordSink, UploadConfig, UploadPayload};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::DispatcherError;
use crate::metrics::UploadMetrics;

/// An in-flight delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTask {
    pub id: u64,
    pub dispatched_at: Instant,
}

/// Outcome of `UploadSink::shutdown`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// All in-flight tasks finished within the grace period
    pub drained: bool,
    /// Tasks still running when the grace period ended
    pub abandoned: Vec<u64>,
}

struct Shared<S> {
    sink: S,
    name: String,
    capacity: usize,
    permits: Arc<Semaphore>,
    accepting: AtomicBool,
    next_id: AtomicU64,
    in_flight: Mutex<HashMap<u64, Instant>>,
    metrics: UploadMetrics,
    notices: OnceLock<mpsc::Sender<Notice>>,
}

impl<S> Shared<S> {
    fn tasks(&self) -> MutexGuard<'_, HashMap<u64, Instant>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn track(&self, id: u64, at: Instant) {
        let mut tasks = self.tasks();
        tasks.insert(id, at);
        self.publish_in_flight(tasks.len());
    }

    fn untrack(&self, id: u64) -> Option<Instant> {
        let mut tasks = self.tasks();
        let started = tasks.remove(&id);
        self.publish_in_flight(tasks.len());
        started
    }

    fn publish_in_flight(&self, n: usize) {
        self.metrics.set_in_flight(n);
        observability::set_uploads_in_flight(&self.name, n);
    }

    fn notify(&self, text: impl Into<String>) {
        post_notice(self.notices.get(), text);
    }

    fn reject(&self, err: DispatcherError) -> DispatcherError {
        self.metrics.inc_dropped();
        observability::record_upload_dropped(&self.name);
        warn!(sink = %self.name, error = %err, "Submission dropped");
        err
    }
}

/// Offer a notice to the display owner without blocking
///
/// A full or closed channel drops the notice.
pub(crate) fn post_notice(notices: Option<&mpsc::Sender<Notice>>, text: impl Into<String>) {
    if let Some(tx) = notices {
        if let Err(e) = tx.try_send(Notice::new(text)) {
            trace!(notice = %e.into_inner().text, "Notice channel unavailable, notice dropped");
        }
    }
}

/// Fire-and-forget record delivery
///
/// Each submission runs as its own task on the runtime behind `handle`, so
/// `submit` can be called from the sensing thread. At most `max_concurrent`
/// tasks run at once; beyond that submissions are dropped, never queued.
/// Failures stay inside the task: logged, counted, not retried.
pub struct UploadSink<S> {
    shared: Arc<Shared<S>>,
    handle: Handle,
}

impl<S> UploadSink<S>
where
    S: RecordSink + Sync + 'static,
{
    pub fn new(sink: S, max_concurrent: usize, handle: Handle) -> Self {
        let capacity = max_concurrent.max(1);
        let name = sink.name().to_string();
        Self {
            shared: Arc::new(Shared {
                sink,
                name,
                capacity,
                permits: Arc::new(Semaphore::new(capacity)),
                accepting: AtomicBool::new(true),
                next_id: AtomicU64::new(1),
                in_flight: Mutex::new(HashMap::new()),
                metrics: UploadMetrics::new(),
                notices: OnceLock::new(),
            }),
            handle,
        }
    }

    pub fn from_config(sink: S, config: &UploadConfig, handle: Handle) -> Self {
        Self::new(sink, config.max_concurrent, handle)
    }

    /// Post delivery outcomes to the display owner
    ///
    /// Tasks already running pick the channel up when they finish. Only the
    /// first channel is kept.
    pub fn with_notices(self, notices: mpsc::Sender<Notice>) -> Self {
        if self.shared.notices.set(notices).is_err() {
            warn!(sink = %self.shared.name, "Notice channel already set, new one ignored");
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn metrics(&self) -> &UploadMetrics {
        &self.shared.metrics
    }

    /// Deliveries currently running, oldest first
    pub fn in_flight(&self) -> Vec<UploadTask> {
        let mut tasks: Vec<_> = self
            .shared
            .tasks()
            .iter()
            .map(|(&id, &dispatched_at)| UploadTask { id, dispatched_at })
            .collect();
        tasks.sort_by_key(|t| t.dispatched_at);
        tasks
    }

    /// Deliver an already captured record
    pub fn submit(&self, record: CaptureRecord) -> Result<u64, DispatcherError> {
        self.spawn_slot(async move { Ok(record) })
    }

    /// Produce the record on a blocking worker inside the pool slot, then
    /// deliver it
    pub fn submit_with<F>(&self, producer: F) -> Result<u64, DispatcherError>
    where
        F: FnOnce() -> Result<CaptureRecord, ContractError> + Send + 'static,
    {
        self.spawn_slot(async move {
            tokio::task::spawn_blocking(producer)
                .await
                .map_err(|e| ContractError::Other(format!("capture task failed: {e}")))?
        })
    }

    fn spawn_slot<F>(&self, record: F) -> Result<u64, DispatcherError>
    where
        F: Future<Output = Result<CaptureRecord, ContractError>> + Send + 'static,
    {
        let shared = &self.shared;
        if !shared.accepting.load(Ordering::Acquire) {
            return Err(shared.reject(DispatcherError::Closed {
                sink_name: shared.name.clone(),
            }));
        }
        let permit = match Arc::clone(&shared.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                return Err(shared.reject(DispatcherError::PoolExhausted {
                    sink_name: shared.name.clone(),
                    capacity: shared.capacity,
                }))
            }
        };

        let id = shared.next_id.fetch_add(1, Ordering::Relaxed);
        shared.track(id, Instant::now());
        shared.metrics.inc_submitted();
        debug!(sink = %shared.name, task_id = id, "Upload task dispatched");

        let shared = Arc::clone(shared);
        self.handle.spawn(async move {
            run_task(&shared, id, record).await;
            shared.untrack(id);
            drop(permit);
        });
        Ok(id)
    }

    /// Stop accepting work and wait up to `grace` for in-flight tasks
    ///
    /// Tasks still running after `grace` are left to finish on their own.
    #[instrument(name = "upload_sink_shutdown", skip(self), fields(sink = %self.shared.name))]
    pub async fn shutdown(&self, grace: Duration) -> ShutdownReport {
        let deadline = tokio::time::Instant::now() + grace;
        let shared = &self.shared;
        shared.accepting.store(false, Ordering::Release);

        let all = u32::try_from(shared.capacity).unwrap_or(u32::MAX);
        let drained = match tokio::time::timeout_at(deadline, shared.permits.acquire_many(all)).await {
            Ok(Ok(permits)) => {
                permits.forget();
                shared.permits.close();
                true
            }
            // closed by an earlier shutdown
            Ok(Err(_)) => shared.tasks().is_empty(),
            Err(_) => false,
        };

        let abandoned: Vec<u64> = self.in_flight().iter().map(|t| t.id).collect();
        if drained {
            info!(metrics = %shared.metrics.snapshot(), "Upload sink drained");
        } else {
            warn!(
                abandoned = abandoned.len(),
                grace_ms = grace.as_millis() as u64,
                "Grace period elapsed with uploads in flight"
            );
        }

        // an abandoned delivery may still hold the transport; the sink is
        // polled at least once even when the grace period is spent
        match tokio::time::timeout_at(deadline, shared.sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Sink close failed"),
            Err(_) => warn!("Sink close still pending at end of grace period, left open"),
        }
        ShutdownReport { drained, abandoned }
    }
}

#[instrument(name = "upload_task", skip(shared, record), fields(sink = %shared.name, task_id = id))]
async fn run_task<S, F>(shared: &Shared<S>, id: u64, record: F)
where
    S: RecordSink + Sync,
    F: Future<Output = Result<CaptureRecord, ContractError>>,
{
    let started = Instant::now();
    let record = match record.await {
        Ok(record) => record,
        Err(e) => {
            shared.metrics.inc_failed();
            warn!(error = %e, "Record not produced, event skipped");
            shared.notify("Capture failed");
            return;
        }
    };

    let payload = UploadPayload::from(&record);
    let result = shared.sink.deliver(&payload).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    observability::record_upload(&shared.name, result.is_ok(), elapsed_ms);

    match result {
        Ok(()) => {
            shared.metrics.inc_delivered();
            info!(distance_m = record.distance_m, elapsed_ms, "Upload complete");
            shared.notify("Upload ok");
        }
        Err(e) => {
            shared.metrics.inc_failed();
            error!(error = %e, elapsed_ms, "Upload failed");
            shared.notify("Upload failed");
        }
    }
}
