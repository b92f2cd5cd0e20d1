//! Pipeline orchestrator - wires devices, the sensing loop and the upload pool.
//!
//! The sensing loop runs on its own OS thread so a slow upload or capture
//! never delays a reading. Uploads run on the tokio runtime that drives
//! this function.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actuators::{ActuatorDriver, CommandTable, ScreenGeometry};
use anyhow::{Context, Result};
use capture::{CapturePipeline, CaptureSettings};
use contracts::GuardBlueprint;
use dispatcher::{AlertDispatcher, UploadSink};
use monitor::{Monitor, MonitorConfig, ShutdownToken, ZoneClassifier};
use ranging::{PulseConfig, SystemClock, ThreadDelay};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The device configuration
    pub blueprint: GuardBlueprint,

    /// Maximum number of sensing cycles (None = unlimited)
    pub max_cycles: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Seed for simulated noise and dropouts
    pub seed: Option<u64>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the loop stops (cycle limit, timeout or `shutdown`), then drain uploads
    pub async fn run(self, shutdown: ShutdownToken) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Upload pool
        let sink = dispatcher::create_sink(&blueprint.upload)
            .await
            .context("Failed to create upload sink")?;
        let (notice_tx, notice_rx) = mpsc::channel(blueprint.display.notice_capacity);
        let uploads = Arc::new(
            UploadSink::from_config(sink, &blueprint.upload, Handle::current())
                .with_notices(notice_tx.clone()),
        );
        info!(
            sink = uploads.name(),
            capacity = uploads.capacity(),
            "Upload pool ready"
        );

        // Capture
        let camera = hardware::camera_from_config(&blueprint.capture);
        info!(camera = camera.id(), "Camera configured");
        let capture = Arc::new(CapturePipeline::new(
            camera,
            CaptureSettings::from(&blueprint.capture),
        ));
        let alerts = AlertDispatcher::new(Arc::clone(&uploads), capture).with_notices(notice_tx);

        // Sensing side
        info!(
            segments = blueprint.simulation.profile.len(),
            noise_m = blueprint.simulation.noise_m,
            dropout_rate = blueprint.simulation.dropout_rate,
            "Running against the simulated ranger"
        );
        let sensor = hardware::simulated_ranger(
            &blueprint.simulation,
            PulseConfig::from(&blueprint.sensing),
            ThreadDelay,
            SystemClock,
            self.config.seed,
        );
        let (led, buzzer, display) = hardware::simulated_outputs();
        let driver = ActuatorDriver::new(
            led,
            buzzer,
            display,
            CommandTable::new(blueprint.buzzer.clone()),
            ScreenGeometry::from(&blueprint.display),
        );
        let classifier = ZoneClassifier::from_config(&blueprint.zones, Instant::now());
        let monitor_config = MonitorConfig {
            max_cycles: self.config.max_cycles,
            ..MonitorConfig::from_blueprint(blueprint)
        };
        let mut monitor =
            Monitor::new(sensor, driver, classifier, alerts, monitor_config).with_notices(notice_rx);

        let loop_token = shutdown.clone();
        let sensing = std::thread::Builder::new()
            .name("sensing".to_string())
            .spawn(move || monitor.run(&loop_token))
            .map_err(|e| CliError::sensing_thread(e.to_string()))?;
        let mut join = tokio::task::spawn_blocking(move || sensing.join());

        let joined = match self.config.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, &mut join).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs(), "Run timed out");
                    shutdown.cancel();
                    join.await
                }
            },
            None => join.await,
        };
        let monitor_stats = joined
            .context("Failed to join the sensing thread")?
            .map_err(|_| CliError::sensing_thread("sensing loop panicked"))?;

        info!("Sensing stopped, draining uploads...");
        let report = uploads.shutdown(blueprint.upload.shutdown_grace()).await;

        let stats = PipelineStats {
            monitor: monitor_stats,
            uploads: uploads.metrics().snapshot(),
            shutdown: report,
            duration: start_time.elapsed(),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            drained = stats.shutdown.drained,
            "Guard shutdown complete"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ProfileSegment;

    fn fast_blueprint() -> GuardBlueprint {
        let mut bp = GuardBlueprint::default();
        bp.sensing.period_ms = 80;
        bp.sensing.echo_timeout_ms = 30;
        bp.zones.debounce_ms = 0;
        bp.capture.warmup_ms = 0;
        bp.upload.shutdown_grace_ms = 2000;
        bp.simulation.profile = vec![
            ProfileSegment {
                distance_m: Some(1.0),
                hold_ms: 200,
            },
            ProfileSegment {
                distance_m: Some(0.2),
                hold_ms: 10_000,
            },
        ];
        bp
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cycle_limit_run_uploads_once() {
        let config = PipelineConfig {
            blueprint: fast_blueprint(),
            max_cycles: Some(8),
            timeout: None,
            metrics_port: None,
            seed: Some(1),
        };

        let stats = Pipeline::new(config)
            .run(ShutdownToken::new())
            .await
            .unwrap();

        assert_eq!(stats.monitor.cycles, 8);
        assert_eq!(stats.monitor.critical_entries, 1);
        assert_eq!(stats.uploads.submitted, 1);
        assert_eq!(stats.uploads.delivered, 1);
        assert!(stats.shutdown.drained);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timeout_cancels_loop() {
        let config = PipelineConfig {
            blueprint: fast_blueprint(),
            max_cycles: None,
            timeout: Some(Duration::from_millis(500)),
            metrics_port: None,
            seed: Some(1),
        };

        let started = Instant::now();
        let stats = Pipeline::new(config)
            .run(ShutdownToken::new())
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(stats.monitor.cycles >= 1);
    }
}
