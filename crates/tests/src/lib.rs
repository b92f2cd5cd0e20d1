//! # Integration Tests
//!
//! End-to-end runs across the workspace crates (no hardware required).
//!
//! - Config file → simulated ranger → monitor → capture → upload
//! - HTTP and stream transports against in-process collectors

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_default_blueprint_is_valid() {
        let bp = contracts::GuardBlueprint::default();
        assert_eq!(bp.version, contracts::ConfigVersion::V1);
        assert!(config_loader::ConfigLoader::validate(&bp).is_ok());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use actuators::{ActuatorDriver, CommandTable, ScreenGeometry};
    use capture::{CapturePipeline, CaptureSettings};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        AlertHandler, ContractError, GuardBlueprint, Measurement, RecordSink, SinkType,
        UploadPayload, Zone,
    };
    use dispatcher::{AlertDispatcher, UploadSink};
    use monitor::{Monitor, MonitorConfig, ZoneClassifier};
    use ranging::{PulseConfig, SteppingClock};
    use tokio::runtime::Handle;
    use tokio::sync::mpsc;

    const GUARD_TOML: &str = r#"
[zones]
critical_m = 0.30
caution_m = 0.60
debounce_ms = 100

[sensing]
period_ms = 100
echo_timeout_ms = 30

[capture]
warmup_ms = 0
image_size = 128

[capture.source]
kind = "synthetic"
width = 320
height = 240

[[simulation.profile]]
distance_m = 1.0
hold_ms = 1000

[[simulation.profile]]
distance_m = 0.2
hold_ms = 1000
"#;

    /// Keeps every delivered payload
    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<UploadPayload>>>);

    impl RecordSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn deliver(&self, payload: &UploadPayload) -> Result<(), ContractError> {
            self.0.lock().unwrap().push(payload.clone());
            Ok(())
        }

        async fn close(&self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    async fn settle<S: RecordSink + Sync + 'static>(uploads: &UploadSink<S>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !uploads.in_flight().is_empty() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Config file → simulated ranger → monitor → capture → upload
    ///
    /// The profile approaches the sensor twice; each approach must produce
    /// exactly one record, however long the obstacle stays close.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_simulated_approaches() {
        let bp = ConfigLoader::load_from_str(GUARD_TOML, ConfigFormat::Toml).unwrap();

        let sink = RecordingSink::default();
        let (notice_tx, notice_rx) = mpsc::channel(bp.display.notice_capacity);
        let uploads = Arc::new(
            UploadSink::from_config(sink.clone(), &bp.upload, Handle::current())
                .with_notices(notice_tx.clone()),
        );
        let capture = Arc::new(CapturePipeline::new(
            hardware::camera_from_config(&bp.capture),
            CaptureSettings::from(&bp.capture),
        ));
        let alerts = AlertDispatcher::new(Arc::clone(&uploads), capture).with_notices(notice_tx);

        let clock = SteppingClock::new(Instant::now(), Duration::from_micros(1));
        let sensor = hardware::simulated_ranger(
            &bp.simulation,
            PulseConfig::from(&bp.sensing),
            clock.clone(),
            clock.clone(),
            Some(42),
        );
        let (led, buzzer, display) = hardware::simulated_outputs();
        let driver = ActuatorDriver::new(
            led,
            buzzer,
            display,
            CommandTable::new(bp.buzzer.clone()),
            ScreenGeometry::from(&bp.display),
        );
        let classifier = ZoneClassifier::from_config(&bp.zones, clock.peek());
        let mut monitor = Monitor::new(
            sensor,
            driver,
            classifier,
            alerts,
            MonitorConfig::from_blueprint(&bp),
        )
        .with_notices(notice_rx);

        let mut zones = Vec::new();
        for _ in 0..40 {
            let outcome = monitor.tick(clock.peek());
            assert!(!outcome.timed_out);
            if let Some(zone) = outcome.committed {
                zones.push(zone);
            }
            if outcome.dispatched {
                // one capture at a time on the shared camera
                settle(&uploads).await;
            }
            clock.advance(bp.sensing.period());
        }

        let report = uploads.shutdown(Duration::from_secs(5)).await;
        assert!(report.drained);
        monitor.tick(clock.peek());

        assert_eq!(
            zones,
            vec![Zone::Critical, Zone::Safe, Zone::Critical],
            "profile starts safe and approaches twice"
        );
        assert_eq!(monitor.stats().critical_entries, 2);
        assert_eq!(monitor.stats().notices, 2);

        let delivered = sink.0.lock().unwrap().clone();
        assert_eq!(delivered.len(), 2);
        for payload in &delivered {
            assert!((payload.distance_m - 0.2).abs() < 0.01, "got {}", payload.distance_m);
            assert_eq!(payload.camera, "USB");
            assert_eq!(payload.date.len(), "DD/MM/YYYY".len());
            assert_eq!(payload.time.len(), "HH:MM:SS".len());

            let jpeg = payload.decode_image().unwrap();
            let img = image::load_from_memory(&jpeg).unwrap();
            assert_eq!((img.width(), img.height()), (128, 128));
        }

        monitor.stop();
        assert_eq!(
            monitor.driver().current_frame().and_then(|f| f.first()).map(String::as_str),
            Some("Stopped")
        );
    }

    /// A camera that needs seconds to warm up must not stretch any tick
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_slow_capture_keeps_tick_cadence() {
        let toml = GUARD_TOML.replace("warmup_ms = 0", "warmup_ms = 2000");
        let bp = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();

        let sink = RecordingSink::default();
        let uploads = Arc::new(UploadSink::from_config(sink.clone(), &bp.upload, Handle::current()));
        let capture = Arc::new(CapturePipeline::new(
            hardware::camera_from_config(&bp.capture),
            CaptureSettings::from(&bp.capture),
        ));
        let alerts = AlertDispatcher::new(Arc::clone(&uploads), capture);

        let clock = SteppingClock::new(Instant::now(), Duration::from_micros(1));
        let sensor = hardware::simulated_ranger(
            &bp.simulation,
            PulseConfig::from(&bp.sensing),
            clock.clone(),
            clock.clone(),
            Some(7),
        );
        let (led, buzzer, display) = hardware::simulated_outputs();
        let driver = ActuatorDriver::new(
            led,
            buzzer,
            display,
            CommandTable::new(bp.buzzer.clone()),
            ScreenGeometry::from(&bp.display),
        );
        let classifier = ZoneClassifier::from_config(&bp.zones, clock.peek());
        let mut monitor = Monitor::new(
            sensor,
            driver,
            classifier,
            alerts,
            MonitorConfig::from_blueprint(&bp),
        );

        let mut dispatched = 0;
        for _ in 0..20 {
            let started = Instant::now();
            let outcome = monitor.tick(clock.peek());
            assert!(
                started.elapsed() < bp.sensing.period(),
                "tick took {:?}",
                started.elapsed()
            );
            if outcome.dispatched {
                dispatched += 1;
                assert!(sink.0.lock().unwrap().is_empty(), "capture ran inline");
            }
            clock.advance(bp.sensing.period());
        }
        assert_eq!(dispatched, 1);

        let report = uploads.shutdown(Duration::from_secs(10)).await;
        assert!(report.drained);
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    mod http {
        use super::*;
        use axum::http::StatusCode;
        use axum::routing::post;
        use axum::{Json, Router};
        use serde_json::{json, Value};

        type Received = Arc<Mutex<Vec<UploadPayload>>>;

        async fn spawn_collector(accept: bool) -> (String, Received) {
            let received: Received = Arc::default();
            let store = Arc::clone(&received);
            let app = Router::new().route(
                "/upload",
                post(move |Json(payload): Json<UploadPayload>| {
                    let store = Arc::clone(&store);
                    async move {
                        if !accept {
                            return (
                                StatusCode::BAD_REQUEST,
                                Json(json!({"error": "collector full"})),
                            );
                        }
                        store.lock().unwrap().push(payload);
                        (StatusCode::OK, Json(json!({"status": "ok"})))
                    }
                }),
            );

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            (format!("http://{}/upload", addr), received)
        }

        fn blueprint(url: &str) -> GuardBlueprint {
            let mut bp = GuardBlueprint::default();
            bp.capture.warmup_ms = 0;
            bp.upload.sink_type = SinkType::Http;
            bp.upload.params.insert("url".to_string(), url.to_string());
            ConfigLoader::validate(&bp).unwrap();
            bp
        }

        async fn alert_once(
            bp: &GuardBlueprint,
        ) -> (mpsc::Receiver<contracts::Notice>, dispatcher::MetricsSnapshot) {
            let sink = dispatcher::create_sink(&bp.upload).await.unwrap();
            let (tx, rx) = mpsc::channel(8);
            let uploads = Arc::new(
                UploadSink::from_config(sink, &bp.upload, Handle::current())
                    .with_notices(tx.clone()),
            );
            let capture = Arc::new(CapturePipeline::new(
                hardware::camera_from_config(&bp.capture),
                CaptureSettings::from(&bp.capture),
            ));
            let alerts = AlertDispatcher::new(Arc::clone(&uploads), capture).with_notices(tx);

            alerts.on_critical_entry(Measurement::new(0.22, Instant::now()));
            let report = uploads.shutdown(Duration::from_secs(10)).await;
            assert!(report.drained);
            (rx, uploads.metrics().snapshot())
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn test_e2e_http_collector_receives_photo() {
            let (url, received) = spawn_collector(true).await;
            let (mut notices, metrics) = alert_once(&blueprint(&url)).await;

            assert_eq!(metrics.delivered, 1);
            assert_eq!(notices.try_recv().unwrap().text, "Upload ok");

            let payloads = received.lock().unwrap().clone();
            assert_eq!(payloads.len(), 1);
            assert_eq!(payloads[0].distance_m, 0.22);
            assert_eq!(payloads[0].camera, "USB");
            let img = image::load_from_memory(&payloads[0].decode_image().unwrap()).unwrap();
            assert_eq!((img.width(), img.height()), (256, 256));
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn test_e2e_http_rejection_is_contained() {
            let (url, received) = spawn_collector(false).await;
            let (mut notices, metrics) = alert_once(&blueprint(&url)).await;

            assert_eq!(metrics.delivered, 0);
            assert_eq!(metrics.failed, 1);
            assert_eq!(notices.try_recv().unwrap().text, "Upload failed");
            assert!(received.lock().unwrap().is_empty());
        }

        #[test]
        fn test_collector_json_shape() {
            let payload: UploadPayload = serde_json::from_value(json!({
                "distance_m": 0.25,
                "date": "14/10/2026",
                "time": "09:15:00",
                "camera": "USB",
                "image_b64": "/9j/"
            }))
            .unwrap();
            let value: Value = serde_json::to_value(&payload).unwrap();
            assert_eq!(value["camera"], "USB");
        }
    }

    mod stream {
        use super::*;
        use tokio::io::AsyncReadExt;

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn test_e2e_stream_sink_writes_ndjson() {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let reader = tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut text = String::new();
                socket.read_to_string(&mut text).await.unwrap();
                text
            });

            let mut bp = GuardBlueprint::default();
            bp.capture.warmup_ms = 0;
            bp.upload.sink_type = SinkType::Stream;
            bp.upload.params.insert("addr".to_string(), addr.to_string());

            let sink = dispatcher::create_sink(&bp.upload).await.unwrap();
            let uploads = Arc::new(UploadSink::from_config(sink, &bp.upload, Handle::current()));
            let capture = Arc::new(CapturePipeline::new(
                hardware::camera_from_config(&bp.capture),
                CaptureSettings::from(&bp.capture),
            ));
            let alerts = AlertDispatcher::new(Arc::clone(&uploads), capture);

            alerts.on_critical_entry(Measurement::new(0.18, Instant::now()));
            assert!(uploads.shutdown(Duration::from_secs(10)).await.drained);

            let text = tokio::time::timeout(Duration::from_secs(5), reader)
                .await
                .unwrap()
                .unwrap();
            let lines: Vec<&str> = text.lines().collect();
            assert_eq!(lines.len(), 1);
            let payload: UploadPayload = serde_json::from_str(lines[0]).unwrap();
            assert_eq!(payload.distance_m, 0.18);
            assert!(!payload.decode_image().unwrap().is_empty());
        }
    }
}
