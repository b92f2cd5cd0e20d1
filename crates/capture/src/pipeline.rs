//! CapturePipeline

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::Local;
use contracts::{CameraSource, CaptureConfig, CaptureRecord, Measurement};
use image::imageops::{self, FilterType};
use tracing::{debug, instrument, warn};

use crate::{center_square, encode_jpeg, to_rgb_image, CaptureError};

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Reported in records
    pub camera_id: String,
    pub image_size: u32,
    pub warmup: Duration,
    pub jpeg_quality: u8,
}

impl From<&CaptureConfig> for CaptureSettings {
    fn from(config: &CaptureConfig) -> Self {
        Self {
            camera_id: config.camera_id.clone(),
            image_size: config.image_size,
            warmup: config.warmup(),
            jpeg_quality: config.jpeg_quality,
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self::from(&CaptureConfig::default())
    }
}

/// Single-frame capture from a shared camera source
///
/// Only one capture runs at a time per pipeline; a concurrent attempt fails
/// with `Busy` instead of queueing behind the device.
pub struct CapturePipeline {
    source: Arc<dyn CameraSource>,
    settings: CaptureSettings,
    busy: AtomicBool,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CapturePipeline {
    pub fn new(source: Arc<dyn CameraSource>, settings: CaptureSettings) -> Self {
        Self {
            source,
            settings,
            busy: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Capture one `size × size` JPEG
    #[instrument(name = "capture", skip(self), fields(camera = self.source.id()))]
    pub fn capture(&self, size: u32) -> Result<Bytes, CaptureError> {
        let camera = self.source.id().to_string();
        let _guard = self.claim(&camera)?;
        let started = Instant::now();

        let result = self.grab_and_encode(&camera, size);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        observability::record_capture(result.is_ok(), elapsed_ms);
        match &result {
            Ok(jpeg) => debug!(bytes = jpeg.len(), elapsed_ms, "Captured"),
            Err(e) => warn!(error = %e, "Capture failed"),
        }
        result
    }

    /// Capture and stamp with the local wall-clock date and time
    pub fn record(&self, measurement: &Measurement) -> Result<CaptureRecord, CaptureError> {
        let image = self.capture(self.settings.image_size)?;
        let now = Local::now();
        Ok(CaptureRecord {
            distance_m: measurement.distance_m,
            date: now.format("%d/%m/%Y").to_string(),
            time: now.format("%H:%M:%S").to_string(),
            camera_id: self.settings.camera_id.clone(),
            image,
        })
    }

    fn claim(&self, camera: &str) -> Result<BusyGuard<'_>, CaptureError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| CaptureError::Busy {
                camera: camera.to_string(),
            })
    }

    fn grab_and_encode(&self, camera: &str, size: u32) -> Result<Bytes, CaptureError> {
        let mut device = self.source.open()?;
        if !self.settings.warmup.is_zero() {
            std::thread::sleep(self.settings.warmup);
        }
        let frame = device.read_frame();
        device.close();

        let frame = frame?.ok_or_else(|| CaptureError::NoFrame {
            camera: camera.to_string(),
        })?;
        let square = center_square(&to_rgb_image(&frame)?);
        let resized = imageops::resize(&square, size, size, FilterType::Lanczos3);
        encode_jpeg(&resized, self.settings.jpeg_quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CameraDevice, ContractError, ImageData, ImageFormat};

    struct TestCamera {
        frame: Option<(u32, u32)>,
    }

    struct TestDevice {
        frame: Option<(u32, u32)>,
    }

    impl CameraSource for TestCamera {
        fn id(&self) -> &str {
            "test-cam"
        }

        fn open(&self) -> Result<Box<dyn CameraDevice>, ContractError> {
            Ok(Box::new(TestDevice { frame: self.frame }))
        }
    }

    impl CameraDevice for TestDevice {
        fn read_frame(&mut self) -> Result<Option<ImageData>, ContractError> {
            Ok(self.frame.map(|(width, height)| ImageData {
                width,
                height,
                format: ImageFormat::Rgb8,
                data: Bytes::from(vec![128u8; (width * height * 3) as usize]),
            }))
        }
    }

    struct MissingCamera;

    impl CameraSource for MissingCamera {
        fn id(&self) -> &str {
            "gone"
        }

        fn open(&self) -> Result<Box<dyn CameraDevice>, ContractError> {
            Err(ContractError::capture("gone", "no such device"))
        }
    }

    fn pipeline(source: impl CameraSource + 'static, warmup_ms: u64) -> CapturePipeline {
        CapturePipeline::new(
            Arc::new(source),
            CaptureSettings {
                warmup: Duration::from_millis(warmup_ms),
                ..CaptureSettings::default()
            },
        )
    }

    #[test]
    fn test_output_is_square_jpeg() {
        let p = pipeline(TestCamera { frame: Some((640, 480)) }, 0);
        let jpeg = p.capture(256).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (256, 256));
    }

    #[test]
    fn test_no_frame_is_failure() {
        let p = pipeline(TestCamera { frame: None }, 0);
        let err = p.capture(256).unwrap_err();
        assert!(matches!(err, CaptureError::NoFrame { .. }));
        assert!(matches!(
            ContractError::from(err),
            ContractError::CaptureFailure { ref camera, .. } if camera == "test-cam"
        ));
    }

    #[test]
    fn test_open_failure_passes_through() {
        let p = pipeline(MissingCamera, 0);
        assert!(matches!(
            p.capture(64),
            Err(CaptureError::Device(ContractError::CaptureFailure { .. }))
        ));
    }

    #[test]
    fn test_concurrent_capture_is_busy() {
        let p = Arc::new(pipeline(TestCamera { frame: Some((64, 48)) }, 400));
        let first = {
            let p = Arc::clone(&p);
            std::thread::spawn(move || p.capture(32))
        };
        std::thread::sleep(Duration::from_millis(100));

        assert!(matches!(p.capture(32), Err(CaptureError::Busy { .. })));
        assert!(first.join().unwrap().is_ok());
        // released afterwards
        assert!(p.capture(32).is_ok());
    }

    #[test]
    fn test_record_fields() {
        let p = pipeline(TestCamera { frame: Some((300, 200)) }, 0);
        let record = p.record(&Measurement::new(0.22, Instant::now())).unwrap();
        assert_eq!(record.camera_id, "USB");
        assert_eq!(record.distance_m, 0.22);
        assert_eq!(record.date.len(), 10);
        assert_eq!(&record.date[2..3], "/");
        assert_eq!(record.time.len(), 8);
        assert_eq!(&record.time[2..3], ":");
    }
}
