//! Camera sources

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use contracts::{
    CameraDevice, CameraSource, CameraSourceConfig, CaptureConfig, ContractError, ImageData,
    ImageFormat,
};
use tracing::debug;

/// Build the configured camera source
pub fn camera_from_config(config: &CaptureConfig) -> Arc<dyn CameraSource> {
    match &config.source {
        CameraSourceConfig::Synthetic { width, height } => {
            Arc::new(SyntheticCamera::new("synthetic", *width, *height))
        }
        CameraSourceConfig::File { path } => Arc::new(FileCamera::new("file", path.clone())),
    }
}

/// Procedural BGRA test pattern; each frame shifts the gradient
pub struct SyntheticCamera {
    id: String,
    width: u32,
    height: u32,
    frames: Arc<AtomicU64>,
}

impl SyntheticCamera {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            frames: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Frames produced so far
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

struct SyntheticDevice {
    width: u32,
    height: u32,
    frames: Arc<AtomicU64>,
}

impl CameraSource for SyntheticCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn open(&self) -> Result<Box<dyn CameraDevice>, ContractError> {
        Ok(Box::new(SyntheticDevice {
            width: self.width,
            height: self.height,
            frames: Arc::clone(&self.frames),
        }))
    }
}

impl CameraDevice for SyntheticDevice {
    fn read_frame(&mut self) -> Result<Option<ImageData>, ContractError> {
        let shift = self.frames.fetch_add(1, Ordering::Relaxed) as u32;
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                let b = ((x + shift) % self.width.max(1) * 255 / self.width.max(1)) as u8;
                let g = (y * 255 / self.height.max(1)) as u8;
                let r = if (x / 32 + y / 32) % 2 == 0 { 200 } else { 40 };
                data.extend_from_slice(&[b, g, r, 255]);
            }
        }
        Ok(Some(ImageData {
            width: self.width,
            height: self.height,
            format: ImageFormat::Bgra8,
            data: Bytes::from(data),
        }))
    }
}

/// Still image decoded from disk on every read
pub struct FileCamera {
    id: String,
    path: PathBuf,
}

impl FileCamera {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

struct FileDevice {
    id: String,
    path: PathBuf,
}

impl CameraSource for FileCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn open(&self) -> Result<Box<dyn CameraDevice>, ContractError> {
        if !self.path.is_file() {
            return Err(ContractError::capture(
                &self.id,
                format!("no image at {}", self.path.display()),
            ));
        }
        Ok(Box::new(FileDevice {
            id: self.id.clone(),
            path: self.path.clone(),
        }))
    }
}

impl CameraDevice for FileDevice {
    fn read_frame(&mut self) -> Result<Option<ImageData>, ContractError> {
        let decoded = image::open(&self.path)
            .map_err(|e| ContractError::capture(&self.id, e.to_string()))?
            .to_rgb8();
        debug!(path = %self.path.display(), width = decoded.width(), height = decoded.height(), "Frame decoded");
        Ok(Some(ImageData {
            width: decoded.width(),
            height: decoded.height(),
            format: ImageFormat::Rgb8,
            data: Bytes::from(decoded.into_raw()),
        }))
    }
}
