//! CaptureRecord - CapturePipeline output, UploadSink input
//!
//! Raw camera frames, the packaged record, and its wire form.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Raw camera frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    /// Frame width
    pub width: u32,

    /// Frame height
    pub height: u32,

    /// Pixel format
    pub format: ImageFormat,

    /// Packed pixel data, row-major
    pub data: Bytes,
}

impl ImageData {
    /// Expected byte length for `width × height` pixels in `format`
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Pixel format of a raw frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Rgb8,
    Rgba8,
    Bgra8,
}

impl ImageFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }
}

/// Telemetry + photo for one critical-zone entry
///
/// Created once per entry event and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRecord {
    /// Distance that triggered the capture (meters)
    pub distance_m: f64,

    /// Local date, `DD/MM/YYYY`
    pub date: String,

    /// Local time, `HH:MM:SS`
    pub time: String,

    /// Camera identifier reported to the collector
    pub camera_id: String,

    /// JPEG-encoded image
    pub image: Bytes,
}

/// Wire message sent to the collector (one JSON document per event)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadPayload {
    pub distance_m: f64,
    pub date: String,
    pub time: String,
    pub camera: String,
    pub image_b64: String,
}

impl UploadPayload {
    /// Decode `image_b64` back into JPEG bytes
    pub fn decode_image(&self) -> Result<Vec<u8>, ContractError> {
        STANDARD
            .decode(&self.image_b64)
            .map_err(|e| ContractError::Other(format!("invalid image_b64: {e}")))
    }
}

impl From<&CaptureRecord> for UploadPayload {
    fn from(record: &CaptureRecord) -> Self {
        Self {
            distance_m: record.distance_m,
            date: record.date.clone(),
            time: record.time.clone(),
            camera: record.camera_id.clone(),
            image_b64: STANDARD.encode(&record.image),
        }
    }
}

/// Collector acknowledgement body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectorReply {
    /// HTTP 200 `{ "status": "ok" }`
    Ack { status: String },
    /// HTTP 4xx `{ "error": "..." }`
    Rejected { error: String },
}
