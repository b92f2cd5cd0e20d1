//! Capture errors

use contracts::ContractError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera {camera} produced no frame")]
    NoFrame { camera: String },

    #[error("camera {camera} is busy with another capture")]
    Busy { camera: String },

    #[error("frame size mismatch: expected {expected} bytes, got {actual}")]
    BadFrame { expected: usize, actual: usize },

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error(transparent)]
    Device(#[from] ContractError),
}

impl From<CaptureError> for ContractError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Device(inner) => inner,
            CaptureError::NoFrame { ref camera } | CaptureError::Busy { ref camera } => {
                ContractError::capture(camera.clone(), err.to_string())
            }
            other => ContractError::capture("-", other.to_string()),
        }
    }
}
