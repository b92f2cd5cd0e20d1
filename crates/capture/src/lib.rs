//! # Capture
//!
//! One-shot photo capture for critical-zone entries.
//!
//! Opens the camera, waits for warm-up, reads a single frame, center-crops it
//! to a square, resizes and JPEG-encodes it. Everything here blocks; callers
//! run it on a blocking worker.

mod error;
mod frame;
mod pipeline;

pub use error::CaptureError;
pub use frame::{center_square, encode_jpeg, to_rgb_image};
pub use pipeline::{CapturePipeline, CaptureSettings};
