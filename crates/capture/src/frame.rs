//! Frame conversion, cropping and encoding

use std::io::Cursor;

use bytes::Bytes;
use contracts::{ImageData, ImageFormat};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, RgbImage, RgbaImage};

use crate::CaptureError;

/// Convert a raw frame into an RGB image
pub fn to_rgb_image(frame: &ImageData) -> Result<RgbImage, CaptureError> {
    let expected = frame.expected_len();
    if frame.data.len() != expected {
        return Err(CaptureError::BadFrame {
            expected,
            actual: frame.data.len(),
        });
    }
    let bad = || CaptureError::BadFrame {
        expected,
        actual: frame.data.len(),
    };

    match frame.format {
        ImageFormat::Rgb8 => RgbImage::from_raw(frame.width, frame.height, frame.data.to_vec()).ok_or_else(bad),
        ImageFormat::Rgba8 => {
            let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.data.to_vec())
                .ok_or_else(bad)?;
            Ok(DynamicImage::ImageRgba8(rgba).to_rgb8())
        }
        ImageFormat::Bgra8 => {
            let rgb: Vec<u8> = frame
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect();
            RgbImage::from_raw(frame.width, frame.height, rgb).ok_or_else(bad)
        }
    }
}

/// Largest centered square, side = min(width, height)
pub fn center_square(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let side = width.min(height);
    let x = (width - side) / 2;
    let y = (height - side) / 2;
    imageops::crop_imm(image, x, y, side, side).to_image()
}

/// JPEG bytes at `quality` (1-100)
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Bytes, CaptureError> {
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(image)?;
    Ok(Bytes::from(buf.into_inner()))
}
