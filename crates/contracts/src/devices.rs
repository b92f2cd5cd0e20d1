//! Device traits - seams between the core and concrete hardware
//!
//! The core never touches a device directly. Real GPIO, camera and LCD
//! bindings live outside the workspace; the `hardware` crate provides
//! simulated implementations.

use crate::{ContractError, ImageData, Measurement, Rgb};

/// Distance source polled once per sensing cycle
pub trait RangeSensor {
    /// Take one reading
    ///
    /// # Errors
    /// `SensorTimeout` when no echo arrived within the bounded wait,
    /// `GpioFault` when a line could not be driven or read.
    fn measure(&mut self) -> Result<Measurement, ContractError>;
}

/// RGB indicator LED
pub trait Led {
    fn set(&mut self, color: Rgb) -> Result<(), ContractError>;
}

/// Tone generator
pub trait Buzzer {
    fn tone(&mut self, frequency_hz: u32) -> Result<(), ContractError>;

    fn silence(&mut self) -> Result<(), ContractError>;
}

/// Character display
pub trait TextDisplay {
    /// Replace the whole screen with `lines` (top to bottom)
    fn render(&mut self, lines: &[String]) -> Result<(), ContractError>;
}

/// Camera that can be opened on demand
///
/// Shared between concurrent capture tasks.
pub trait CameraSource: Send + Sync {
    /// Camera identifier reported in records
    fn id(&self) -> &str;

    /// Open the device for a single capture
    ///
    /// # Errors
    /// `CaptureFailure` when the device is missing or busy.
    fn open(&self) -> Result<Box<dyn CameraDevice>, ContractError>;
}

/// An opened camera device; dropping it releases the device
pub trait CameraDevice: Send {
    /// Read one frame, `None` when the device produced nothing
    fn read_frame(&mut self) -> Result<Option<ImageData>, ContractError>;

    /// Release the device explicitly
    fn close(&mut self) {}
}

/// Reaction to a committed transition into the critical zone
///
/// Called from the sensing loop; implementations must return immediately
/// and do their work elsewhere.
pub trait AlertHandler: Send + Sync {
    fn on_critical_entry(&self, measurement: Measurement);
}

impl<T: AlertHandler + ?Sized> AlertHandler for std::sync::Arc<T> {
    fn on_critical_entry(&self, measurement: Measurement) {
        (**self).on_critical_entry(measurement);
    }
}
