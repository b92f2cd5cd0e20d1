//! # Actuators
//!
//! Zone → output mapping and the single driver touching the outputs.
//!
//! Responsibilities:
//! - Derive an `ActuatorCommand` purely from the committed zone
//! - Play buzzer patterns as timed steps advanced once per tick
//! - Compose display frames (zone lines, latest distance, notice)
//! - Adapt `embedded-hal` output pins to the LED and buzzer traits

mod command;
mod driver;
mod pins;
mod screen;
mod sequencer;

pub use command::CommandTable;
pub use driver::ActuatorDriver;
pub use pins::{PinBuzzer, RgbLed};
pub use screen::{compose_frame, ScreenGeometry};
pub use sequencer::BuzzerSequencer;
