//! # Ranging
//!
//! Ultrasonic time-of-flight ranging.
//!
//! Responsibilities:
//! - Drive the trigger line (low, ~10µs high, low)
//! - Time the echo pulse with a bounded busy-wait on each edge
//! - Convert the round trip to meters
//!
//! The timer is generic over `embedded-hal` pins and a [`MonotonicClock`],
//! so the same code runs against real GPIO, the simulated pins in the
//! `hardware` crate, or a [`SteppingClock`] in tests.

mod clock;
mod error;
mod pulse_timer;

pub use clock::{MonotonicClock, SteppingClock, SystemClock, ThreadDelay};
pub use error::RangingError;
pub use pulse_timer::{PulseConfig, PulseTimer};
