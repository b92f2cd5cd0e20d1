//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace: the
//! proximity data model, the error taxonomy, the configuration blueprint and
//! the traits behind which hardware and transports live.
//! Business crates depend on this crate, never the other way around.
//!
//! ## Time Model
//! - Sensing uses `std::time::Instant` (monotonic) for debounce and cadence
//! - Wall-clock date/time only appears in `CaptureRecord` for the collector

mod actuation;
mod blueprint;
mod devices;
mod error;
mod measurement;
mod notice;
mod record;
mod sink;

pub use actuation::*;
pub use blueprint::*;
pub use devices::*;
pub use error::*;
pub use measurement::*;
pub use notice::*;
pub use record::*;
pub use sink::*;
