//! # Monitor
//!
//! Zone classification with debounce and the periodic sensing loop.
//!
//! The loop runs on a dedicated thread, owns the sensor and the actuator
//! driver, and hands critical-zone entries to an `AlertHandler` that must
//! return immediately.

mod engine;
mod notices;
mod shutdown;
mod stats;
mod zone;

pub use engine::{Monitor, MonitorConfig, Phase, TickOutcome};
pub use notices::NoticeBoard;
pub use shutdown::ShutdownToken;
pub use stats::MonitorStats;
pub use zone::{ZoneClassifier, ZoneState, ZoneThresholds};
