//! Measurement / Zone - ranging output and classification levels

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// One distance reading taken by the range sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Distance to the nearest obstacle (meters, >= 0)
    pub distance_m: f64,

    /// Monotonic instant at which the echo completed
    pub timestamp: Instant,
}

impl Measurement {
    /// Create a measurement taken at `timestamp`
    pub fn new(distance_m: f64, timestamp: Instant) -> Self {
        Self {
            distance_m,
            timestamp,
        }
    }

    /// Distance in centimeters (display unit)
    pub fn distance_cm(&self) -> f64 {
        self.distance_m * 100.0
    }
}

/// Proximity zone, ordered by severity
///
/// `Critical > Caution > Safe` under `Ord`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    #[default]
    Safe,
    Caution,
    Critical,
}

impl Zone {
    /// All zones from least to most severe
    pub const ALL: [Zone; 3] = [Zone::Safe, Zone::Caution, Zone::Critical];

    /// Stable label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Caution => "caution",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
