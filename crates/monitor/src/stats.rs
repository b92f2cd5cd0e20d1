//! Loop counters

use observability::RunningStats;

/// Counters returned when the sensing loop stops
#[derive(Debug, Clone, Default)]
pub struct MonitorStats {
    pub cycles: u64,
    pub readings: u64,
    pub timeouts: u64,
    pub gpio_faults: u64,
    pub actuator_faults: u64,
    pub transitions: u64,
    pub critical_entries: u64,
    pub notices: u64,
    /// Distance in meters over all readings
    pub distance: RunningStats,
}

impl MonitorStats {
    pub fn timeout_rate(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.timeouts as f64 / self.cycles as f64 * 100.0
        }
    }
}

impl std::fmt::Display for MonitorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Monitor Summary ===")?;
        writeln!(f, "Cycles: {}", self.cycles)?;
        writeln!(f, "Readings: {}", self.readings)?;
        writeln!(
            f,
            "Sensor timeouts: {} ({:.2}%)",
            self.timeouts,
            self.timeout_rate()
        )?;
        writeln!(f, "GPIO faults: {}", self.gpio_faults)?;
        writeln!(f, "Actuator faults: {}", self.actuator_faults)?;
        writeln!(f, "Zone transitions: {}", self.transitions)?;
        writeln!(f, "Critical entries: {}", self.critical_entries)?;
        writeln!(f, "Notices shown: {}", self.notices)?;
        writeln!(f, "Distance (m): {}", self.distance.summary())
    }
}
