//! Run statistics.

use std::time::Duration;

use dispatcher::{MetricsSnapshot, ShutdownReport};
use monitor::MonitorStats;

/// Statistics from a guard run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Sensing loop counters
    pub monitor: MonitorStats,

    /// Upload pool counters at shutdown
    pub uploads: MetricsSnapshot,

    /// How the pool drained
    pub shutdown: ShutdownReport,

    /// Total duration of the run
    pub duration: Duration,
}

impl PipelineStats {
    /// Sensing cycles per second
    pub fn cycle_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.monitor.cycles as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of submitted uploads that reached the sink, as percentage
    pub fn delivery_rate(&self) -> f64 {
        if self.uploads.submitted > 0 {
            (self.uploads.delivered as f64 / self.uploads.submitted as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Guard Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        let m = &self.monitor;
        println!("📊 Sensing");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Cycles: {} ({:.2}/s)", m.cycles, self.cycle_rate());
        println!("   ├─ Readings: {}", m.readings);
        println!(
            "   ├─ Timeouts: {} ({:.2}%)",
            m.timeouts,
            m.timeout_rate()
        );
        println!("   ├─ GPIO faults: {}", m.gpio_faults);
        println!("   ├─ Actuator faults: {}", m.actuator_faults);
        println!("   ├─ Zone transitions: {}", m.transitions);
        println!("   ├─ Critical entries: {}", m.critical_entries);
        println!("   └─ Distance (m): {}", m.distance.summary());

        let u = &self.uploads;
        println!("\n📤 Uploads");
        println!("   ├─ Submitted: {}", u.submitted);
        println!(
            "   ├─ Delivered: {} ({:.2}%)",
            u.delivered,
            self.delivery_rate()
        );
        println!("   ├─ Failed: {}", u.failed);
        println!("   ├─ Dropped: {}", u.dropped);
        if self.shutdown.drained {
            println!("   └─ Drained on shutdown");
        } else {
            println!(
                "   └─ Abandoned on shutdown: {:?}",
                self.shutdown.abandoned
            );
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let stats = PipelineStats {
            monitor: MonitorStats {
                cycles: 20,
                ..Default::default()
            },
            uploads: MetricsSnapshot {
                submitted: 4,
                delivered: 3,
                ..Default::default()
            },
            shutdown: ShutdownReport::default(),
            duration: Duration::from_secs(10),
        };
        assert!((stats.cycle_rate() - 2.0).abs() < 1e-9);
        assert!((stats.delivery_rate() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_rates_without_activity() {
        let stats = PipelineStats {
            monitor: MonitorStats::default(),
            uploads: MetricsSnapshot::default(),
            shutdown: ShutdownReport::default(),
            duration: Duration::ZERO,
        };
        assert_eq!(stats.cycle_rate(), 0.0);
        assert_eq!(stats.delivery_rate(), 0.0);
    }
}
