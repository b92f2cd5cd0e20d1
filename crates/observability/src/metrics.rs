//! Guard metrics
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! every call is a no-op.

use contracts::{Measurement, Zone};
use metrics::{counter, gauge, histogram};

/// One successful reading
pub fn record_reading(measurement: &Measurement) {
    counter!("proximity_guard_readings_total").increment(1);
    gauge!("proximity_guard_distance_cm").set(measurement.distance_cm());
    histogram!("proximity_guard_distance_cm_hist").record(measurement.distance_cm());
}

/// A reading that failed (`kind` is "timeout" or "gpio")
pub fn record_sensor_fault(kind: &'static str) {
    counter!("proximity_guard_sensor_faults_total", "kind" => kind).increment(1);
}

/// Committed zone change
pub fn record_zone_transition(from: Zone, to: Zone) {
    counter!(
        "proximity_guard_zone_transitions_total",
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    gauge!("proximity_guard_zone_severity").set(to as u8 as f64);
}

/// Camera capture attempt
pub fn record_capture(success: bool, elapsed_ms: f64) {
    let status = if success { "success" } else { "failure" };
    counter!("proximity_guard_captures_total", "status" => status).increment(1);
    if success {
        histogram!("proximity_guard_capture_ms").record(elapsed_ms);
    }
}

/// Finished upload
pub fn record_upload(sink_name: &str, success: bool, elapsed_ms: f64) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "proximity_guard_uploads_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!("proximity_guard_upload_ms", "sink" => sink_name.to_string()).record(elapsed_ms);
}

/// Submission rejected because the pool was exhausted or closed
pub fn record_upload_dropped(sink_name: &str) {
    counter!("proximity_guard_uploads_dropped_total", "sink" => sink_name.to_string()).increment(1);
}

pub fn set_uploads_in_flight(sink_name: &str, in_flight: usize) {
    gauge!("proximity_guard_uploads_in_flight", "sink" => sink_name.to_string())
        .set(in_flight as f64);
}

/// Summary of a `RunningStats`
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
