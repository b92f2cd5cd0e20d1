//! Zone classification and debounce

use std::time::{Duration, Instant};

use contracts::{Zone, ZoneConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneThresholds {
    /// At or below: critical
    pub critical_m: f64,
    /// Below (and above critical): caution
    pub caution_m: f64,
}

impl From<&ZoneConfig> for ZoneThresholds {
    fn from(config: &ZoneConfig) -> Self {
        Self {
            critical_m: config.critical_m,
            caution_m: config.caution_m,
        }
    }
}

/// Debounce state
///
/// `pending_since` resets whenever `pending` changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneState {
    pub current: Zone,
    pub pending: Zone,
    pub pending_since: Instant,
}

/// Maps distances to zones and gates zone changes through a debounce window
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    thresholds: ZoneThresholds,
    debounce: Duration,
    state: ZoneState,
}

impl ZoneClassifier {
    /// Starts in `Safe` with the debounce clock at `start`
    pub fn new(thresholds: ZoneThresholds, debounce: Duration, start: Instant) -> Self {
        Self {
            thresholds,
            debounce,
            state: ZoneState {
                current: Zone::Safe,
                pending: Zone::Safe,
                pending_since: start,
            },
        }
    }

    pub fn from_config(config: &ZoneConfig, start: Instant) -> Self {
        Self::new(config.into(), config.debounce(), start)
    }

    /// Zone for a distance in meters
    ///
    /// NaN compares false against both thresholds and lands in `Safe`.
    pub fn classify(&self, distance_m: f64) -> Zone {
        if distance_m <= self.thresholds.critical_m {
            Zone::Critical
        } else if distance_m < self.thresholds.caution_m {
            Zone::Caution
        } else {
            Zone::Safe
        }
    }

    /// Feed a raw zone; returns the newly committed zone, if any
    pub fn update(&mut self, zone: Zone, now: Instant) -> Option<Zone> {
        let state = &mut self.state;
        if zone != state.pending {
            state.pending = zone;
            state.pending_since = now;
        }

        let held = now.saturating_duration_since(state.pending_since);
        if state.pending != state.current && held >= self.debounce {
            state.current = state.pending;
            return Some(state.current);
        }
        None
    }

    pub fn current(&self) -> Zone {
        self.state.current
    }

    pub fn state(&self) -> &ZoneState {
        &self.state
    }

    pub fn thresholds(&self) -> &ZoneThresholds {
        &self.thresholds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(t0: Instant) -> ZoneClassifier {
        ZoneClassifier::new(
            ZoneThresholds {
                critical_m: 0.30,
                caution_m: 0.60,
            },
            Duration::from_millis(100),
            t0,
        )
    }

    fn ms(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    #[test]
    fn test_classify_boundaries() {
        let c = classifier(Instant::now());
        assert_eq!(c.classify(0.0), Zone::Critical);
        assert_eq!(c.classify(0.30), Zone::Critical);
        assert_eq!(c.classify(0.3001), Zone::Caution);
        assert_eq!(c.classify(0.5999), Zone::Caution);
        assert_eq!(c.classify(0.60), Zone::Safe);
        assert_eq!(c.classify(4.0), Zone::Safe);
        assert_eq!(c.classify(f64::NAN), Zone::Safe);
    }

    #[test]
    fn test_classify_monotonic() {
        let c = classifier(Instant::now());
        let mut prev = c.classify(0.0);
        for step in 1..=500 {
            let zone = c.classify(step as f64 * 0.002);
            assert!(zone <= prev, "severity rose at {} m", step as f64 * 0.002);
            prev = zone;
        }
    }

    #[test]
    fn test_transient_is_suppressed() {
        let t0 = Instant::now();
        let mut c = classifier(t0);
        assert_eq!(c.update(Zone::Critical, ms(t0, 0)), None);
        assert_eq!(c.update(Zone::Critical, ms(t0, 60)), None);
        // back to safe before the window closed
        assert_eq!(c.update(Zone::Safe, ms(t0, 90)), None);
        assert_eq!(c.update(Zone::Safe, ms(t0, 500)), None);
        assert_eq!(c.current(), Zone::Safe);
    }

    #[test]
    fn test_pending_change_resets_window() {
        let t0 = Instant::now();
        let mut c = classifier(t0);
        c.update(Zone::Caution, ms(t0, 0));
        c.update(Zone::Critical, ms(t0, 80));
        assert_eq!(c.state().pending_since, ms(t0, 80));
        assert_eq!(c.update(Zone::Critical, ms(t0, 150)), None);
        assert_eq!(c.update(Zone::Critical, ms(t0, 180)), Some(Zone::Critical));
    }

    #[test]
    fn test_sustained_commits_once() {
        let t0 = Instant::now();
        let mut c = classifier(t0);
        let commits: Vec<_> = (0..20)
            .filter_map(|i| c.update(Zone::Caution, ms(t0, i * 30)))
            .collect();
        assert_eq!(commits, vec![Zone::Caution]);
    }

    #[test]
    fn test_three_close_readings_commit_on_third() {
        let t0 = Instant::now();
        let mut c = classifier(t0);
        let zone = c.classify(0.25);
        assert_eq!(c.update(zone, ms(t0, 0)), None);
        assert_eq!(c.update(zone, ms(t0, 50)), None);
        assert_eq!(c.update(zone, ms(t0, 100)), Some(Zone::Critical));
    }

    #[test]
    fn test_zero_debounce_commits_immediately() {
        let t0 = Instant::now();
        let mut c = ZoneClassifier::new(
            ZoneThresholds {
                critical_m: 0.30,
                caution_m: 0.60,
            },
            Duration::ZERO,
            t0,
        );
        assert_eq!(c.update(Zone::Caution, t0), Some(Zone::Caution));
        assert_eq!(c.update(Zone::Caution, t0), None);
    }
}
