//! PulseTimer - trigger/echo time-of-flight measurement

use std::time::{Duration, Instant};

use contracts::{ContractError, EchoEdge, Measurement, RangeSensor, SensingConfig};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, InputPin, OutputPin};
use tracing::{instrument, trace};

use crate::clock::MonotonicClock;
use crate::error::RangingError;

/// Pulse timing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseConfig {
    /// Trigger high time
    pub trigger_pulse: Duration,
    /// Trigger low time before the pulse
    pub settle: Duration,
    /// Bound on each echo edge wait
    pub echo_timeout: Duration,
    /// Speed of sound (m/s)
    pub speed_of_sound_m_s: f64,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self::from(&SensingConfig::default())
    }
}

impl From<&SensingConfig> for PulseConfig {
    fn from(config: &SensingConfig) -> Self {
        Self {
            trigger_pulse: Duration::from_micros(u64::from(config.trigger_pulse_us)),
            settle: Duration::from_micros(u64::from(config.settle_us)),
            echo_timeout: config.echo_timeout(),
            speed_of_sound_m_s: config.speed_of_sound_m_s,
        }
    }
}

/// Ultrasonic range finder over a trigger output and an echo input
pub struct PulseTimer<T, E, D, C> {
    trigger: T,
    echo: E,
    delay: D,
    clock: C,
    config: PulseConfig,
}

impl<T, E, D, C> PulseTimer<T, E, D, C>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    C: MonotonicClock,
{
    pub fn new(trigger: T, echo: E, delay: D, clock: C, config: PulseConfig) -> Self {
        Self {
            trigger,
            echo,
            delay,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &PulseConfig {
        &self.config
    }

    /// One-way distance for an echo round trip
    pub fn round_trip_to_meters(&self, round_trip: Duration) -> f64 {
        round_trip.as_secs_f64() * self.config.speed_of_sound_m_s / 2.0
    }

    /// Fire one pulse and time its echo
    ///
    /// Each edge wait is bounded by `echo_timeout`; a missing echo returns
    /// `RangingError::Timeout` instead of blocking.
    #[instrument(name = "pulse_timer_measure", skip(self), level = "trace")]
    pub fn measure(&mut self) -> Result<Measurement, RangingError> {
        self.fire()?;

        let pulse_start = self.wait_for_level(true, EchoEdge::Rising, self.clock.now())?;
        let pulse_end = self.wait_for_level(false, EchoEdge::Falling, pulse_start)?;

        let round_trip = pulse_end.duration_since(pulse_start);
        let distance_m = self.round_trip_to_meters(round_trip);
        trace!(round_trip_us = round_trip.as_micros() as u64, distance_m, "echo timed");

        Ok(Measurement::new(distance_m, pulse_end))
    }

    /// Give the pins back
    pub fn release(self) -> (T, E, D, C) {
        (self.trigger, self.echo, self.delay, self.clock)
    }

    /// Trigger sequence: low (settle), high (pulse), low
    fn fire(&mut self) -> Result<(), RangingError> {
        self.trigger.set_low().map_err(|e| RangingError::Pin {
            line: "trigger",
            kind: e.kind(),
        })?;
        self.delay.delay_ns(duration_ns(self.config.settle));

        self.trigger.set_high().map_err(|e| RangingError::Pin {
            line: "trigger",
            kind: e.kind(),
        })?;
        self.delay.delay_ns(duration_ns(self.config.trigger_pulse));

        self.trigger.set_low().map_err(|e| RangingError::Pin {
            line: "trigger",
            kind: e.kind(),
        })
    }

    /// Busy-wait until the echo line reads `high`, measured from `since`
    fn wait_for_level(
        &mut self,
        high: bool,
        edge: EchoEdge,
        since: Instant,
    ) -> Result<Instant, RangingError> {
        loop {
            let level = self.echo.is_high().map_err(|e| RangingError::Pin {
                line: "echo",
                kind: e.kind(),
            })?;
            let now = self.clock.now();
            if level == high {
                return Ok(now);
            }

            let waited = now.saturating_duration_since(since);
            if waited > self.config.echo_timeout {
                return Err(RangingError::Timeout { edge, waited });
            }
            std::hint::spin_loop();
        }
    }
}

impl<T, E, D, C> RangeSensor for PulseTimer<T, E, D, C>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    C: MonotonicClock,
{
    fn measure(&mut self) -> Result<Measurement, ContractError> {
        PulseTimer::measure(self).map_err(ContractError::from)
    }
}

fn duration_ns(d: Duration) -> u32 {
    u32::try_from(d.as_nanos()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SteppingClock;
    use embedded_hal::digital::ErrorType;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    struct RecordingTrigger {
        levels: Arc<Mutex<Vec<bool>>>,
    }

    impl ErrorType for RecordingTrigger {
        type Error = Infallible;
    }

    impl OutputPin for RecordingTrigger {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.levels.lock().unwrap().push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.levels.lock().unwrap().push(true);
            Ok(())
        }
    }

    /// Echo high during `[rise, fall)` on the shared clock
    struct WindowEcho {
        clock: SteppingClock,
        rise: Option<Instant>,
        fall: Option<Instant>,
    }

    impl ErrorType for WindowEcho {
        type Error = Infallible;
    }

    impl InputPin for WindowEcho {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            let now = self.clock.peek();
            let risen = self.rise.is_some_and(|r| now >= r);
            let fallen = self.fall.is_some_and(|f| now >= f);
            Ok(risen && !fallen)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|h| !h)
        }
    }

    fn timer_with_window(
        rise_us: Option<u64>,
        fall_us: Option<u64>,
    ) -> (
        PulseTimer<RecordingTrigger, WindowEcho, SteppingClock, SteppingClock>,
        Arc<Mutex<Vec<bool>>>,
    ) {
        let origin = Instant::now();
        let clock = SteppingClock::new(origin, Duration::from_micros(1));
        let levels = Arc::new(Mutex::new(Vec::new()));
        let echo = WindowEcho {
            clock: clock.clone(),
            rise: rise_us.map(|us| origin + Duration::from_micros(us)),
            fall: fall_us.map(|us| origin + Duration::from_micros(us)),
        };
        let trigger = RecordingTrigger {
            levels: Arc::clone(&levels),
        };
        let timer = PulseTimer::new(
            trigger,
            echo,
            clock.clone(),
            clock,
            PulseConfig::default(),
        );
        (timer, levels)
    }

    #[test]
    fn test_measure_distance() {
        // 0.25 m → 2 * 0.25 / 343 s ≈ 1458 µs round trip
        let (mut timer, _) = timer_with_window(Some(100), Some(100 + 1458));
        let m = timer.measure().unwrap();
        assert!(
            (m.distance_m - 0.25).abs() < 0.002,
            "distance was {}",
            m.distance_m
        );
    }

    #[test]
    fn test_trigger_sequence() {
        let (mut timer, levels) = timer_with_window(Some(100), Some(700));
        timer.measure().unwrap();
        assert_eq!(*levels.lock().unwrap(), vec![false, true, false]);
    }

    #[test]
    fn test_no_echo_times_out_on_rising_edge() {
        let (mut timer, _) = timer_with_window(None, None);
        match timer.measure() {
            Err(RangingError::Timeout { edge, waited }) => {
                assert_eq!(edge, EchoEdge::Rising);
                assert!(waited > Duration::from_millis(30));
                assert!(waited < Duration::from_millis(31));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_stuck_echo_times_out_on_falling_edge() {
        let (mut timer, _) = timer_with_window(Some(50), None);
        match timer.measure() {
            Err(RangingError::Timeout { edge, .. }) => assert_eq!(edge, EchoEdge::Falling),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_timeout_maps_to_sensor_timeout() {
        let (mut timer, _) = timer_with_window(None, None);
        let err = RangeSensor::measure(&mut timer).unwrap_err();
        assert!(matches!(err, ContractError::SensorTimeout { .. }));
    }

    #[test]
    fn test_round_trip_conversion() {
        let (timer, _) = timer_with_window(None, None);
        let d = timer.round_trip_to_meters(Duration::from_micros(5831));
        assert!((d - 1.0).abs() < 0.001);
    }
}
