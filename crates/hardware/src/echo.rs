//! Simulated ultrasonic sensor pins

use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use contracts::{ProfileSegment, SimulationConfig};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ranging::{MonotonicClock, PulseConfig, PulseTimer};
use tracing::trace;

/// Looping distance profile
#[derive(Debug, Clone)]
pub struct DistanceScript {
    segments: Vec<ProfileSegment>,
    period: Duration,
}

impl DistanceScript {
    pub fn new(segments: Vec<ProfileSegment>) -> Self {
        let period = segments
            .iter()
            .map(|s| Duration::from_millis(s.hold_ms))
            .sum();
        Self { segments, period }
    }

    /// Obstacle distance `elapsed` after the start, `None` = no echo
    pub fn distance_at(&self, elapsed: Duration) -> Option<f64> {
        if self.period.is_zero() {
            return None;
        }
        let mut offset = Duration::from_nanos((elapsed.as_nanos() % self.period.as_nanos()) as u64);
        for segment in &self.segments {
            let hold = Duration::from_millis(segment.hold_ms);
            if offset < hold {
                return segment.distance_m;
            }
            offset -= hold;
        }
        None
    }
}

struct Scene {
    script: DistanceScript,
    started: Instant,
    noise_m: f64,
    dropout_rate: f64,
    latency: Duration,
    speed_of_sound_m_s: f64,
    rng: StdRng,
    trigger_high: bool,
    /// Echo line high within `[rise, fall)`
    window: Option<(Instant, Instant)>,
}

impl Scene {
    fn on_trigger_fall(&mut self, now: Instant) {
        self.window = None;
        let Some(distance) = self.script.distance_at(now - self.started) else {
            trace!("no obstacle, no echo");
            return;
        };
        if self.dropout_rate > 0.0 && self.rng.random_bool(self.dropout_rate.min(1.0)) {
            trace!("echo dropped");
            return;
        }

        let distance = if self.noise_m > 0.0 {
            (distance + self.rng.random_range(-self.noise_m..=self.noise_m)).max(0.0)
        } else {
            distance
        };
        let round_trip = Duration::from_secs_f64(2.0 * distance / self.speed_of_sound_m_s);
        let rise = now + self.latency;
        self.window = Some((rise, rise + round_trip));
    }
}

type SharedScene = Arc<Mutex<Scene>>;

fn lock(scene: &SharedScene) -> MutexGuard<'_, Scene> {
    scene.lock().unwrap_or_else(|e| e.into_inner())
}

/// Trigger output; a high→low edge emits a pulse
pub struct TriggerPin<C> {
    scene: SharedScene,
    clock: C,
}

/// Echo input; high while the scheduled echo is in flight
pub struct EchoPin<C> {
    scene: SharedScene,
    clock: C,
}

impl<C> ErrorType for TriggerPin<C> {
    type Error = Infallible;
}

impl<C> ErrorType for EchoPin<C> {
    type Error = Infallible;
}

impl<C: MonotonicClock> OutputPin for TriggerPin<C> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut scene = lock(&self.scene);
        if scene.trigger_high {
            scene.trigger_high = false;
            scene.on_trigger_fall(self.clock.now());
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        lock(&self.scene).trigger_high = true;
        Ok(())
    }
}

impl<C: MonotonicClock> InputPin for EchoPin<C> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let now = self.clock.now();
        Ok(lock(&self.scene)
            .window
            .is_some_and(|(rise, fall)| now >= rise && now < fall))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Trigger/echo pair playing `simulation` against `clock`
///
/// `seed` fixes noise and dropout for reproducible runs.
pub fn simulated_pins<C: MonotonicClock + Clone>(
    simulation: &SimulationConfig,
    speed_of_sound_m_s: f64,
    clock: C,
    seed: Option<u64>,
) -> (TriggerPin<C>, EchoPin<C>) {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let scene = Arc::new(Mutex::new(Scene {
        script: DistanceScript::new(simulation.profile.clone()),
        started: clock.now(),
        noise_m: simulation.noise_m,
        dropout_rate: simulation.dropout_rate,
        latency: Duration::from_micros(simulation.echo_latency_us),
        speed_of_sound_m_s,
        rng,
        trigger_high: false,
        window: None,
    }));

    (
        TriggerPin {
            scene: Arc::clone(&scene),
            clock: clock.clone(),
        },
        EchoPin { scene, clock },
    )
}

/// PulseTimer wired to simulated pins
pub fn simulated_ranger<D, C>(
    simulation: &SimulationConfig,
    pulse: PulseConfig,
    delay: D,
    clock: C,
    seed: Option<u64>,
) -> PulseTimer<TriggerPin<C>, EchoPin<C>, D, C>
where
    D: DelayNs,
    C: MonotonicClock + Clone,
{
    let (trigger, echo) = simulated_pins(simulation, pulse.speed_of_sound_m_s, clock.clone(), seed);
    PulseTimer::new(trigger, echo, delay, clock, pulse)
}
