//! Clock and delay sources for pulse timing

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

/// Monotonic time source
pub trait MonotonicClock {
    fn now(&self) -> Instant;
}

/// Wall monotonic clock (`Instant::now`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl MonotonicClock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock that advances by a fixed step on every read
///
/// Clones share the same timeline, so simulated pins and the pulse timer
/// observe a consistent "now". Sleeping through [`DelayNs`] advances it too.
#[derive(Debug, Clone)]
pub struct SteppingClock {
    origin: Instant,
    elapsed_ns: Arc<AtomicU64>,
    step_ns: u64,
}

impl SteppingClock {
    /// Clock starting at `origin` advancing `step` per `now()` call
    pub fn new(origin: Instant, step: Duration) -> Self {
        Self {
            origin,
            elapsed_ns: Arc::new(AtomicU64::new(0)),
            step_ns: step.as_nanos() as u64,
        }
    }

    /// Move the timeline forward without reading it
    pub fn advance(&self, by: Duration) {
        self.elapsed_ns
            .fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Current time without advancing
    pub fn peek(&self) -> Instant {
        self.origin + Duration::from_nanos(self.elapsed_ns.load(Ordering::SeqCst))
    }
}

impl MonotonicClock for SteppingClock {
    fn now(&self) -> Instant {
        let ns = self.elapsed_ns.fetch_add(self.step_ns, Ordering::SeqCst);
        self.origin + Duration::from_nanos(ns)
    }
}

impl DelayNs for SteppingClock {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(Duration::from_nanos(u64::from(ns)));
    }
}

/// `DelayNs` backed by `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}
