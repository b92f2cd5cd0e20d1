//! Periodic sensing loop

use std::time::{Duration, Instant};

use actuators::ActuatorDriver;
use contracts::{
    AlertHandler, Buzzer, ContractError, GuardBlueprint, Led, Measurement, Notice, RangeSensor,
    TextDisplay, Zone,
};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace, warn};

use crate::{MonitorStats, NoticeBoard, ShutdownToken, ZoneClassifier};

/// Where the loop is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Measuring,
    Classifying,
    Actuating,
    Dispatching,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub period: Duration,
    /// Stop after this many cycles (None = until shutdown)
    pub max_cycles: Option<u64>,
    pub notice_ttl: Duration,
    pub stopped_message: String,
}

impl MonitorConfig {
    pub fn from_blueprint(blueprint: &GuardBlueprint) -> Self {
        Self {
            period: blueprint.sensing.period(),
            max_cycles: None,
            notice_ttl: blueprint.display.notice_ttl(),
            ..Self::default()
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(1000),
            max_cycles: None,
            notice_ttl: Duration::from_millis(3000),
            stopped_message: "Stopped".to_string(),
        }
    }
}

/// Result of one cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub measurement: Option<Measurement>,
    /// Zone committed during this cycle
    pub committed: Option<Zone>,
    /// Alert handed off
    pub dispatched: bool,
    pub timed_out: bool,
}

/// Sensing loop: measure → classify → actuate → dispatch
pub struct Monitor<S, L, B, D, A> {
    sensor: S,
    driver: ActuatorDriver<L, B, D>,
    classifier: ZoneClassifier,
    alert: A,
    notices: Option<mpsc::Receiver<Notice>>,
    board: NoticeBoard,
    config: MonitorConfig,
    phase: Phase,
    last: Option<Measurement>,
    stats: MonitorStats,
}

impl<S, L, B, D, A> Monitor<S, L, B, D, A>
where
    S: RangeSensor,
    L: Led,
    B: Buzzer,
    D: TextDisplay,
    A: AlertHandler,
{
    pub fn new(
        sensor: S,
        driver: ActuatorDriver<L, B, D>,
        classifier: ZoneClassifier,
        alert: A,
        config: MonitorConfig,
    ) -> Self {
        Self {
            sensor,
            driver,
            classifier,
            alert,
            notices: None,
            board: NoticeBoard::new(config.notice_ttl),
            config,
            phase: Phase::Idle,
            last: None,
            stats: MonitorStats::default(),
        }
    }

    /// Receive notices posted by upload tasks
    pub fn with_notices(mut self, notices: mpsc::Receiver<Notice>) -> Self {
        self.notices = Some(notices);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_zone(&self) -> Zone {
        self.classifier.current()
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    pub fn driver(&self) -> &ActuatorDriver<L, B, D> {
        &self.driver
    }

    /// Boot banner shown before the first reading
    pub fn show_banner(&mut self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if let Err(e) = self.driver.show_text(&["Starting...", version.as_str()]) {
            self.stats.actuator_faults += 1;
            warn!(error = %e, "Boot banner not shown");
        }
    }

    /// Run one cycle at `now`
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        self.stats.cycles += 1;

        self.enter(Phase::Measuring);
        match self.sensor.measure() {
            Ok(measurement) => {
                self.stats.readings += 1;
                self.stats.distance.push(measurement.distance_m);
                observability::record_reading(&measurement);
                self.last = Some(measurement);
                outcome.measurement = Some(measurement);

                self.enter(Phase::Classifying);
                let previous = self.classifier.current();
                let zone = self.classifier.classify(measurement.distance_m);
                if let Some(committed) = self.classifier.update(zone, now) {
                    self.stats.transitions += 1;
                    observability::record_zone_transition(previous, committed);
                    info!(
                        from = %previous,
                        to = %committed,
                        distance_cm = measurement.distance_cm(),
                        "Zone changed"
                    );
                    outcome.committed = Some(committed);
                }
            }
            Err(e) => self.record_fault(&e, &mut outcome),
        }

        self.enter(Phase::Actuating);
        let command = self.driver.apply(self.classifier.current());
        if let Err(e) = self.driver.drive(&command, now) {
            self.stats.actuator_faults += 1;
            warn!(error = %e, "Actuator fault");
        }

        self.drain_notices(now);
        let distance = self.last.map(|m| m.distance_m);
        let notice = self.board.active(now);
        if let Err(e) = self.driver.refresh(distance, notice) {
            self.stats.actuator_faults += 1;
            warn!(error = %e, "Display refresh failed");
        }

        if outcome.committed == Some(Zone::Critical) {
            if let Some(measurement) = outcome.measurement {
                self.enter(Phase::Dispatching);
                self.stats.critical_entries += 1;
                self.alert.on_critical_entry(measurement);
                outcome.dispatched = true;
            }
        }

        self.enter(Phase::Idle);
        outcome
    }

    /// Loop until `shutdown` is cancelled or `max_cycles` is reached
    ///
    /// Ticks are scheduled on a fixed grid from the start instant; a tick
    /// that overruns its period moves the grid forward instead of bursting.
    #[instrument(
        name = "monitor_run",
        skip(self, shutdown),
        fields(period_ms = self.config.period.as_millis() as u64)
    )]
    pub fn run(&mut self, shutdown: &ShutdownToken) -> MonitorStats {
        info!(max_cycles = ?self.config.max_cycles, "Sensing loop started");
        self.show_banner();

        let mut next = Instant::now();
        while !shutdown.is_cancelled() {
            self.tick(Instant::now());

            if self
                .config
                .max_cycles
                .is_some_and(|max| self.stats.cycles >= max)
            {
                debug!(cycles = self.stats.cycles, "Cycle limit reached");
                break;
            }

            next += self.config.period;
            let now = Instant::now();
            if next <= now {
                trace!(overrun_ms = (now - next).as_millis() as u64, "Tick overran period");
                next = now;
                continue;
            }
            if shutdown.wait_timeout(next - now) {
                break;
            }
        }

        self.stop();
        info!(
            cycles = self.stats.cycles,
            readings = self.stats.readings,
            timeouts = self.stats.timeouts,
            critical_entries = self.stats.critical_entries,
            "Sensing loop stopped"
        );
        self.stats.clone()
    }

    /// LED and buzzer off, stop frame
    pub fn stop(&mut self) {
        if let Err(e) = self.driver.shutdown(&self.config.stopped_message) {
            self.stats.actuator_faults += 1;
            warn!(error = %e, "Outputs not fully reset on shutdown");
        }
    }

    fn record_fault(&mut self, error: &ContractError, outcome: &mut TickOutcome) {
        match error {
            ContractError::SensorTimeout { .. } => {
                self.stats.timeouts += 1;
                outcome.timed_out = true;
                observability::record_sensor_fault("timeout");
                warn!(error = %error, "No reading this cycle");
            }
            ContractError::GpioFault { .. } => {
                self.stats.gpio_faults += 1;
                observability::record_sensor_fault("gpio");
                warn!(error = %error, "Sensor GPIO fault");
            }
            other => {
                self.stats.gpio_faults += 1;
                observability::record_sensor_fault("other");
                warn!(error = %other, "Sensor failed");
            }
        }
    }

    fn drain_notices(&mut self, now: Instant) {
        let Some(rx) = self.notices.as_mut() else {
            return;
        };
        while let Ok(notice) = rx.try_recv() {
            trace!(text = %notice.text, "Notice received");
            self.stats.notices += 1;
            self.board.post(notice, now);
        }
    }

    fn enter(&mut self, phase: Phase) {
        trace!(from = ?self.phase, to = ?phase, "Phase");
        self.phase = phase;
    }
}
