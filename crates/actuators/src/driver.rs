//! ActuatorDriver - the only path that touches the outputs

use std::time::Instant;

use contracts::{ActuatorCommand, Buzzer, ContractError, Led, Rgb, TextDisplay, Zone};
use tracing::{debug, warn};

use crate::{compose_frame, BuzzerSequencer, CommandTable, ScreenGeometry};

/// Owns the LED, buzzer and display
///
/// Commands are applied in the order `drive` is called. Every output is
/// attempted on each call and the first fault is returned.
pub struct ActuatorDriver<L, B, D> {
    led: L,
    buzzer: B,
    display: D,
    table: CommandTable,
    geometry: ScreenGeometry,
    active: Option<ActuatorCommand>,
    lit: Option<Rgb>,
    sequencer: BuzzerSequencer,
    tone: Option<u32>,
    frame: Option<Vec<String>>,
    display_writes: u64,
}

impl<L: Led, B: Buzzer, D: TextDisplay> ActuatorDriver<L, B, D> {
    pub fn new(led: L, buzzer: B, display: D, table: CommandTable, geometry: ScreenGeometry) -> Self {
        Self {
            led,
            buzzer,
            display,
            table,
            geometry,
            active: None,
            lit: None,
            sequencer: BuzzerSequencer::new(Instant::now()),
            tone: None,
            frame: None,
            display_writes: 0,
        }
    }

    /// Command for a zone
    pub fn apply(&self, zone: Zone) -> ActuatorCommand {
        self.table.apply(zone)
    }

    /// Bring LED and buzzer in line with `command`
    ///
    /// A command different from the active one restarts the buzzer pattern.
    /// The same command only advances the running pattern. The LED is written
    /// whenever its last successful colour differs from the command's, so a
    /// failed write is retried on the next call.
    pub fn drive(&mut self, command: &ActuatorCommand, now: Instant) -> Result<(), ContractError> {
        let mut first_fault = None;

        if self.active.as_ref() != Some(command) {
            debug!(led = ?command.led, buzzer = ?command.buzzer, "New actuator command");
            self.sequencer.start(&command.buzzer, now);
            self.active = Some(command.clone());
        }

        if self.lit != Some(command.led) {
            match self.led.set(command.led) {
                Ok(()) => self.lit = Some(command.led),
                Err(e) => {
                    self.lit = None;
                    first_fault.get_or_insert(e);
                }
            }
        }

        if let Err(e) = self.sync_buzzer(now) {
            first_fault.get_or_insert(e);
        }

        first_fault.map_or(Ok(()), Err)
    }

    /// Redraw the display from the active command, the latest distance and
    /// a notice. Returns whether the screen was written.
    pub fn refresh(&mut self, distance_m: Option<f64>, notice: Option<&str>) -> Result<bool, ContractError> {
        let zone_lines = self
            .active
            .as_ref()
            .map(|c| c.display_lines.as_slice())
            .unwrap_or_default();
        let frame = compose_frame(zone_lines, distance_m, notice, self.geometry);
        self.show(frame)
    }

    /// Render free text (boot banner, stop message), truncated to the grid
    pub fn show_text(&mut self, lines: &[&str]) -> Result<bool, ContractError> {
        let frame = lines
            .iter()
            .take(self.geometry.rows)
            .map(|l| l.chars().take(self.geometry.columns).collect())
            .collect();
        self.show(frame)
    }

    /// LED off, buzzer off, final frame
    pub fn shutdown(&mut self, message: &str) -> Result<(), ContractError> {
        let mut first_fault = None;
        self.lit = None;
        match self.led.set(Rgb::OFF) {
            Ok(()) => self.lit = Some(Rgb::OFF),
            Err(e) => {
                first_fault.get_or_insert(e);
            }
        }
        if let Err(e) = self.buzzer.silence() {
            first_fault.get_or_insert(e);
        }
        self.tone = None;
        self.active = None;
        if let Err(e) = self.show_text(&[message]) {
            first_fault.get_or_insert(e);
        }
        first_fault.map_or(Ok(()), Err)
    }

    /// Number of times the display was actually rewritten
    pub fn display_writes(&self) -> u64 {
        self.display_writes
    }

    /// Lines currently on the display
    pub fn current_frame(&self) -> Option<&[String]> {
        self.frame.as_deref()
    }

    pub fn into_parts(self) -> (L, B, D) {
        (self.led, self.buzzer, self.display)
    }

    fn sync_buzzer(&mut self, now: Instant) -> Result<(), ContractError> {
        let wanted = self.sequencer.advance(now);
        if wanted == self.tone {
            return Ok(());
        }
        match wanted {
            Some(freq) => self.buzzer.tone(freq)?,
            None => self.buzzer.silence()?,
        }
        self.tone = wanted;
        Ok(())
    }

    fn show(&mut self, frame: Vec<String>) -> Result<bool, ContractError> {
        if self.frame.as_ref() == Some(&frame) {
            return Ok(false);
        }
        if let Err(e) = self.display.render(&frame) {
            warn!(error = %e, "Display write failed");
            return Err(e);
        }
        self.display_writes += 1;
        self.frame = Some(frame);
        Ok(true)
    }
}
