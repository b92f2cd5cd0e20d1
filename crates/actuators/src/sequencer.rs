//! Non-blocking buzzer step sequencer

use std::time::Instant;

use contracts::{BuzzerPattern, BuzzerStep};

/// Plays a `BuzzerPattern` as a list of timed steps
///
/// Nothing sleeps: the caller advances the sequencer against a clock once
/// per tick. Starting a new pattern discards the running one.
#[derive(Debug, Clone)]
pub struct BuzzerSequencer {
    steps: Vec<BuzzerStep>,
    index: usize,
    step_started: Instant,
}

impl BuzzerSequencer {
    /// Silent sequencer
    pub fn new(now: Instant) -> Self {
        Self {
            steps: BuzzerPattern::Off.steps(),
            index: 0,
            step_started: now,
        }
    }

    /// Replace the running pattern, restarting from its first step
    pub fn start(&mut self, pattern: &BuzzerPattern, now: Instant) {
        self.steps = pattern.steps();
        self.index = 0;
        self.step_started = now;
    }

    /// Move past every step that has elapsed and return the tone to play
    pub fn advance(&mut self, now: Instant) -> Option<u32> {
        while let Some(duration) = self.steps[self.index].duration {
            let ends_at = self.step_started + duration;
            if now < ends_at || self.index + 1 >= self.steps.len() {
                break;
            }
            self.index += 1;
            self.step_started = ends_at;
        }
        self.steps[self.index].tone_hz
    }

    /// Whether the pattern reached its open-ended final step
    pub fn is_settled(&self) -> bool {
        self.steps[self.index].duration.is_none()
    }
}
