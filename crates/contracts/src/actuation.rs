//! ActuatorCommand - what the outputs should do for a committed zone

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// RGB LED with three on/off channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(false, false, false);
    pub const RED: Rgb = Rgb::new(true, false, false);
    pub const YELLOW: Rgb = Rgb::new(true, true, false);
    pub const BLUE: Rgb = Rgb::new(false, false, true);

    pub const fn new(red: bool, green: bool, blue: bool) -> Self {
        Self { red, green, blue }
    }
}

/// Buzzer waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuzzerPattern {
    /// Silence
    #[default]
    Off,
    /// Continuous tone
    Steady { frequency_hz: u32 },
    /// `repeats` beeps of `on` followed by `off`
    Pulsed {
        frequency_hz: u32,
        on_ms: u64,
        off_ms: u64,
        repeats: u32,
    },
}

/// One timed step of an expanded buzzer pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuzzerStep {
    /// Tone frequency, `None` = silent
    pub tone_hz: Option<u32>,
    /// How long the step lasts, `None` = until interrupted
    pub duration: Option<Duration>,
}

impl BuzzerPattern {
    /// Expand the pattern into a finite step sequence
    ///
    /// `Off` and `Steady` produce a single open-ended step. `Pulsed` produces
    /// `repeats` on/off pairs followed by an open-ended silent step.
    pub fn steps(&self) -> Vec<BuzzerStep> {
        match *self {
            Self::Off => vec![BuzzerStep {
                tone_hz: None,
                duration: None,
            }],
            Self::Steady { frequency_hz } => vec![BuzzerStep {
                tone_hz: Some(frequency_hz),
                duration: None,
            }],
            Self::Pulsed {
                frequency_hz,
                on_ms,
                off_ms,
                repeats,
            } => {
                let mut steps = Vec::with_capacity(repeats as usize * 2 + 1);
                for _ in 0..repeats {
                    steps.push(BuzzerStep {
                        tone_hz: Some(frequency_hz),
                        duration: Some(Duration::from_millis(on_ms)),
                    });
                    steps.push(BuzzerStep {
                        tone_hz: None,
                        duration: Some(Duration::from_millis(off_ms)),
                    });
                }
                steps.push(BuzzerStep {
                    tone_hz: None,
                    duration: None,
                });
                steps
            }
        }
    }
}

/// Full output state for one zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorCommand {
    pub led: Rgb,
    pub buzzer: BuzzerPattern,
    /// Zone-specific display lines (the distance line is appended per tick)
    pub display_lines: Vec<String>,
}
