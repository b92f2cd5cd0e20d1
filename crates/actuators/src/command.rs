//! Zone → ActuatorCommand table

use contracts::{ActuatorCommand, BuzzerConfig, BuzzerPattern, Rgb, Zone};

/// Pure mapping from a zone to its outputs
#[derive(Debug, Clone)]
pub struct CommandTable {
    buzzer: BuzzerConfig,
}

impl CommandTable {
    pub fn new(buzzer: BuzzerConfig) -> Self {
        Self { buzzer }
    }

    /// Outputs for `zone`; no hidden state, same input always gives the same command
    pub fn apply(&self, zone: Zone) -> ActuatorCommand {
        match zone {
            Zone::Critical => ActuatorCommand {
                led: Rgb::RED,
                buzzer: BuzzerPattern::Steady {
                    frequency_hz: self.buzzer.frequency_hz,
                },
                display_lines: vec!["!! TOO CLOSE !!".to_string()],
            },
            Zone::Caution => ActuatorCommand {
                led: Rgb::YELLOW,
                buzzer: BuzzerPattern::Pulsed {
                    frequency_hz: self.buzzer.frequency_hz,
                    on_ms: self.buzzer.caution_on_ms,
                    off_ms: self.buzzer.caution_off_ms,
                    repeats: self.buzzer.caution_repeats,
                },
                display_lines: vec!["Caution".to_string()],
            },
            Zone::Safe => ActuatorCommand {
                led: Rgb::BLUE,
                buzzer: BuzzerPattern::Off,
                display_lines: vec!["Safe".to_string()],
            },
        }
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new(BuzzerConfig::default())
    }
}
