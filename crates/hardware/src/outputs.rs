//! Output devices that write to the log

use std::convert::Infallible;

use actuators::{PinBuzzer, RgbLed};
use contracts::{ContractError, TextDisplay};
use embedded_hal::digital::{ErrorType, OutputPin};
use tracing::{info, trace};

/// Output pin that logs level changes
#[derive(Debug, Clone)]
pub struct LogPin {
    name: &'static str,
    high: bool,
}

impl LogPin {
    pub fn new(name: &'static str) -> Self {
        Self { name, high: false }
    }

    pub fn is_set_high(&self) -> bool {
        self.high
    }

    fn set(&mut self, high: bool) {
        if self.high != high {
            trace!(pin = self.name, high, "Pin level");
        }
        self.high = high;
    }
}

impl ErrorType for LogPin {
    type Error = Infallible;
}

impl OutputPin for LogPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

/// Display that logs every frame it is given
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    frames: u64,
    last: Vec<String>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last(&self) -> &[String] {
        &self.last
    }
}

impl TextDisplay for ConsoleDisplay {
    fn render(&mut self, lines: &[String]) -> Result<(), ContractError> {
        self.frames += 1;
        self.last = lines.to_vec();
        info!(target: "display", lines = ?self.last, "Display");
        Ok(())
    }
}

pub type SimulatedOutputs = (RgbLed<LogPin, LogPin, LogPin>, PinBuzzer<LogPin>, ConsoleDisplay);

/// LED, buzzer and display for runs without hardware
pub fn simulated_outputs() -> SimulatedOutputs {
    (
        RgbLed::new(LogPin::new("led.red"), LogPin::new("led.green"), LogPin::new("led.blue")),
        PinBuzzer::new(LogPin::new("buzzer")),
        ConsoleDisplay::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Buzzer, Led, Rgb};

    #[test]
    fn test_outputs_track_levels() {
        let (mut led, mut buzzer, mut display) = simulated_outputs();
        led.set(Rgb::RED).unwrap();
        buzzer.tone(2000).unwrap();
        display.render(&["Safe".to_string()]).unwrap();

        let (r, g, b) = led.release();
        assert!(r.is_set_high() && !g.is_set_high() && !b.is_set_high());
        assert!(buzzer.release().is_set_high());
        assert_eq!(display.frames(), 1);
        assert_eq!(display.last(), &["Safe".to_string()]);
    }
}
