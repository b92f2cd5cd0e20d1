//! `embedded-hal` output pins as LED and buzzer

use contracts::{Buzzer, ContractError, Led, Rgb};
use embedded_hal::digital::{Error as _, OutputPin, PinState};

fn drive<P: OutputPin>(pin: &mut P, device: &str, high: bool) -> Result<(), ContractError> {
    pin.set_state(PinState::from(high))
        .map_err(|e| ContractError::actuator(device, format!("{:?}", e.kind())))
}

/// Three-channel LED, one output pin per channel, active high
pub struct RgbLed<R, G, B> {
    red: R,
    green: G,
    blue: B,
}

impl<R: OutputPin, G: OutputPin, B: OutputPin> RgbLed<R, G, B> {
    pub fn new(red: R, green: G, blue: B) -> Self {
        Self { red, green, blue }
    }

    pub fn release(self) -> (R, G, B) {
        (self.red, self.green, self.blue)
    }
}

impl<R: OutputPin, G: OutputPin, B: OutputPin> Led for RgbLed<R, G, B> {
    /// Every channel is written even if an earlier one fails
    fn set(&mut self, color: Rgb) -> Result<(), ContractError> {
        let red = drive(&mut self.red, "led.red", color.red);
        let green = drive(&mut self.green, "led.green", color.green);
        let blue = drive(&mut self.blue, "led.blue", color.blue);
        red.and(green).and(blue)
    }
}

/// Active buzzer on a single pin
///
/// The module generates its own tone, so the requested frequency only
/// switches it on.
pub struct PinBuzzer<P> {
    pin: P,
}

impl<P: OutputPin> PinBuzzer<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> Buzzer for PinBuzzer<P> {
    fn tone(&mut self, frequency_hz: u32) -> Result<(), ContractError> {
        tracing::trace!(frequency_hz, "Buzzer on");
        drive(&mut self.pin, "buzzer", true)
    }

    fn silence(&mut self) -> Result<(), ContractError> {
        drive(&mut self.pin, "buzzer", false)
    }
}
