//! Digital output pin for the charge-path enables and the status LED.
//!
//! Implements `embedded_hal::digital::OutputPin` over the raw GPIO
//! writes in [`hw_init`], so the hardware adapter is written against the
//! embedded-hal traits and never calls ESP-IDF directly.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real GPIO via hw_init.
//! On host/test: tracks the commanded level in memory only.

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin, StatefulOutputPin};

use crate::drivers::hw_init;
use crate::error::ActuatorError;

impl embedded_hal::digital::Error for ActuatorError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One push-pull GPIO output, active HIGH.
#[derive(Debug)]
pub struct GpioOutput {
    gpio: i32,
    high: bool,
}

impl GpioOutput {
    /// Wrap a pin already configured as output by `hw_init`.  Starts LOW.
    pub fn new(gpio: i32) -> Self {
        Self { gpio, high: false }
    }

    fn write(&mut self, high: bool) -> Result<(), ActuatorError> {
        hw_init::gpio_write(self.gpio, high)?;
        self.high = high;
        Ok(())
    }
}

impl ErrorType for GpioOutput {
    type Error = ActuatorError;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

impl StatefulOutputPin for GpioOutput {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::PinState;

    #[test]
    fn starts_low_and_tracks_level() {
        let mut pin = GpioOutput::new(6);
        assert!(pin.is_set_low().unwrap());
        pin.set_high().unwrap();
        assert!(pin.is_set_high().unwrap());
        pin.set_state(PinState::Low).unwrap();
        assert!(pin.is_set_low().unwrap());
    }
}
