//! Discharge switch PWM channel.
//!
//! Implements `embedded_hal::pwm::SetDutyCycle` over one LEDC channel.
//! The control core speaks in duty counts of `0..=pwm_max`; the adapter
//! rescales with `set_duty_cycle_fraction(duty, pwm_max)` so the LEDC
//! resolution stays a driver detail.

use embedded_hal::pwm::{ErrorKind, ErrorType, SetDutyCycle};

use crate::drivers::hw_init;
use crate::error::ActuatorError;

impl embedded_hal::pwm::Error for ActuatorError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug)]
pub struct DischargePwm {
    channel: u32,
    duty: u16,
}

impl DischargePwm {
    /// Wrap an LEDC channel already configured by `hw_init`.  Starts at 0.
    pub fn new(channel: u32) -> Self {
        Self { channel, duty: 0 }
    }

    /// Last duty written, in LEDC counts.
    pub fn duty(&self) -> u16 {
        self.duty
    }
}

impl ErrorType for DischargePwm {
    type Error = ActuatorError;
}

impl SetDutyCycle for DischargePwm {
    fn max_duty_cycle(&self) -> u16 {
        hw_init::LEDC_DUTY_MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if duty > hw_init::LEDC_DUTY_MAX {
            return Err(ActuatorError::PwmWriteFailed);
        }
        hw_init::ledc_set(self.channel, duty)?;
        self.duty = duty;
        Ok(())
    }
}
