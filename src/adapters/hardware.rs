//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and every output, exposing them through
//! [`SensorSource`], [`ChargePath`], [`DutyOutput`] and
//! [`StatusIndicator`].  Outputs are generic over the embedded-hal
//! traits: the board wiring in `main` supplies
//! [`GpioOutput`](crate::drivers::gate::GpioOutput) and
//! [`DischargePwm`](crate::drivers::discharge_pwm::DischargePwm) while
//! tests can supply anything that implements the traits.
//!
//! A failed register write is logged and counted.  The port traits are
//! infallible; the next control tick rewrites every output.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{Bank, ChargePath, DutyOutput, SensorSource, StatusIndicator};
use crate::sensors::{ScaleFactors, SensorFrame, SensorHub};

/// The four switched outputs, by bank.
pub struct PowerStage<P, D> {
    pub charge_pos: P,
    pub charge_neg: P,
    pub discharge_pos: D,
    pub discharge_neg: D,
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<P, D> {
    sensor_hub: SensorHub,
    stage: PowerStage<P, D>,
    led: P,
    pwm_max: u16,
    write_failures: u32,
}

impl<P: OutputPin, D: SetDutyCycle> HardwareAdapter<P, D> {
    pub fn new(sensor_hub: SensorHub, stage: PowerStage<P, D>, led: P, pwm_max: u16) -> Self {
        Self {
            sensor_hub,
            stage,
            led,
            pwm_max: pwm_max.max(1),
            write_failures: 0,
        }
    }

    /// Output writes that returned an error since boot.
    pub fn write_failures(&self) -> u32 {
        self.write_failures
    }

    pub fn stage(&self) -> &PowerStage<P, D> {
        &self.stage
    }

    fn note_failure(&mut self, what: &str, e: impl core::fmt::Debug) {
        self.write_failures = self.write_failures.saturating_add(1);
        warn!("HardwareAdapter: {} write failed: {:?}", what, e);
    }
}

// ── SensorSource implementation ───────────────────────────────

impl<P, D> SensorSource for HardwareAdapter<P, D> {
    fn read_frame(&mut self) -> SensorFrame {
        self.sensor_hub.read_frame()
    }

    fn set_scale(&mut self, scale: ScaleFactors) {
        self.sensor_hub.set_scale(scale);
    }

    fn read_failures(&self) -> u32 {
        self.sensor_hub.read_failures()
    }
}

// ── Actuator implementations ──────────────────────────────────

impl<P: OutputPin, D: SetDutyCycle> ChargePath for HardwareAdapter<P, D> {
    fn set_charge_enabled(&mut self, bank: Bank, enabled: bool) {
        let pin = match bank {
            Bank::Positive => &mut self.stage.charge_pos,
            Bank::Negative => &mut self.stage.charge_neg,
        };
        let result = if enabled { pin.set_high() } else { pin.set_low() };
        if let Err(e) = result {
            self.note_failure("charge enable", e);
        }
    }
}

impl<P: OutputPin, D: SetDutyCycle> DutyOutput for HardwareAdapter<P, D> {
    fn set_duty(&mut self, bank: Bank, duty: u16) {
        let duty = duty.min(self.pwm_max);
        let pwm_max = self.pwm_max;
        let channel = match bank {
            Bank::Positive => &mut self.stage.discharge_pos,
            Bank::Negative => &mut self.stage.discharge_neg,
        };
        if let Err(e) = channel.set_duty_cycle_fraction(duty, pwm_max) {
            self.note_failure("discharge PWM", e);
        }
    }

    fn set_full_scale(&mut self, pwm_max: u16) {
        self.pwm_max = pwm_max.max(1);
    }
}

impl<P: OutputPin, D: SetDutyCycle> StatusIndicator for HardwareAdapter<P, D> {
    fn set_indicator(&mut self, on: bool) {
        let result = if on {
            self.led.set_high()
        } else {
            self.led.set_low()
        };
        if let Err(e) = result {
            self.note_failure("status LED", e);
        }
    }
}
