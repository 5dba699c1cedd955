//! Unified error and fault types for the soft-start firmware.
//!
//! Two families live here:
//!
//! - [`Error`]: ordinary fallible operations (configuration, peripheral
//!   bring-up, persistence).  Every subsystem error converts into it.
//! - [`FaultCode`]: the latched classification of why the controller
//!   stopped.  It is not an error that gets propagated with `?`; it is
//!   state owned by the supervisor and shown on the status indicator.
//!
//! All variants are `Copy` so they can be passed through the safety
//! monitor and FSM without allocation.

use core::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC conversion returned an error or timed out.
    AdcReadFailed,
    /// Raw reading above the converter's full-scale value.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// Charge-enable GPIO write failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Fault codes
// ---------------------------------------------------------------------------

/// Why the controller latched into `Fault`.
///
/// `None` is only ever paired with a non-`Fault` operating state; every
/// other variant is only ever paired with `Fault`.  The supervisor is the
/// sole writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FaultCode {
    #[default]
    None = 0,
    /// AC peak voltage above the configured maximum.
    Overvoltage = 1,
    /// AC peak voltage below the configured minimum (includes loss of mains).
    Undervoltage = 2,
    /// Load current above the rated maximum.
    Overcurrent = 3,
    /// A capacitor bank above its rated voltage.
    BankOvervoltage = 4,
    /// Banks never reached the charged threshold within the charge timeout.
    ChargeTimeout = 5,
    /// `Fault` was entered with no recorded cause.
    Unclassified = 6,
}

impl FaultCode {
    /// Numeric code, also the number of flashes in the indicator blink code.
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn is_fault(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Overvoltage => write!(f, "AC overvoltage"),
            Self::Undervoltage => write!(f, "AC undervoltage"),
            Self::Overcurrent => write!(f, "load overcurrent"),
            Self::BankOvervoltage => write!(f, "bank overvoltage"),
            Self::ChargeTimeout => write!(f, "charge timeout"),
            Self::Unclassified => write!(f, "unclassified fault"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
