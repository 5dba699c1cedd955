//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (ADC front end, charge switches, discharge PWM, the
//! indicator LED, event sinks, config storage) implement these traits.
//! The [`AppService`](super::service::AppService) consumes them via
//! generics, so the control core never touches hardware directly and the
//! whole supervisor runs on the host against recording fakes.
//!
//! Actuator ports are infallible from the domain's point of view: an
//! adapter that fails to write a register logs the failure and carries
//! on.  The next tick rewrites every output anyway.

use crate::config::SystemConfig;
use crate::sensors::{ScaleFactors, SensorFrame};

/// Which capacitor bank an actuator call addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    /// Discharges during the positive half-cycle.
    Positive,
    /// Discharges during the negative half-cycle.
    Negative,
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one unit-converted frame per control tick.
pub trait SensorSource {
    fn read_frame(&mut self) -> SensorFrame;

    /// Counts-to-units conversion for subsequent frames.  Called at start
    /// and whenever the configuration is replaced.
    fn set_scale(&mut self, scale: ScaleFactors);

    /// Channel reads that failed and were replaced by the last good value.
    fn read_failures(&self) -> u32 {
        0
    }
}

// ───────────────────────────────────────────────────────────────
// Actuator ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Per-bank charge-path enable.
pub trait ChargePath {
    fn set_charge_enabled(&mut self, bank: Bank, enabled: bool);
}

/// Per-bank discharge PWM.  `duty` is in `0..=pwm_max` counts, where
/// `pwm_max` is the value last passed to [`set_full_scale`](Self::set_full_scale).
pub trait DutyOutput {
    fn set_duty(&mut self, bank: Bank, duty: u16);

    /// Duty count that means 100 %.  Called at start and whenever the
    /// configuration is replaced, before the next duty write.
    fn set_full_scale(&mut self, pwm_max: u16);
}

/// The single status LED.
pub trait StatusIndicator {
    fn set_indicator(&mut self, on: bool);
}

/// Everything one control tick touches.  Blanket-implemented, so a
/// single adapter struct can be passed as `&mut hw` without splitting
/// borrows.
pub trait Hardware: SensorSource + ChargePath + DutyOutput + StatusIndicator {}

impl<T: SensorSource + ChargePath + DutyOutput + StatusIndicator> Hardware for T {}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / diagnostics)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid values are rejected with [`ConfigError::ValidationFailed`],
/// never silently clamped: a bad threshold here disables a safety trip.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<crate::error::Error> for ConfigError {
    fn from(e: crate::error::Error) -> Self {
        match e {
            crate::error::Error::Config(msg) => Self::ValidationFailed(msg),
            _ => Self::IoError,
        }
    }
}
