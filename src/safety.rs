//! Safety monitor.
//!
//! Runs **every tick before the FSM** (except in `Init` and `Fault`) and
//! classifies the latest [`SensorFrame`] against static envelopes.
//!
//! ## Check order
//!
//! First violation wins; later checks are not evaluated that tick.
//!
//! 1. AC peak `<` minimum            → `Undervoltage`
//! 2. AC peak `>` maximum            → `Overvoltage`
//! 3. either bank `>` rated maximum  → `BankOvervoltage`
//! 4. load current `>` rated maximum → `Overcurrent`
//!
//! Readings exactly on a limit are safe.
//!
//! The monitor is stateless and has no side effects: escalating to `Fault`
//! and killing the actuators is the supervisor's job.  A single noisy
//! sample is not filtered here either; a genuine fault persists and is
//! caught on a following tick.

use crate::config::SystemConfig;
use crate::error::FaultCode;
use crate::sensors::SensorFrame;

/// Static envelopes, copied out of [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyLimits {
    pub ac_min_peak_v: f32,
    pub ac_max_peak_v: f32,
    pub bank_max_v: f32,
    pub load_max_a: f32,
}

impl From<&SystemConfig> for SafetyLimits {
    fn from(c: &SystemConfig) -> Self {
        Self {
            ac_min_peak_v: c.ac_min_peak_v,
            ac_max_peak_v: c.ac_max_peak_v,
            bank_max_v: c.bank_max_v,
            load_max_a: c.load_max_a,
        }
    }
}

/// Safety monitor.  O(1), never blocks.
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    limits: SafetyLimits,
}

impl SafetyMonitor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            limits: SafetyLimits::from(config),
        }
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// `Ok(())` if the frame is inside every envelope, otherwise the
    /// highest-priority violation.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn check(&self, frame: &SensorFrame) -> Result<(), FaultCode> {
        let l = &self.limits;

        // Limits are written as `!(x <= max)` so a NaN reading fails its
        // own check instead of passing every comparison.
        if !(frame.ac_peak_v >= l.ac_min_peak_v) {
            return Err(FaultCode::Undervoltage);
        }
        if frame.ac_peak_v > l.ac_max_peak_v {
            return Err(FaultCode::Overvoltage);
        }
        if !(frame.bank_pos_v <= l.bank_max_v && frame.bank_neg_v <= l.bank_max_v) {
            return Err(FaultCode::BankOvervoltage);
        }
        if !(frame.load_a <= l.load_max_a) {
            return Err(FaultCode::Overcurrent);
        }
        Ok(())
    }
}
