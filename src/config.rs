//! System configuration parameters
//!
//! All tunable parameters for the soft-start controller.  Voltages are
//! peak volts, currents are amps, times are milliseconds.
//! Values can be overridden via NVS (see [`crate::adapters::nvs`]).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sensors::ScaleFactors;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- AC envelope ---
    /// AC peak voltage below this is `Undervoltage`.
    pub ac_min_peak_v: f32,
    /// AC peak voltage above this is `Overvoltage`.
    pub ac_max_peak_v: f32,

    // --- Banks ---
    /// A bank above this voltage counts as charged.
    pub bank_charged_v: f32,
    /// Rated maximum of either bank; above is `BankOvervoltage`.
    pub bank_max_v: f32,

    // --- Load ---
    /// Rated maximum load current; above is `Overcurrent`.
    pub load_max_a: f32,
    /// Load current above this in `Ready` means a motor is starting.
    pub start_detect_a: f32,
    /// Load current below this (for `boost_stop_dwell_ms`) means the motor has started.
    pub stop_detect_a: f32,

    // --- Timing ---
    /// How long load current must stay below `stop_detect_a` to end a boost.
    pub boost_stop_dwell_ms: u32,
    /// Hard limit on a single boost.
    pub max_boost_ms: u32,
    /// Charging must reach `Ready` within this time.
    pub charge_timeout_ms: u32,
    /// Dead time after a boost before recharging.
    pub cooldown_ms: u32,
    /// Control loop period.
    pub control_period_ms: u32,
    /// Status report interval for the debug UART.
    pub report_interval_ms: u32,
    /// No zero-crossing for this long marks the phase reference stale (diagnostic only).
    pub zero_cross_stale_ms: u32,

    // --- Discharge PWM ---
    /// Full-scale duty count of the discharge PWM.
    pub pwm_max: u16,
    /// Duty on entry to `Boosting` (% of `pwm_max`).
    pub boost_start_percent: u8,
    /// Duty ceiling during a boost (% of `pwm_max`).
    pub boost_ceiling_percent: u8,
    /// Duty increment per half-cycle (% of `pwm_max`).
    pub boost_step_percent: u8,

    // --- Sensor front end ---
    pub scale: ScaleFactors,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // AC envelope
            ac_min_peak_v: 90.0,
            ac_max_peak_v: 200.0,

            // Banks
            bank_charged_v: 75.0,
            bank_max_v: 85.0,

            // Load
            load_max_a: 40.0,
            start_detect_a: 5.0,
            stop_detect_a: 4.0,

            // Timing
            boost_stop_dwell_ms: 50,
            max_boost_ms: 500,
            charge_timeout_ms: 120_000, // 2 min
            cooldown_ms: 1_000,
            control_period_ms: 1,
            report_interval_ms: 1_000,
            zero_cross_stale_ms: 100, // ~5 half-cycles at 50 Hz

            // Discharge PWM (16 MHz / 20 kHz)
            pwm_max: 800,
            boost_start_percent: 50,
            boost_ceiling_percent: 80,
            boost_step_percent: 5,

            scale: ScaleFactors::default(),
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<()> {
        if !(self.ac_min_peak_v > 0.0 && self.ac_min_peak_v < self.ac_max_peak_v) {
            return Err(Error::Config("ac_min_peak_v must be > 0 and < ac_max_peak_v"));
        }
        if !(self.bank_charged_v > 0.0 && self.bank_charged_v < self.bank_max_v) {
            return Err(Error::Config("bank_charged_v must be > 0 and < bank_max_v"));
        }
        if !(self.stop_detect_a > 0.0 && self.stop_detect_a <= self.start_detect_a) {
            return Err(Error::Config("stop_detect_a must be > 0 and <= start_detect_a"));
        }
        if self.start_detect_a >= self.load_max_a {
            return Err(Error::Config("start_detect_a must be < load_max_a"));
        }
        if self.pwm_max == 0 {
            return Err(Error::Config("pwm_max must be non-zero"));
        }
        if self.boost_ceiling_percent > 100 {
            return Err(Error::Config("boost_ceiling_percent must be 0-100"));
        }
        if self.boost_start_percent > self.boost_ceiling_percent {
            return Err(Error::Config("boost_start_percent must be <= boost_ceiling_percent"));
        }
        if self.boost_step_percent == 0 {
            return Err(Error::Config("boost_step_percent must be non-zero"));
        }
        if self.control_period_ms == 0
            || self.max_boost_ms == 0
            || self.charge_timeout_ms == 0
            || self.cooldown_ms == 0
            || self.report_interval_ms == 0
        {
            return Err(Error::Config("periods and timeouts must be non-zero"));
        }
        if !(self.load_max_a > 0.0) {
            return Err(Error::Config("load_max_a must be > 0"));
        }
        self.scale.validate()
    }

    /// `percent` of `pwm_max`, in duty counts.
    pub fn pwm_counts(&self, percent: u8) -> u16 {
        (u32::from(self.pwm_max) * u32::from(percent) / 100) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SystemConfig::default().validate(), Ok(()));
    }

    #[test]
    fn default_duty_counts_match_pwm_period() {
        let c = SystemConfig::default();
        assert_eq!(c.pwm_counts(c.boost_start_percent), 400);
        assert_eq!(c.pwm_counts(c.boost_ceiling_percent), 640);
        assert_eq!(c.pwm_counts(c.boost_step_percent), 40);
        assert_eq!(c.pwm_counts(100), c.pwm_max);
    }

    #[test]
    fn envelope_ordering_enforced() {
        let mut c = SystemConfig::default();
        c.ac_min_peak_v = c.ac_max_peak_v;
        assert!(c.validate().is_err());

        let mut c = SystemConfig::default();
        c.bank_charged_v = c.bank_max_v + 1.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn stop_threshold_may_not_exceed_start() {
        let mut c = SystemConfig::default();
        c.stop_detect_a = c.start_detect_a + 0.5;
        assert!(c.validate().is_err());

        c.stop_detect_a = c.start_detect_a;
        assert!(c.validate().is_ok(), "single-threshold setup stays allowed");
    }

    #[test]
    fn boost_percentages_checked() {
        let mut c = SystemConfig::default();
        c.boost_start_percent = 90;
        assert!(c.validate().is_err());

        let mut c = SystemConfig::default();
        c.boost_ceiling_percent = 101;
        assert!(c.validate().is_err());

        let mut c = SystemConfig::default();
        c.boost_step_percent = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn postcard_roundtrip() {
        let c = SystemConfig::default();
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: SystemConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c.pwm_max, c2.pwm_max);
        assert!((c.bank_max_v - c2.bank_max_v).abs() < 0.001);
    }
}
