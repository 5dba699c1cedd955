//! Fixed linear conversion from ADC counts to physical units.
//!
//! ```text
//!   V_AC    1 MΩ / 10 kΩ divider   (101:1)  170 Vpk  -> 1.68 V
//!   V_BANK  820 kΩ / 10 kΩ divider (83:1)    81 V    -> 0.98 V
//!   I_LOAD  5 mΩ shunt x 50 V/V            0.25 V/A  -> 310 counts/A
//! ```
//!
//! Integer math, as on the sense board: intermediate products fit in
//! `u64`, results are millivolts / milliamps before the final `f32`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, SensorError};

/// Full-scale of the 12-bit converter.
pub const ADC_FULL_SCALE: u16 = 4095;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleFactors {
    /// ADC reference voltage (mV).
    pub vref_mv: u32,
    /// Count at `vref_mv`.
    pub adc_max: u16,
    /// AC divider ratio x100.
    pub ac_ratio_x100: u32,
    /// Bank divider ratio x100.
    pub bank_ratio_x100: u32,
    /// Current-sense counts per amp.
    pub counts_per_amp: u32,
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self {
            vref_mv: 3300,
            adc_max: ADC_FULL_SCALE,
            ac_ratio_x100: 10_100,
            bank_ratio_x100: 8_300,
            counts_per_amp: 310,
        }
    }
}

impl ScaleFactors {
    pub fn validate(&self) -> Result<()> {
        if self.vref_mv == 0 || self.adc_max == 0 {
            return Err(Error::Config("scale: vref_mv and adc_max must be non-zero"));
        }
        if self.ac_ratio_x100 == 0 || self.bank_ratio_x100 == 0 || self.counts_per_amp == 0 {
            return Err(Error::Config("scale: divider ratios and counts_per_amp must be non-zero"));
        }
        Ok(())
    }

    /// Divider-corrected voltage in millivolts.
    pub fn counts_to_mv(&self, counts: u16, ratio_x100: u32) -> u32 {
        let num = u64::from(counts) * u64::from(self.vref_mv) * u64::from(ratio_x100);
        let den = u64::from(self.adc_max) * 100;
        (num / den) as u32
    }

    /// Load current in milliamps.
    pub fn counts_to_ma(&self, counts: u16) -> u32 {
        u32::from(counts) * 1000 / self.counts_per_amp
    }

    pub fn ac_volts(&self, counts: u16) -> f32 {
        self.counts_to_mv(counts, self.ac_ratio_x100) as f32 / 1000.0
    }

    pub fn bank_volts(&self, counts: u16) -> f32 {
        self.counts_to_mv(counts, self.bank_ratio_x100) as f32 / 1000.0
    }

    pub fn amps(&self, counts: u16) -> f32 {
        self.counts_to_ma(counts) as f32 / 1000.0
    }

    /// Reject counts the converter cannot produce.
    pub fn check_counts(&self, counts: u16) -> core::result::Result<u16, SensorError> {
        if counts > ADC_FULL_SCALE {
            Err(SensorError::OutOfRange)
        } else {
            Ok(counts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_ac_reading() {
        let s = ScaleFactors::default();
        // 4095 counts = 3.3 V at the pin, x101 = 333.3 V
        assert_eq!(s.counts_to_mv(4095, s.ac_ratio_x100), 333_300);
    }

    #[test]
    fn nominal_bank_reading() {
        let s = ScaleFactors::default();
        // 75 V / 83 = 0.9036 V -> ~1121 counts
        let v = s.bank_volts(1121);
        assert!((v - 74.98).abs() < 0.1, "got {v}");
    }

    #[test]
    fn current_sense_scaling() {
        let s = ScaleFactors::default();
        assert_eq!(s.counts_to_ma(310), 1000);
        assert_eq!(s.counts_to_ma(1550), 5000);
        assert!((s.amps(4095) - 13.209).abs() < 0.01);
    }

    #[test]
    fn zero_counts_is_zero() {
        let s = ScaleFactors::default();
        assert_eq!(s.ac_volts(0), 0.0);
        assert_eq!(s.amps(0), 0.0);
    }

    #[test]
    fn counts_above_full_scale_rejected() {
        let s = ScaleFactors::default();
        assert_eq!(s.check_counts(4095), Ok(4095));
        assert_eq!(s.check_counts(4096), Err(SensorError::OutOfRange));
    }
}
