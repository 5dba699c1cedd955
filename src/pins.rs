//! GPIO / peripheral pin assignments for the soft-start power board.
//!
//! Single source of truth; every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Zero-cross detector (opto-isolated comparator)
// ---------------------------------------------------------------------------

/// Digital input: rising edge once per AC cycle at the positive-going zero.
pub const ZERO_CROSS_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Analog front end (ADC1, 12 dB attenuation)
// ---------------------------------------------------------------------------

/// Rectified AC line sense divider.  ADC1 channel 0 (GPIO 1 on ESP32-S3).
pub const V_AC_ADC_GPIO: i32 = 1;
/// Positive bank voltage divider.  ADC1 channel 1 (GPIO 2).
pub const V_BANK_POS_ADC_GPIO: i32 = 2;
/// Negative bank voltage divider.  ADC1 channel 2 (GPIO 3).
pub const V_BANK_NEG_ADC_GPIO: i32 = 3;
/// Load current sense amplifier.  ADC1 channel 3 (GPIO 4).
pub const I_LOAD_ADC_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Charge paths (active HIGH, gate driver enables)
// ---------------------------------------------------------------------------

pub const CHARGE_EN_POS_GPIO: i32 = 6;
pub const CHARGE_EN_NEG_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// Discharge switches (LEDC PWM into isolated gate drivers)
// ---------------------------------------------------------------------------

pub const DISCHARGE_PWM_POS_GPIO: i32 = 8;
pub const DISCHARGE_PWM_NEG_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// Status LED (single discrete LED, active HIGH)
// ---------------------------------------------------------------------------

pub const STATUS_LED_GPIO: i32 = 21;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC frequency for both discharge channels (20 kHz, above audible).
pub const DISCHARGE_PWM_FREQ_HZ: u32 = 20_000;
/// LEDC timer resolution (bits).  10-bit gives 0 – 1023 duty levels at 20 kHz.
pub const DISCHARGE_PWM_RESOLUTION_BITS: u32 = 10;
