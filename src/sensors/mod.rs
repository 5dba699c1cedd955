//! Sensor subsystem: raw ADC sampling and the per-tick [`SensorFrame`].
//!
//! The hub owns the four analog channels and produces a fresh frame each
//! control tick.  Frames are values: never mutated, superseded by the next.

pub mod scaling;

use core::sync::atomic::{AtomicU16, Ordering};

use log::warn;
use serde::Serialize;

use crate::drivers::hw_init;
use crate::error::SensorError;
pub use scaling::ScaleFactors;

/// Physical readings for one control tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorFrame {
    /// AC line voltage, peak volts.
    pub ac_peak_v: f32,
    /// Positive (first half-cycle) bank voltage.
    pub bank_pos_v: f32,
    /// Negative (second half-cycle) bank voltage.
    pub bank_neg_v: f32,
    /// Load current, amps.
    pub load_a: f32,
}

impl SensorFrame {
    pub const fn new(ac_peak_v: f32, bank_pos_v: f32, bank_neg_v: f32, load_a: f32) -> Self {
        Self {
            ac_peak_v,
            bank_pos_v,
            bank_neg_v,
            load_a,
        }
    }

    /// The higher of the two bank voltages.
    pub fn max_bank_v(&self) -> f32 {
        self.bank_pos_v.max(self.bank_neg_v)
    }
}

/// Raw converter counts for the four channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSample {
    pub ac: u16,
    pub bank_pos: u16,
    pub bank_neg: u16,
    pub load: u16,
}

impl RawSample {
    pub fn to_frame(&self, scale: &ScaleFactors) -> SensorFrame {
        SensorFrame {
            ac_peak_v: scale.ac_volts(self.ac),
            bank_pos_v: scale.bank_volts(self.bank_pos),
            bank_neg_v: scale.bank_volts(self.bank_neg),
            load_a: scale.amps(self.load),
        }
    }
}

// ── Host simulation injection ─────────────────────────────────

static SIM_ADC: [AtomicU16; 4] = [
    AtomicU16::new(0),
    AtomicU16::new(0),
    AtomicU16::new(0),
    AtomicU16::new(0),
];

/// Inject raw counts for the simulation ADC (host only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_raw(raw: RawSample) {
    SIM_ADC[0].store(raw.ac, Ordering::Relaxed);
    SIM_ADC[1].store(raw.bank_pos, Ordering::Relaxed);
    SIM_ADC[2].store(raw.bank_neg, Ordering::Relaxed);
    SIM_ADC[3].store(raw.load, Ordering::Relaxed);
}

/// Consecutive failed reads a channel may bridge with its last good
/// value.  Past this the channel reads NaN, which the safety monitor
/// rejects.
pub const MAX_HELD_READS: u8 = 3;

const CHANNELS: [u32; 4] = [
    hw_init::ADC1_CH_V_AC,
    hw_init::ADC1_CH_V_BANK_POS,
    hw_init::ADC1_CH_V_BANK_NEG,
    hw_init::ADC1_CH_I_LOAD,
];

/// Aggregates the four analog channels into frames.
pub struct SensorHub {
    scale: ScaleFactors,
    last_good: RawSample,
    held: [u8; 4],
    read_failures: u32,
}

impl SensorHub {
    pub fn new(scale: ScaleFactors) -> Self {
        Self {
            scale,
            last_good: RawSample::default(),
            held: [0; 4],
            read_failures: 0,
        }
    }

    pub fn set_scale(&mut self, scale: ScaleFactors) {
        self.scale = scale;
    }

    /// Sample every channel and convert.
    ///
    /// A failed or implausible channel read is logged and the previous good
    /// value for that channel is kept for up to [`MAX_HELD_READS`] ticks in
    /// a row.  A channel that stays dead after that reads NaN.
    pub fn read_frame(&mut self) -> SensorFrame {
        let reads = core::array::from_fn(|slot| {
            if cfg!(target_os = "espidf") {
                hw_init::adc1_read(CHANNELS[slot])
            } else {
                Ok(SIM_ADC[slot].load(Ordering::Relaxed))
            }
        });
        self.ingest(reads)
    }

    /// Total channel reads that fell back to a previous value.
    pub fn read_failures(&self) -> u32 {
        self.read_failures
    }

    fn ingest(&mut self, reads: [Result<u16, SensorError>; 4]) -> SensorFrame {
        let prev = [
            self.last_good.ac,
            self.last_good.bank_pos,
            self.last_good.bank_neg,
            self.last_good.load,
        ];
        let mut counts = prev;
        for (i, read) in reads.into_iter().enumerate() {
            match read.and_then(|c| self.scale.check_counts(c)) {
                Ok(c) => {
                    counts[i] = c;
                    self.held[i] = 0;
                }
                Err(e) => {
                    self.read_failures = self.read_failures.saturating_add(1);
                    self.held[i] = self.held[i].saturating_add(1);
                    if self.held[i] > MAX_HELD_READS {
                        warn!("ADC ch{}: {e}, {} failures in a row", CHANNELS[i], self.held[i]);
                    } else {
                        warn!("ADC ch{}: {e}, holding previous value {}", CHANNELS[i], prev[i]);
                    }
                }
            }
        }

        self.last_good = RawSample {
            ac: counts[0],
            bank_pos: counts[1],
            bank_neg: counts[2],
            load: counts[3],
        };
        let mut frame = self.last_good.to_frame(&self.scale);
        let dead = self.held.map(|n| n > MAX_HELD_READS);
        if dead[0] {
            frame.ac_peak_v = f32::NAN;
        }
        if dead[1] {
            frame.bank_pos_v = f32::NAN;
        }
        if dead[2] {
            frame.bank_neg_v = f32::NAN;
        }
        if dead[3] {
            frame.load_a = f32::NAN;
        }
        frame
    }
}
