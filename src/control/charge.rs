//! Charge controller: per-bank charge-path enable.
//!
//! Level-triggered: a bank charges whenever charging is permitted, its
//! voltage is below the charged threshold, and the AC line is inside the
//! safe envelope.  Stateless, so calling it any number of times per tick
//! with the same inputs yields the same decision.

use crate::config::SystemConfig;
use crate::sensors::SensorFrame;

/// Desired state of both charge paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChargeDecision {
    pub positive: bool,
    pub negative: bool,
}

impl ChargeDecision {
    pub const OFF: Self = Self {
        positive: false,
        negative: false,
    };

    pub fn any(&self) -> bool {
        self.positive || self.negative
    }
}

#[derive(Debug, Clone)]
pub struct ChargeController {
    charged_v: f32,
    ac_min_peak_v: f32,
    ac_max_peak_v: f32,
}

impl ChargeController {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            charged_v: config.bank_charged_v,
            ac_min_peak_v: config.ac_min_peak_v,
            ac_max_peak_v: config.ac_max_peak_v,
        }
    }

    /// Decide both charge paths for this tick.
    ///
    /// `permitted` is false in `Fault`, `Boosting` and every state whose
    /// entry action disables all actuators.
    pub fn decide(&self, frame: &SensorFrame, permitted: bool) -> ChargeDecision {
        if !permitted || !self.ac_valid(frame) {
            return ChargeDecision::OFF;
        }
        ChargeDecision {
            positive: frame.bank_pos_v < self.charged_v,
            negative: frame.bank_neg_v < self.charged_v,
        }
    }

    /// Both banks strictly above the charged threshold.
    pub fn both_charged(&self, frame: &SensorFrame) -> bool {
        frame.bank_pos_v > self.charged_v && frame.bank_neg_v > self.charged_v
    }

    fn ac_valid(&self, frame: &SensorFrame) -> bool {
        frame.ac_peak_v >= self.ac_min_peak_v && frame.ac_peak_v <= self.ac_max_peak_v
    }
}
