//! Discharge controller: phase-synchronised current injection.
//!
//! During a boost the active bank is switched by PWM so the injected
//! current follows the rectified AC waveform:
//!
//! ```text
//!  duty
//!  ceiling ┤            ┌──────┬──────┬──────
//!          │       ┌────┘
//!          │  ┌────┘
//!  start   ┼──┘
//!          └──┴────┴────┴──────┴──────┴──────▶ half-cycles
//!          entry  +step per zero-crossing, saturating
//! ```
//!
//! - Entry seeds the duty at a fixed fraction of full scale: the motor
//!   start surge has to be met immediately, not after a ramp from zero.
//! - Each polarity toggle adds one step, saturating at the ceiling.  The
//!   ceiling bounds peak injected current regardless of stored energy.
//! - Only the bank matching the current half-cycle gets a non-zero duty.

use crate::config::SystemConfig;
use crate::phase::{HalfCycle, PhaseEvent};

/// Transient state of one boost.  All zero outside `Boosting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DischargeProfile {
    /// Current duty magnitude, `0..=pwm_max`.
    pub duty: u16,
    /// Increment applied per half-cycle.
    pub step: u16,
    /// Time since the boost began.
    pub elapsed_ms: u32,
}

/// Duty for each bank's discharge switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BankDuty {
    pub positive: u16,
    pub negative: u16,
}

impl BankDuty {
    pub const ZERO: Self = Self {
        positive: 0,
        negative: 0,
    };

    pub fn is_active(&self) -> bool {
        self.positive != 0 || self.negative != 0
    }
}

#[derive(Debug, Clone)]
pub struct DischargeController {
    pwm_max: u16,
    start_duty: u16,
    ceiling: u16,
    step: u16,
    started_ms: Option<u32>,
    profile: DischargeProfile,
}

impl DischargeController {
    pub fn new(config: &SystemConfig) -> Self {
        let ceiling = config.pwm_counts(config.boost_ceiling_percent).min(config.pwm_max);
        Self {
            pwm_max: config.pwm_max,
            start_duty: config.pwm_counts(config.boost_start_percent).min(ceiling),
            ceiling,
            step: config.pwm_counts(config.boost_step_percent).max(1),
            started_ms: None,
            profile: DischargeProfile::default(),
        }
    }

    /// Start a boost: seed the duty.
    pub fn begin(&mut self, now_ms: u32) {
        self.started_ms = Some(now_ms);
        self.profile = DischargeProfile {
            duty: self.start_duty,
            step: self.step,
            elapsed_ms: 0,
        };
    }

    /// One half-cycle has passed: ramp by one step.
    pub fn on_half_cycle(&mut self, _event: &PhaseEvent) {
        if self.started_ms.is_none() {
            return;
        }
        self.profile.duty = self.profile.duty.saturating_add(self.step).min(self.ceiling);
    }

    /// Refresh elapsed time; returns it.
    pub fn update(&mut self, now_ms: u32) -> u32 {
        if let Some(start) = self.started_ms {
            self.profile.elapsed_ms = now_ms.wrapping_sub(start);
        }
        self.profile.elapsed_ms
    }

    /// Duty per bank for the half-cycle in progress.  At most one non-zero.
    pub fn output(&self, polarity: HalfCycle) -> BankDuty {
        if self.started_ms.is_none() {
            return BankDuty::ZERO;
        }
        let duty = self.profile.duty.min(self.pwm_max);
        match polarity {
            HalfCycle::Positive => BankDuty {
                positive: duty,
                negative: 0,
            },
            HalfCycle::Negative => BankDuty {
                positive: 0,
                negative: duty,
            },
        }
    }

    /// End the boost: duty to zero, profile reset.
    pub fn stop(&mut self) {
        self.started_ms = None;
        self.profile = DischargeProfile::default();
    }

    pub fn is_active(&self) -> bool {
        self.started_ms.is_some()
    }

    pub fn profile(&self) -> DischargeProfile {
        self.profile
    }

    pub fn ceiling(&self) -> u16 {
        self.ceiling
    }
}
