//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: the latest sensor frame and phase information, the actuator
//! commands they produce, timing, configuration, the recorded fault and
//! the two controllers.  Think of it as the "blackboard" in a blackboard
//! architecture.  Handlers never touch hardware; the application service
//! applies `commands` through the ports after each tick.

use crate::config::SystemConfig;
use crate::control::charge::{ChargeController, ChargeDecision};
use crate::control::discharge::{BankDuty, DischargeController};
use crate::drivers::led_patterns::IndicatorPattern;
use crate::error::FaultCode;
use crate::phase::{HalfCycle, PhaseEvent};
use crate::sensors::SensorFrame;

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// Commands that state handlers write to request actuator actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorCommands {
    /// Charge-path enables, one per bank.
    pub charge: ChargeDecision,
    /// Discharge PWM duty, one per bank.  At most one is non-zero.
    pub duty: BankDuty,
    /// Status indicator pattern.
    pub indicator: IndicatorPattern,
}

impl Default for ActuatorCommands {
    fn default() -> Self {
        Self::all_off()
    }
}

impl ActuatorCommands {
    /// All actuators off: safe default.
    pub const fn all_off() -> Self {
        Self {
            charge: ChargeDecision::OFF,
            duty: BankDuty::ZERO,
            indicator: IndicatorPattern::Off,
        }
    }

    pub fn is_discharging(&self) -> bool {
        self.duty.is_active()
    }
}

// ---------------------------------------------------------------------------
// Boost bookkeeping
// ---------------------------------------------------------------------------

/// Why a boost ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum BoostEndReason {
    /// Maximum boost duration reached.
    Timeout,
    /// Load current stayed below the stop threshold for the dwell time.
    LoadReleased,
    /// Left `Boosting` for any other reason (fault, park command).
    Aborted,
}

/// Outcome of one boost, recorded when `Boosting` is exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoostSummary {
    pub elapsed_ms: u32,
    pub reason: BoostEndReason,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Time base reading for the current tick.
    pub now_ms: u32,
    /// `now_ms` at the moment the current state was entered.
    pub state_entry_ms: u32,

    // -- Inputs --
    /// Sensor frame for this tick.
    pub frame: SensorFrame,
    /// Zero-crossing consumed this tick, if any.
    pub edge: Option<PhaseEvent>,
    /// Half-cycle currently in progress.
    pub polarity: HalfCycle,

    // -- Outputs --
    pub commands: ActuatorCommands,

    // -- Configuration --
    pub config: SystemConfig,

    // -- Fault record --
    /// `!= None` exactly while the FSM is in `Fault`.
    pub fault: FaultCode,
    /// Fault to record on the next entry to `Fault`.  Whoever requests the
    /// transition sets this first.
    pub pending_fault: FaultCode,

    // -- Controllers --
    pub charge: ChargeController,
    pub discharge: DischargeController,

    // -- Boost bookkeeping --
    /// When load current first dropped below the stop threshold.
    pub below_since_ms: Option<u32>,
    /// Set by the `Boosting` handler right before it leaves the state.
    pub boost_end: Option<BoostEndReason>,
    /// Summary of the boost that just ended; the service drains it.
    pub last_boost: Option<BoostSummary>,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            now_ms: 0,
            state_entry_ms: 0,
            frame: SensorFrame::default(),
            edge: None,
            polarity: HalfCycle::Negative,
            commands: ActuatorCommands::all_off(),
            charge: ChargeController::new(&config),
            discharge: DischargeController::new(&config),
            config,
            fault: FaultCode::None,
            pending_fault: FaultCode::None,
            below_since_ms: None,
            boost_end: None,
            last_boost: None,
        }
    }

    /// Swap in a new configuration and rebuild the controllers from it.
    pub fn apply_config(&mut self, config: SystemConfig) {
        self.charge = ChargeController::new(&config);
        self.discharge = DischargeController::new(&config);
        self.config = config;
    }

    /// Milliseconds since the current state was entered.
    pub fn ms_in_state(&self) -> u32 {
        self.now_ms.wrapping_sub(self.state_entry_ms)
    }

    /// Returns `true` if a fault is recorded.
    pub fn has_fault(&self) -> bool {
        self.fault.is_fault()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_off_is_default() {
        let c = ActuatorCommands::default();
        assert_eq!(c, ActuatorCommands::all_off());
        assert!(!c.is_discharging());
    }

    #[test]
    fn ms_in_state_wraps() {
        let mut ctx = FsmContext::new(SystemConfig::default());
        ctx.state_entry_ms = u32::MAX - 9;
        ctx.now_ms = 10;
        assert_eq!(ctx.ms_in_state(), 20);
    }

    #[test]
    fn apply_config_rebuilds_controllers() {
        let mut ctx = FsmContext::new(SystemConfig::default());
        let mut cfg = SystemConfig::default();
        cfg.boost_start_percent = 25;
        ctx.apply_config(cfg);
        ctx.discharge.begin(0);
        assert_eq!(ctx.discharge.profile().duty, 200);
    }
}
