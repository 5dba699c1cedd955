//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the FSM, safety monitor, phase reference and shared
//! context.  It exposes a hardware-agnostic API; all I/O flows through
//! port traits injected at call sites, making the entire supervisor
//! testable with mock adapters.
//!
//! ```text
//!  SensorSource ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                   │         AppService          │
//!  ChargePath   ◀── │ Safety · FSM · Charge ·     │
//!  DutyOutput   ◀── │ Discharge · Phase           │
//!  StatusIndicator◀─└─────────────────────────────┘
//! ```
//!
//! ## One tick
//!
//! 1. Read the time base and one sensor frame.
//! 2. Take-and-clear the pending zero-crossing.
//! 3. Safety check (skipped in `Init` and `Fault`).  A violation drives
//!    every output off through the ports, records the fault, forces
//!    `Fault` and ends the tick.
//! 4. FSM update.
//! 5. Actuator write-out, ordered so a bank never sees its charge path
//!    and its discharge switch on together.
//! 6. Indicator, transition log and events.

use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::control::discharge::DischargeProfile;
use crate::diagnostics::{StatusReport, TransitionLog};
use crate::error::FaultCode;
use crate::events::IsrShared;
use crate::fsm::context::{ActuatorCommands, FsmContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::phase::PhaseReference;
use crate::safety::SafetyMonitor;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{Bank, ChargePath, DutyOutput, EventSink, Hardware, StatusIndicator};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    safety: SafetyMonitor,
    phase: PhaseReference,
    transitions: TransitionLog,
    sensor_read_failures: u32,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let safety = SafetyMonitor::new(&config);
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Init);

        Self {
            fsm,
            ctx,
            safety,
            phase: PhaseReference::new(),
            transitions: TransitionLog::new(),
            sensor_read_failures: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter `Init` and drive every output to its safe level.
    pub fn start(&mut self, shared: &IsrShared, hw: &mut impl Hardware, sink: &mut impl EventSink) {
        self.push_full_scale(hw);
        self.ctx.now_ms = shared.time.now_ms();
        self.fsm.start(&mut self.ctx);
        self.apply_actuators(hw);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle: sense → safety → FSM → actuators.
    ///
    /// The `hw` parameter satisfies every hardware port at once, which
    /// avoids a double mutable borrow while keeping the port boundary
    /// explicit.
    pub fn tick(
        &mut self,
        shared: &IsrShared,
        hw: &mut impl Hardware,
        sink: &mut impl EventSink,
    ) -> StateId {
        let now = shared.time.now_ms();
        self.ctx.now_ms = now;
        let prev_state = self.fsm.current_state();

        // 1. Sense
        self.ctx.frame = hw.read_frame();
        self.sensor_read_failures = hw.read_failures();

        // 2. Phase
        self.ctx.edge = self.phase.poll(&shared.zero_cross, now);
        self.ctx.polarity = self.phase.polarity();

        // 3. Safety pre-emption
        if !prev_state.skips_safety() {
            if let Err(code) = self.safety.check(&self.ctx.frame) {
                self.trip(code, hw);
                self.after_transition(prev_state, sink);
                return self.fsm.current_state();
            }
        }

        // 4. FSM
        self.fsm.tick(&mut self.ctx);

        // 5. Actuators
        self.apply_actuators(hw);

        // 6. Bookkeeping
        self.after_transition(prev_state, sink);
        self.fsm.current_state()
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.  Returns `true` if it was applied.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl Hardware,
        sink: &mut impl EventSink,
    ) -> bool {
        let prev = self.fsm.current_state();
        let applied = match cmd {
            AppCommand::Reinitialize => {
                self.reinitialize();
                true
            }
            AppCommand::Park => {
                if prev == StateId::Fault {
                    warn!("Park rejected: fault {} requires re-initialisation", self.ctx.fault);
                    sink.emit(&AppEvent::CommandRejected("park while faulted"));
                    false
                } else {
                    self.fsm.force_transition(StateId::Idle, &mut self.ctx);
                    true
                }
            }
            AppCommand::UpdateConfig(new_config) => self.update_config(new_config, hw, sink),
        };

        if applied {
            self.apply_actuators(hw);
            self.after_transition(prev, sink);
        }
        applied
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Recorded fault (`None` unless in `Fault`).
    pub fn fault(&self) -> FaultCode {
        self.ctx.fault
    }

    /// Discharge profile of the boost in progress (all zero otherwise).
    pub fn profile(&self) -> DischargeProfile {
        self.ctx.discharge.profile()
    }

    /// Actuator commands as last written.
    pub fn commands(&self) -> ActuatorCommands {
        self.ctx.commands
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    pub fn transitions(&self) -> &TransitionLog {
        &self.transitions
    }

    /// Control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.fsm.tick_count()
    }

    /// Snapshot for the debug UART.
    pub fn status_report(&self, now_ms: u32) -> StatusReport {
        let cmds = &self.ctx.commands;
        StatusReport {
            now_ms,
            state: self.fsm.current_state(),
            fault: self.ctx.fault,
            fault_code: self.ctx.fault.code(),
            ms_in_state: now_ms.wrapping_sub(self.ctx.state_entry_ms),
            frame: self.ctx.frame,
            duty_pos: cmds.duty.positive,
            duty_neg: cmds.duty.negative,
            charge_pos: cmds.charge.positive,
            charge_neg: cmds.charge.negative,
            polarity: self.phase.polarity(),
            edge_count: self.phase.edge_count(),
            mains_stale: self.phase.is_stale(now_ms, self.ctx.config.zero_cross_stale_ms),
            sensor_read_failures: self.sensor_read_failures,
            control_ticks: self.fsm.tick_count(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Safety violation: outputs off through the ports, then record,
    /// then enter `Fault`.
    fn trip(&mut self, code: FaultCode, hw: &mut (impl ChargePath + DutyOutput + StatusIndicator)) {
        hw.set_duty(Bank::Positive, 0);
        hw.set_duty(Bank::Negative, 0);
        hw.set_charge_enabled(Bank::Positive, false);
        hw.set_charge_enabled(Bank::Negative, false);
        hw.set_indicator(false);

        error!(
            "Safety trip in {}: {} (ac {:.1} V, bank+ {:.1} V, bank- {:.1} V, load {:.1} A)",
            self.fsm.current_state(),
            code,
            self.ctx.frame.ac_peak_v,
            self.ctx.frame.bank_pos_v,
            self.ctx.frame.bank_neg_v,
            self.ctx.frame.load_a
        );
        self.ctx.pending_fault = code;
        self.fsm.force_transition(StateId::Fault, &mut self.ctx);
    }

    /// Full re-initialisation back to `Init`.
    fn reinitialize(&mut self) {
        info!("Re-initialising from {}", self.fsm.current_state());
        self.ctx.pending_fault = FaultCode::None;
        self.fsm.force_transition(StateId::Init, &mut self.ctx);
        self.ctx.fault = FaultCode::None;
        self.ctx.discharge.stop();
        self.ctx.below_since_ms = None;
        self.ctx.state_entry_ms = self.ctx.now_ms;
    }

    fn update_config(
        &mut self,
        new_config: SystemConfig,
        hw: &mut impl Hardware,
        sink: &mut impl EventSink,
    ) -> bool {
        if self.fsm.current_state() == StateId::Boosting {
            warn!("Config update rejected: boost in progress");
            sink.emit(&AppEvent::CommandRejected("config update while boosting"));
            return false;
        }
        if let Err(e) = new_config.validate() {
            warn!("Config update rejected: {}", e);
            sink.emit(&AppEvent::CommandRejected("invalid config"));
            return false;
        }
        self.safety = SafetyMonitor::new(&new_config);
        self.ctx.apply_config(new_config);
        self.push_full_scale(hw);
        info!("Configuration updated at runtime");
        true
    }

    /// Hand the converter scaling and the duty full scale to the hardware
    /// side, so duty counts and ADC counts mean the same thing on both
    /// sides of the ports.
    fn push_full_scale(&self, hw: &mut impl Hardware) {
        hw.set_scale(self.ctx.config.scale);
        hw.set_full_scale(self.ctx.config.pwm_max);
    }

    /// Translate FSM actuator commands into port calls.
    ///
    /// Discharging: charge paths first (off), then the idle bank's duty
    /// (to zero), then the active bank's duty.
    /// Otherwise: duties first (to zero), then charge paths.
    fn apply_actuators(&self, hw: &mut (impl ChargePath + DutyOutput + StatusIndicator)) {
        let cmds = &self.ctx.commands;
        let charge_pos = cmds.charge.positive && cmds.duty.positive == 0;
        let charge_neg = cmds.charge.negative && cmds.duty.negative == 0;

        if cmds.is_discharging() {
            hw.set_charge_enabled(Bank::Positive, charge_pos);
            hw.set_charge_enabled(Bank::Negative, charge_neg);
            if cmds.duty.positive == 0 {
                hw.set_duty(Bank::Positive, 0);
                hw.set_duty(Bank::Negative, cmds.duty.negative);
            } else {
                hw.set_duty(Bank::Negative, 0);
                hw.set_duty(Bank::Positive, cmds.duty.positive);
            }
        } else {
            hw.set_duty(Bank::Positive, 0);
            hw.set_duty(Bank::Negative, 0);
            hw.set_charge_enabled(Bank::Positive, charge_pos);
            hw.set_charge_enabled(Bank::Negative, charge_neg);
        }

        hw.set_indicator(cmds.indicator.level(self.ctx.now_ms));
    }

    /// Log and announce whatever changed since `prev`.
    fn after_transition(&mut self, prev: StateId, sink: &mut impl EventSink) {
        if let Some(summary) = self.ctx.last_boost.take() {
            sink.emit(&AppEvent::BoostEnded {
                elapsed_ms: summary.elapsed_ms,
                reason: summary.reason,
            });
        }

        let now_state = self.fsm.current_state();
        if now_state == prev {
            return;
        }
        self.transitions.record(self.ctx.now_ms, prev, now_state);
        sink.emit(&AppEvent::StateChanged {
            from: prev,
            to: now_state,
        });
        match now_state {
            StateId::Fault => sink.emit(&AppEvent::FaultDetected(self.ctx.fault)),
            StateId::Boosting => sink.emit(&AppEvent::BoostStarted {
                duty: self.ctx.discharge.profile().duty,
            }),
            _ => {}
        }
    }
}
