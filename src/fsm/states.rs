//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  INIT ──▶ CHARGING ──[both banks charged]──▶ READY
//!              ▲  │                              │
//!              │  └─[charge timeout]──▶ FAULT    [load > start threshold]
//!              │                                 ▼
//!          COOLDOWN ◀──[max duration | load released]── BOOSTING
//!
//!  Any state except INIT/FAULT ──[safety violation]──▶ FAULT
//!  FAULT, IDLE ──[Reinitialize]──▶ INIT
//! ```
//!
//! Safety pre-emption is not handled here: the service checks the frame
//! before the update handler runs and forces `Fault` itself.

use super::context::{ActuatorCommands, BoostEndReason, BoostSummary, FsmContext};
use super::{StateDescriptor, StateId};
use crate::control::charge::ChargeDecision;
use crate::control::discharge::BankDuty;
use crate::drivers::led_patterns::IndicatorPattern;
use crate::error::FaultCode;
use log::{debug, error, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        StateDescriptor {
            id: StateId::Init,
            name: "Init",
            on_enter: Some(init_enter),
            on_exit: None,
            on_update: init_update,
        },
        StateDescriptor {
            id: StateId::Charging,
            name: "Charging",
            on_enter: Some(charging_enter),
            on_exit: None,
            on_update: charging_update,
        },
        StateDescriptor {
            id: StateId::Ready,
            name: "Ready",
            on_enter: Some(ready_enter),
            on_exit: None,
            on_update: ready_update,
        },
        StateDescriptor {
            id: StateId::Boosting,
            name: "Boosting",
            on_enter: Some(boosting_enter),
            on_exit: Some(boosting_exit),
            on_update: boosting_update,
        },
        StateDescriptor {
            id: StateId::Cooldown,
            name: "Cooldown",
            on_enter: Some(cooldown_enter),
            on_exit: None,
            on_update: cooldown_update,
        },
        StateDescriptor {
            id: StateId::Fault,
            name: "Fault",
            on_enter: Some(fault_enter),
            on_exit: Some(fault_exit),
            on_update: fault_update,
        },
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  INIT
// ═══════════════════════════════════════════════════════════════════════════

fn init_enter(ctx: &mut FsmContext) {
    ctx.commands = ActuatorCommands::all_off();
    ctx.below_since_ms = None;
    ctx.boost_end = None;
    ctx.discharge.stop();
}

fn init_update(_ctx: &mut FsmContext) -> Option<StateId> {
    Some(StateId::Charging)
}

// ═══════════════════════════════════════════════════════════════════════════
//  CHARGING: filling both banks from the line
// ═══════════════════════════════════════════════════════════════════════════

fn charging_enter(ctx: &mut FsmContext) {
    ctx.commands.duty = BankDuty::ZERO;
    ctx.commands.charge = ctx.charge.decide(&ctx.frame, true);
    ctx.commands.indicator = IndicatorPattern::for_state(StateId::Charging, FaultCode::None);
    info!(
        "CHARGING: bank+ {:.1} V, bank- {:.1} V, timeout {} ms",
        ctx.frame.bank_pos_v, ctx.frame.bank_neg_v, ctx.config.charge_timeout_ms
    );
}

fn charging_update(ctx: &mut FsmContext) -> Option<StateId> {
    ctx.commands.charge = ctx.charge.decide(&ctx.frame, true);

    if ctx.charge.both_charged(&ctx.frame) {
        info!(
            "CHARGING: banks charged after {} ms ({:.1} V / {:.1} V)",
            ctx.ms_in_state(),
            ctx.frame.bank_pos_v,
            ctx.frame.bank_neg_v
        );
        return Some(StateId::Ready);
    }

    if ctx.ms_in_state() >= ctx.config.charge_timeout_ms {
        warn!(
            "CHARGING: timed out after {} ms ({:.1} V / {:.1} V)",
            ctx.ms_in_state(),
            ctx.frame.bank_pos_v,
            ctx.frame.bank_neg_v
        );
        ctx.pending_fault = FaultCode::ChargeTimeout;
        return Some(StateId::Fault);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  READY: charged, topping up, watching for a motor start
// ═══════════════════════════════════════════════════════════════════════════

fn ready_enter(ctx: &mut FsmContext) {
    ctx.commands.duty = BankDuty::ZERO;
    ctx.commands.charge = ctx.charge.decide(&ctx.frame, true);
    ctx.commands.indicator = IndicatorPattern::for_state(StateId::Ready, FaultCode::None);
}

fn ready_update(ctx: &mut FsmContext) -> Option<StateId> {
    ctx.commands.charge = ctx.charge.decide(&ctx.frame, true);

    if ctx.frame.load_a > ctx.config.start_detect_a {
        info!("READY: motor start detected at {:.1} A", ctx.frame.load_a);
        return Some(StateId::Boosting);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  BOOSTING: phase-synchronised discharge into the line
// ═══════════════════════════════════════════════════════════════════════════

fn boosting_enter(ctx: &mut FsmContext) {
    ctx.commands.charge = ChargeDecision::OFF;
    ctx.discharge.begin(ctx.now_ms);
    ctx.commands.duty = ctx.discharge.output(ctx.polarity);
    ctx.commands.indicator = IndicatorPattern::for_state(StateId::Boosting, FaultCode::None);
    ctx.below_since_ms = None;
    ctx.boost_end = None;
    info!(
        "BOOSTING: duty seeded at {}/{}",
        ctx.discharge.profile().duty,
        ctx.config.pwm_max
    );
}

fn boosting_exit(ctx: &mut FsmContext) {
    let elapsed_ms = ctx.discharge.update(ctx.now_ms);
    let reason = ctx.boost_end.take().unwrap_or(BoostEndReason::Aborted);
    ctx.discharge.stop();
    ctx.commands.duty = BankDuty::ZERO;
    ctx.below_since_ms = None;
    ctx.last_boost = Some(BoostSummary { elapsed_ms, reason });
    info!("BOOSTING: ended after {} ms ({:?})", elapsed_ms, reason);
}

fn boosting_update(ctx: &mut FsmContext) -> Option<StateId> {
    if let Some(edge) = ctx.edge {
        ctx.discharge.on_half_cycle(&edge);
        debug!(
            "BOOSTING: edge #{} {:?}, duty {}",
            edge.edge_count,
            edge.polarity,
            ctx.discharge.profile().duty
        );
    }
    let elapsed = ctx.discharge.update(ctx.now_ms);

    ctx.commands.charge = ChargeDecision::OFF;
    ctx.commands.duty = ctx.discharge.output(ctx.polarity);

    if elapsed >= ctx.config.max_boost_ms {
        ctx.boost_end = Some(BoostEndReason::Timeout);
        return Some(StateId::Cooldown);
    }

    if ctx.frame.load_a < ctx.config.stop_detect_a {
        let since = *ctx.below_since_ms.get_or_insert(ctx.now_ms);
        if ctx.now_ms.wrapping_sub(since) >= ctx.config.boost_stop_dwell_ms {
            ctx.boost_end = Some(BoostEndReason::LoadReleased);
            return Some(StateId::Cooldown);
        }
    } else {
        ctx.below_since_ms = None;
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLDOWN: everything off before recharging
// ═══════════════════════════════════════════════════════════════════════════

fn cooldown_enter(ctx: &mut FsmContext) {
    ctx.commands = ActuatorCommands::all_off();
}

fn cooldown_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.ms_in_state() >= ctx.config.cooldown_ms {
        return Some(StateId::Charging);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  FAULT: terminal until re-initialisation
// ═══════════════════════════════════════════════════════════════════════════

fn fault_enter(ctx: &mut FsmContext) {
    // Outputs off before the fault is recorded.
    ctx.commands = ActuatorCommands::all_off();
    ctx.discharge.stop();

    let code = core::mem::take(&mut ctx.pending_fault);
    debug_assert!(code.is_fault(), "entered Fault without a fault code");
    ctx.fault = if code.is_fault() {
        code
    } else {
        error!("FAULT: entered without a recorded cause");
        FaultCode::Unclassified
    };
    ctx.commands.indicator = IndicatorPattern::for_state(StateId::Fault, ctx.fault);
    warn!("FAULT: {} (code {}), all actuators disabled", ctx.fault, ctx.fault.code());
}

fn fault_exit(ctx: &mut FsmContext) {
    info!("FAULT: cleared by re-initialisation ({})", ctx.fault);
    ctx.fault = FaultCode::None;
    ctx.commands = ActuatorCommands::all_off();
}

fn fault_update(ctx: &mut FsmContext) -> Option<StateId> {
    ctx.commands.charge = ChargeDecision::OFF;
    ctx.commands.duty = BankDuty::ZERO;
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE: parked
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.commands = ActuatorCommands::all_off();
    info!("IDLE: parked, all actuators disabled");
}

fn idle_update(_ctx: &mut FsmContext) -> Option<StateId> {
    None
}
