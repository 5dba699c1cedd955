//! Integration tests for the AppService → FSM → ports pipeline.
//!
//! These run on the host (x86_64) and drive the supervisor tick by tick
//! through a recording mock, with time and zero-crossings injected via
//! the same `IsrShared` the firmware's interrupt handlers write.

use super::mock_hw::{CHARGED_V, HwCall, Rig};

use softstart::app::commands::AppCommand;
use softstart::app::events::AppEvent;
use softstart::app::ports::Bank;
use softstart::config::SystemConfig;
use softstart::error::FaultCode;
use softstart::fsm::StateId;
use softstart::fsm::context::BoostEndReason;

fn rig() -> Rig {
    Rig::new(SystemConfig::default())
}

// ── Start-up and charging ─────────────────────────────────────

#[test]
fn start_drives_every_output_off() {
    let r = rig();
    assert_eq!(r.app.state(), StateId::Init);
    assert!(!r.hw.charge(Bank::Positive) && !r.hw.charge(Bank::Negative));
    assert_eq!(r.hw.duty(Bank::Positive), 0);
    assert_eq!(r.hw.duty(Bank::Negative), 0);
    assert_eq!(r.hw.full_scale, r.app.config().pwm_max);
    assert!(r.sink.contains(&AppEvent::Started(StateId::Init)));
}

#[test]
fn init_tick_enters_charging_with_both_paths_on() {
    let mut r = rig();
    assert_eq!(r.step(1), StateId::Charging);
    assert!(r.hw.charge(Bank::Positive));
    assert!(r.hw.charge(Bank::Negative));
    assert_eq!(r.hw.duty(Bank::Positive), 0);
    assert_eq!(r.hw.duty(Bank::Negative), 0);
}

#[test]
fn charged_bank_stops_charging_alone() {
    let mut r = rig();
    r.step(1);
    r.hw.frame.bank_pos_v = CHARGED_V;
    assert_eq!(r.step(1), StateId::Charging);
    assert!(!r.hw.charge(Bank::Positive));
    assert!(r.hw.charge(Bank::Negative));
}

#[test]
fn both_banks_charged_reaches_ready() {
    let mut r = rig();
    r.to_ready();
    assert!(r.hw.indicator(), "Ready shows a solid indicator");
    assert!(r.sink.contains(&AppEvent::StateChanged {
        from: StateId::Charging,
        to: StateId::Ready
    }));
}

#[test]
fn charge_timeout_fires_at_exactly_the_configured_time() {
    let mut r = rig();
    r.step(1);
    let timeout = SystemConfig::default().charge_timeout_ms;

    assert_eq!(r.step(timeout - 1), StateId::Charging);
    assert_eq!(r.step(1), StateId::Fault);
    assert_eq!(r.app.fault(), FaultCode::ChargeTimeout);
    assert!(!r.hw.charge(Bank::Positive) && !r.hw.charge(Bank::Negative));
}

// ── Safety boundaries ─────────────────────────────────────────

#[test]
fn ac_exactly_at_limits_is_safe() {
    let mut r = rig();
    r.step(1);
    r.hw.frame.ac_peak_v = 90.0;
    assert_eq!(r.step(1), StateId::Charging);
    r.hw.frame.ac_peak_v = 200.0;
    assert_eq!(r.step(1), StateId::Charging);
    r.hw.frame.ac_peak_v = 200.5;
    assert_eq!(r.step(1), StateId::Fault);
    assert_eq!(r.app.fault(), FaultCode::Overvoltage);
}

#[test]
fn overcurrent_in_ready_trips() {
    let mut r = rig();
    r.to_ready();
    r.hw.frame.load_a = 45.0;
    assert_eq!(r.step(1), StateId::Fault);
    assert_eq!(r.app.fault(), FaultCode::Overcurrent);
}

// ── Boosting ──────────────────────────────────────────────────

#[test]
fn motor_start_enters_boosting_same_tick() {
    let mut r = rig();
    r.to_ready();
    r.hw.frame.load_a = 20.0;
    let mark = r.hw.calls.len();

    assert_eq!(r.step(1), StateId::Boosting);

    // No edge yet: the negative half-cycle is assumed, 50% of 800 counts.
    assert_eq!(r.hw.duty(Bank::Negative), 400);
    assert_eq!(r.hw.duty(Bank::Positive), 0);
    assert!(!r.hw.charge(Bank::Positive) && !r.hw.charge(Bank::Negative));

    // Discharging: charge paths go off before any duty is raised.
    assert_eq!(
        r.hw.output_calls_since(mark),
        [
            HwCall::Charge(Bank::Positive, false),
            HwCall::Charge(Bank::Negative, false),
            HwCall::Duty(Bank::Positive, 0),
            HwCall::Duty(Bank::Negative, 400),
        ]
    );
    assert!(r.sink.contains(&AppEvent::BoostStarted { duty: 400 }));
}

#[test]
fn ten_half_cycles_ramp_and_saturate() {
    let mut r = rig();
    r.to_boosting();
    let mut prev = 400;

    for n in 1..=10 {
        r.edge();
        r.step(1);
        let pos = r.hw.duty(Bank::Positive);
        let neg = r.hw.duty(Bank::Negative);
        assert!(pos == 0 || neg == 0, "both banks driven on edge {n}");
        let duty = pos.max(neg);
        assert!(duty >= prev && duty <= 640, "edge {n}: duty {duty}");
        // Odd edges start a positive half-cycle.
        if n % 2 == 1 {
            assert_eq!(neg, 0);
        } else {
            assert_eq!(pos, 0);
        }
        prev = duty;
    }

    assert_eq!(prev, 640);
    assert_eq!(r.app.profile().duty, 640);
}

#[test]
fn polarity_flip_zeroes_the_old_bank_before_driving_the_new_one() {
    let mut r = rig();
    r.to_boosting();
    assert_eq!(r.hw.duty(Bank::Negative), 400);

    let mark = r.hw.calls.len();
    r.edge();
    r.step(1);
    assert_eq!(
        r.hw.output_calls_since(mark),
        [
            HwCall::Charge(Bank::Positive, false),
            HwCall::Charge(Bank::Negative, false),
            HwCall::Duty(Bank::Negative, 0),
            HwCall::Duty(Bank::Positive, 440),
        ]
    );

    let mark = r.hw.calls.len();
    r.edge();
    r.step(1);
    assert_eq!(
        r.hw.output_calls_since(mark)[2..],
        [HwCall::Duty(Bank::Positive, 0), HwCall::Duty(Bank::Negative, 480)]
    );
    assert!(!r.hw.ever_overlapped());
}

#[test]
fn bank_overvoltage_during_boost_zeroes_duty_same_tick() {
    let mut r = rig();
    r.to_boosting();
    r.hw.frame.bank_pos_v = 90.0;
    let mark = r.hw.calls.len();

    assert_eq!(r.step(1), StateId::Fault);
    assert_eq!(r.app.fault(), FaultCode::BankOvervoltage);
    assert_eq!(r.hw.duty(Bank::Positive), 0);
    assert_eq!(r.hw.duty(Bank::Negative), 0);
    assert_eq!(
        r.hw.output_calls_since(mark),
        [
            HwCall::Duty(Bank::Positive, 0),
            HwCall::Duty(Bank::Negative, 0),
            HwCall::Charge(Bank::Positive, false),
            HwCall::Charge(Bank::Negative, false),
        ]
    );
    assert!(r.sink.contains(&AppEvent::FaultDetected(FaultCode::BankOvervoltage)));
    assert!(r.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::BoostEnded {
            reason: BoostEndReason::Aborted,
            ..
        }
    )));
}

#[test]
fn boost_ends_at_max_duration() {
    let mut r = rig();
    r.to_boosting();
    let max = SystemConfig::default().max_boost_ms;

    assert_eq!(r.step(max - 1), StateId::Boosting);
    assert_eq!(r.step(1), StateId::Cooldown);
    assert_eq!(r.hw.duty(Bank::Positive), 0);
    assert_eq!(r.hw.duty(Bank::Negative), 0);
    assert!(r.sink.contains(&AppEvent::BoostEnded {
        elapsed_ms: max,
        reason: BoostEndReason::Timeout
    }));
}

#[test]
fn load_release_needs_full_dwell() {
    let mut r = rig();
    r.to_boosting();
    let dwell = SystemConfig::default().boost_stop_dwell_ms;

    r.hw.frame.load_a = 2.0;
    assert_eq!(r.step(1), StateId::Boosting);
    assert_eq!(r.step(dwell - 1), StateId::Boosting);
    assert_eq!(r.step(1), StateId::Cooldown);
    assert!(r.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::BoostEnded {
            reason: BoostEndReason::LoadReleased,
            ..
        }
    )));
}

#[test]
fn brief_current_dip_does_not_end_boost() {
    let mut r = rig();
    r.to_boosting();

    r.hw.frame.load_a = 2.0;
    r.step(1);
    r.step(30);
    r.hw.frame.load_a = 15.0;
    r.step(1);
    r.hw.frame.load_a = 2.0;
    r.step(1);
    assert_eq!(r.step(30), StateId::Boosting, "dwell restarts after the dip");
}

#[test]
fn load_between_thresholds_keeps_boosting() {
    let mut r = rig();
    r.to_boosting();
    r.hw.frame.load_a = 4.5;
    for _ in 0..10 {
        assert_eq!(r.step(10), StateId::Boosting);
    }
}

// ── Cooldown ──────────────────────────────────────────────────

#[test]
fn cooldown_holds_for_exactly_its_period() {
    let mut r = rig();
    r.to_boosting();
    r.step(SystemConfig::default().max_boost_ms);
    assert_eq!(r.app.state(), StateId::Cooldown);
    let cooldown = SystemConfig::default().cooldown_ms;

    assert_eq!(r.step(cooldown - 1), StateId::Cooldown);
    assert!(!r.hw.charge(Bank::Positive) && !r.hw.charge(Bank::Negative));
    assert_eq!(r.step(1), StateId::Charging);
}

// ── Fault and commands ────────────────────────────────────────

#[test]
fn fault_is_sticky_until_reinitialised() {
    let mut r = rig();
    r.step(1);
    r.hw.frame.ac_peak_v = 50.0;
    assert_eq!(r.step(1), StateId::Fault);

    // Conditions recover; the fault stays.
    r.hw.frame.ac_peak_v = 170.0;
    for _ in 0..5 {
        assert_eq!(r.step(100), StateId::Fault);
        assert_eq!(r.app.fault(), FaultCode::Undervoltage);
    }
    assert!(!r.app.handle_command(AppCommand::Park, &mut r.hw, &mut r.sink));

    assert!(r.app.handle_command(AppCommand::Reinitialize, &mut r.hw, &mut r.sink));
    assert_eq!(r.app.state(), StateId::Init);
    assert_eq!(r.app.fault(), FaultCode::None);
    assert_eq!(r.step(1), StateId::Charging);
}

#[test]
fn fault_indicator_blinks_its_code() {
    let mut r = rig();
    r.step(1);
    r.hw.frame.ac_peak_v = 250.0; // Overvoltage, code 1: on one slot in two
    r.step(1);
    assert_eq!(r.app.fault().code(), 1);

    let mut levels = Vec::new();
    for _ in 0..4 {
        r.step(200);
        levels.push(r.hw.indicator());
    }
    assert!(levels.contains(&true) && levels.contains(&false));
}

#[test]
fn park_from_ready_disables_everything() {
    let mut r = rig();
    r.to_ready();
    assert!(r.app.handle_command(AppCommand::Park, &mut r.hw, &mut r.sink));
    assert_eq!(r.app.state(), StateId::Idle);
    assert!(!r.hw.charge(Bank::Positive) && !r.hw.charge(Bank::Negative));
    assert!(!r.hw.indicator());

    r.hw.frame.load_a = 20.0;
    assert_eq!(r.step(1), StateId::Idle, "Idle ignores motor starts");
}

#[test]
fn config_update_rejected_while_boosting() {
    let mut r = rig();
    r.to_boosting();
    let mut cfg = SystemConfig::default();
    cfg.max_boost_ms = 300;
    assert!(!r.app.handle_command(AppCommand::UpdateConfig(cfg.clone()), &mut r.hw, &mut r.sink));
    assert_eq!(r.app.config().max_boost_ms, 500);

    r.step(500);
    assert_eq!(r.app.state(), StateId::Cooldown);
    assert!(r.app.handle_command(AppCommand::UpdateConfig(cfg), &mut r.hw, &mut r.sink));
    assert_eq!(r.app.config().max_boost_ms, 300);
}

#[test]
fn full_cycle_never_overlaps_charge_and_discharge() {
    let mut r = rig();
    r.to_boosting();
    for _ in 0..8 {
        r.edge();
        r.step(5);
    }
    r.hw.frame.load_a = 1.0;
    r.step(1);
    r.step(60);
    assert_eq!(r.app.state(), StateId::Cooldown);
    r.step(1_000);
    assert_eq!(r.app.state(), StateId::Charging);

    assert!(!r.hw.ever_overlapped());
}

// ── Diagnostics ───────────────────────────────────────────────

#[test]
fn status_report_during_boost() {
    let mut r = rig();
    r.to_boosting();
    r.edge();
    r.step(1);

    let report = r.app.status_report(r.shared.time.now_ms());
    assert_eq!(report.state, StateId::Boosting);
    assert_eq!(report.duty_pos, 440);
    assert_eq!(report.duty_neg, 0);
    assert!(!report.charge_pos && !report.charge_neg);
    assert_eq!(report.edge_count, 1);

    let json = report.to_json().unwrap();
    assert!(json.contains("\"state\":\"Boosting\""));
}

#[test]
fn transition_log_records_the_cycle() {
    let mut r = rig();
    r.to_boosting();
    let to: Vec<StateId> = r.app.transitions().iter().map(|t| t.to).collect();
    assert_eq!(to, [StateId::Charging, StateId::Ready, StateId::Boosting]);
}
