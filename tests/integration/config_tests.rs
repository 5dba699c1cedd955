//! Configuration persistence and runtime replacement, end to end.

use super::mock_hw::{MockHardware, RecordingSink, Rig};

use softstart::adapters::hardware::{HardwareAdapter, PowerStage};
use softstart::adapters::log_sink::LogEventSink;
use softstart::adapters::nvs::NvsAdapter;
use softstart::app::commands::AppCommand;
use softstart::app::ports::{ConfigError, ConfigPort};
use softstart::app::service::AppService;
use softstart::config::SystemConfig;
use softstart::drivers::discharge_pwm::DischargePwm;
use softstart::drivers::gate::GpioOutput;
use softstart::drivers::hw_init;
use softstart::events::IsrShared;
use softstart::fsm::StateId;
use softstart::sensors::{RawSample, SensorHub, sim_set_raw};

#[test]
fn persisted_config_drives_the_supervisor() {
    let nvs = NvsAdapter::new().unwrap();
    let mut cfg = SystemConfig::default();
    cfg.cooldown_ms = 200;
    nvs.save(&cfg).unwrap();

    let mut r = Rig::new(nvs.load().unwrap());
    r.to_boosting();
    let max_boost = r.app.config().max_boost_ms;
    r.step(max_boost);
    assert_eq!(r.app.state(), StateId::Cooldown);
    assert_eq!(r.step(199), StateId::Cooldown);
    assert_eq!(r.step(1), StateId::Charging);
}

#[test]
fn rejected_save_leaves_previous_config() {
    let nvs = NvsAdapter::new().unwrap();
    let mut good = SystemConfig::default();
    good.start_detect_a = 6.0;
    nvs.save(&good).unwrap();

    let mut bad = good.clone();
    bad.boost_start_percent = 90; // above the 80% ceiling
    assert!(matches!(nvs.save(&bad), Err(ConfigError::ValidationFailed(_))));
    assert_eq!(nvs.load().unwrap().start_detect_a, 6.0);
}

#[test]
fn runtime_threshold_change_takes_effect() {
    let mut r = Rig::new(SystemConfig::default());
    r.to_ready();

    let mut cfg = SystemConfig::default();
    cfg.start_detect_a = 10.0;
    cfg.stop_detect_a = 8.0;
    assert!(r.app.handle_command(AppCommand::UpdateConfig(cfg), &mut r.hw, &mut r.sink));

    r.hw.frame.load_a = 7.0;
    assert_eq!(r.step(1), StateId::Ready, "7 A is below the new start threshold");
    r.hw.frame.load_a = 12.0;
    assert_eq!(r.step(1), StateId::Boosting);
}

#[test]
fn log_sink_counts_events() {
    let shared = IsrShared::new();
    let mut hw = MockHardware::new();
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(SystemConfig::default());
    app.start(&shared, &mut hw, &mut sink);
    shared.time.advance(1);
    app.tick(&shared, &mut hw, &mut sink);
    // Started + StateChanged(Init -> Charging)
    assert_eq!(sink.emitted(), 2);
}

#[test]
fn runtime_full_scale_change_reaches_the_pwm_and_adc() {
    // 170 V mains, both banks at 80 V, no load.
    let mut raw = RawSample {
        ac: 2089,
        bank_pos: 1196,
        bank_neg: 1196,
        load: 0,
    };
    sim_set_raw(raw);

    let boot = SystemConfig::default();
    let shared = IsrShared::new();
    let mut sink = RecordingSink::new();
    let mut hw = HardwareAdapter::new(
        SensorHub::new(boot.scale),
        PowerStage {
            charge_pos: GpioOutput::new(6),
            charge_neg: GpioOutput::new(7),
            discharge_pos: DischargePwm::new(hw_init::LEDC_CH_DISCHARGE_POS),
            discharge_neg: DischargePwm::new(hw_init::LEDC_CH_DISCHARGE_NEG),
        },
        GpioOutput::new(21),
        boot.pwm_max,
    );
    let mut app = AppService::new(boot);
    app.start(&shared, &mut hw, &mut sink);
    let mut step = |app: &mut AppService, hw: &mut HardwareAdapter<GpioOutput, DischargePwm>| {
        shared.time.advance(1);
        app.tick(&shared, hw, &mut sink)
    };
    assert_eq!(step(&mut app, &mut hw), StateId::Charging);
    assert_eq!(step(&mut app, &mut hw), StateId::Ready);

    let mut cfg = SystemConfig::default();
    cfg.pwm_max = 1000;
    cfg.scale.counts_per_amp = 155;
    assert!(app.handle_command(AppCommand::UpdateConfig(cfg), &mut hw, &mut RecordingSink::new()));

    // 1550 counts is 5 A at the boot scale, 10 A at the new one.
    raw.load = 1550;
    sim_set_raw(raw);
    assert_eq!(step(&mut app, &mut hw), StateId::Boosting);

    for _ in 0..10 {
        shared.zero_cross.record_edge();
        step(&mut app, &mut hw);
    }
    assert_eq!(app.profile().duty, 800, "80% of the new full scale");

    let pos = hw.stage().discharge_pos.duty();
    let neg = hw.stage().discharge_neg.duty();
    assert_eq!(pos.min(neg), 0);
    // 800 / 1000 of the 10-bit LEDC range, not full on.
    assert_eq!(pos.max(neg), 818);
    assert_eq!(hw.write_failures(), 0);
}
