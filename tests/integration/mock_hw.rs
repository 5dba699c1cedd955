//! Mock hardware adapter for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history (and its ordering) without touching real GPIO/PWM registers.
//! Sensor frames are injected by the test.

use softstart::app::events::AppEvent;
use softstart::app::ports::{
    Bank, ChargePath, DutyOutput, EventSink, SensorSource, StatusIndicator,
};
use softstart::app::service::AppService;
use softstart::config::SystemConfig;
use softstart::events::IsrShared;
use softstart::fsm::StateId;
use softstart::sensors::{ScaleFactors, SensorFrame};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    Charge(Bank, bool),
    Duty(Bank, u16),
    Indicator(bool),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub frame: SensorFrame,
    pub calls: Vec<HwCall>,
    pub read_failures: u32,
    pub full_scale: u16,
    pub scale: Option<ScaleFactors>,
    charge: [bool; 2],
    duty: [u16; 2],
    indicator: bool,
}

fn slot(bank: Bank) -> usize {
    match bank {
        Bank::Positive => 0,
        Bank::Negative => 1,
    }
}

#[allow(dead_code)]
impl MockHardware {
    /// Healthy mains, empty banks, no load.
    pub fn new() -> Self {
        Self {
            frame: SensorFrame::new(170.0, 0.0, 0.0, 0.0),
            calls: Vec::new(),
            read_failures: 0,
            full_scale: 0,
            scale: None,
            charge: [false; 2],
            duty: [0; 2],
            indicator: false,
        }
    }

    pub fn charge(&self, bank: Bank) -> bool {
        self.charge[slot(bank)]
    }

    pub fn duty(&self, bank: Bank) -> u16 {
        self.duty[slot(bank)]
    }

    pub fn indicator(&self) -> bool {
        self.indicator
    }

    /// `true` if, replaying the recorded calls in order, a bank ever had its
    /// charge path and discharge switch on together, or both banks ever
    /// discharged at once.
    pub fn ever_overlapped(&self) -> bool {
        let mut charge = [false; 2];
        let mut duty = [0u16; 2];
        for call in &self.calls {
            match *call {
                HwCall::Charge(b, on) => charge[slot(b)] = on,
                HwCall::Duty(b, d) => duty[slot(b)] = d,
                HwCall::Indicator(_) => {}
            }
            if (0..2).any(|i| charge[i] && duty[i] != 0) || (duty[0] != 0 && duty[1] != 0) {
                return true;
            }
        }
        false
    }

    /// Calls recorded since `mark`, indicator writes excluded.
    pub fn output_calls_since(&self, mark: usize) -> Vec<HwCall> {
        self.calls[mark..]
            .iter()
            .copied()
            .filter(|c| !matches!(c, HwCall::Indicator(_)))
            .collect()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for MockHardware {
    fn read_frame(&mut self) -> SensorFrame {
        self.frame
    }

    fn read_failures(&self) -> u32 {
        self.read_failures
    }

    fn set_scale(&mut self, scale: ScaleFactors) {
        self.scale = Some(scale);
    }
}

impl ChargePath for MockHardware {
    fn set_charge_enabled(&mut self, bank: Bank, enabled: bool) {
        self.calls.push(HwCall::Charge(bank, enabled));
        self.charge[slot(bank)] = enabled;
    }
}

impl DutyOutput for MockHardware {
    fn set_duty(&mut self, bank: Bank, duty: u16) {
        self.calls.push(HwCall::Duty(bank, duty));
        self.duty[slot(bank)] = duty;
    }

    fn set_full_scale(&mut self, pwm_max: u16) {
        self.full_scale = pwm_max;
    }
}

impl StatusIndicator for MockHardware {
    fn set_indicator(&mut self, on: bool) {
        self.calls.push(HwCall::Indicator(on));
        self.indicator = on;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig: service + shared ISR state + mocks ──────────────────

pub struct Rig {
    pub app: AppService,
    pub shared: IsrShared,
    pub hw: MockHardware,
    pub sink: RecordingSink,
}

/// Charged-bank voltage comfortably between the charged threshold and the max.
pub const CHARGED_V: f32 = 80.0;

#[allow(dead_code)]
impl Rig {
    pub fn new(config: SystemConfig) -> Self {
        let mut rig = Self {
            app: AppService::new(config),
            shared: IsrShared::new(),
            hw: MockHardware::new(),
            sink: RecordingSink::new(),
        };
        rig.app.start(&rig.shared, &mut rig.hw, &mut rig.sink);
        rig
    }

    /// Advance the time base by `ms`, then run one control tick.
    pub fn step(&mut self, ms: u32) -> StateId {
        self.shared.time.advance(ms);
        self.app.tick(&self.shared, &mut self.hw, &mut self.sink)
    }

    /// Latch one zero-crossing for the next tick.
    pub fn edge(&self) {
        self.shared.zero_cross.record_edge();
    }

    /// Init → Charging → Ready with default thresholds.
    pub fn to_ready(&mut self) {
        assert_eq!(self.step(1), StateId::Charging);
        self.hw.frame.bank_pos_v = CHARGED_V;
        self.hw.frame.bank_neg_v = CHARGED_V;
        assert_eq!(self.step(1), StateId::Ready);
    }

    /// Ready → Boosting by presenting a motor-start current.
    pub fn to_boosting(&mut self) {
        self.to_ready();
        self.hw.frame.load_a = 20.0;
        assert_eq!(self.step(1), StateId::Boosting);
    }
}
