//! SoftStart Firmware: Main Entry Point
//!
//! Hexagonal architecture with a fixed-period control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter            LogEventSink        NvsAdapter     │
//! │  (Sensor+Charge+Duty+LED)   (EventSink)         (ConfigPort)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  FSM · Safety · Charge · Discharge · Phase             │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  IsrShared (1 ms timebase + zero-cross latch) · TickScheduler  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use log::{info, warn};

use softstart::adapters::hardware::{HardwareAdapter, PowerStage};
use softstart::adapters::log_sink::LogEventSink;
use softstart::adapters::nvs::NvsAdapter;
use softstart::app::service::AppService;
use softstart::config::SystemConfig;
use softstart::diagnostics;
use softstart::drivers::discharge_pwm::DischargePwm;
use softstart::drivers::gate::GpioOutput;
use softstart::drivers::watchdog::Watchdog;
use softstart::drivers::{hw_init, hw_timer};
use softstart::events::IsrShared;
use softstart::pins;
use softstart::scheduler::TickScheduler;
use softstart::sensors::SensorHub;

/// Written by the 1 ms timer and the zero-cross ISR, read by the loop.
static SHARED: IsrShared = IsrShared::new();

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SoftStart v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    diagnostics::install_panic_handler();

    // ── 2. Peripherals: every output LOW before anything else ─
    hw_init::init_peripherals().map_err(|e| anyhow!("peripheral init: {}", e))?;

    // ── 3. Config from NVS (or defaults) ──────────────────────
    let config = match NvsAdapter::new() {
        Ok(nvs) => nvs.load_or_default(),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            SystemConfig::default()
        }
    };
    info!(
        "Config: start>{:.1} A, stop<{:.1} A for {} ms, boost<={} ms, duty {}%..{}% +{}%",
        config.start_detect_a,
        config.stop_detect_a,
        config.boost_stop_dwell_ms,
        config.max_boost_ms,
        config.boost_start_percent,
        config.boost_ceiling_percent,
        config.boost_step_percent
    );

    // ── 4. Adapters ───────────────────────────────────────────
    let mut hw = HardwareAdapter::new(
        SensorHub::new(config.scale),
        PowerStage {
            charge_pos: GpioOutput::new(pins::CHARGE_EN_POS_GPIO),
            charge_neg: GpioOutput::new(pins::CHARGE_EN_NEG_GPIO),
            discharge_pos: DischargePwm::new(hw_init::LEDC_CH_DISCHARGE_POS),
            discharge_neg: DischargePwm::new(hw_init::LEDC_CH_DISCHARGE_NEG),
        },
        GpioOutput::new(pins::STATUS_LED_GPIO),
        config.pwm_max,
    );
    let mut log_sink = LogEventSink::new();

    // ── 5. Service, then the interrupt sources ────────────────
    let mut app = AppService::new(config.clone());
    app.start(&SHARED, &mut hw, &mut log_sink);

    hw_timer::start_tick_timer(&SHARED).map_err(|rc| anyhow!("tick timer rc={}", rc))?;
    hw_init::init_zero_cross_isr(&SHARED).map_err(|e| anyhow!("zero-cross: {}", e))?;

    let mut watchdog = Watchdog::default();
    let mut sched = TickScheduler::new(&config, SHARED.time.now_ms());

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        let now = SHARED.time.now_ms();

        if sched.control_due(now) {
            app.tick(&SHARED, &mut hw, &mut log_sink);
        }

        if sched.report_due(now) {
            match app.status_report(now).to_json() {
                Ok(json) => info!("STATUS {}", json),
                Err(e) => warn!("status report: {}", e),
            }
            if sched.missed_control_ticks() > 0 {
                warn!("control loop overran {} periods", sched.missed_control_ticks());
            }
        }

        watchdog.feed();
        esp_idf_hal::delay::FreeRtos::delay_ms(1);
    }
}
