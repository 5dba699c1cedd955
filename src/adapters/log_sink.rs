//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production, stderr on the host).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events logged since construction.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::FaultDetected(code) => {
                error!("FAULT | {} (code {})", code, code.code());
            }
            AppEvent::BoostStarted { duty } => {
                info!("BOOST | start duty={}", duty);
            }
            AppEvent::BoostEnded { elapsed_ms, reason } => {
                info!("BOOST | end after {} ms ({:?})", elapsed_ms, reason);
            }
            AppEvent::CommandRejected(why) => {
                warn!("CMD   | rejected: {}", why);
            }
        }
    }
}
