//! Runtime diagnostics.
//!
//! - [`StatusReport`]: a point-in-time snapshot of the supervisor,
//!   serialised to one JSON line for the debug UART.
//! - [`TransitionLog`]: the last [`TRANSITION_HISTORY`] state changes,
//!   kept in a fixed-size ring so it costs nothing on the heap.
//! - [`install_panic_handler`]: logs the panic reason before the
//!   default handler aborts and the watchdog restarts the board.

use heapless::HistoryBuffer;
use serde::Serialize;

use crate::control::discharge::BankDuty;
use crate::error::FaultCode;
use crate::fsm::StateId;
use crate::phase::HalfCycle;
use crate::sensors::SensorFrame;

/// Number of transitions remembered by [`TransitionLog`].
pub const TRANSITION_HISTORY: usize = 16;

// ───────────────────────────────────────────────────────────────
// Status report
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub now_ms: u32,
    pub state: StateId,
    pub fault: FaultCode,
    pub fault_code: u8,
    pub ms_in_state: u32,
    pub frame: SensorFrame,
    pub duty_pos: u16,
    pub duty_neg: u16,
    pub charge_pos: bool,
    pub charge_neg: bool,
    pub polarity: HalfCycle,
    pub edge_count: u32,
    /// No zero-crossing within the configured stale timeout.
    pub mains_stale: bool,
    pub sensor_read_failures: u32,
    pub control_ticks: u64,
}

impl StatusReport {
    pub fn duty(&self) -> BankDuty {
        BankDuty {
            positive: self.duty_pos,
            negative: self.duty_neg,
        }
    }

    /// Single-line JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ───────────────────────────────────────────────────────────────
// Transition history
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub at_ms: u32,
    pub from: StateId,
    pub to: StateId,
}

/// Ring buffer of recent state transitions.  Oldest entries are
/// overwritten once full.
pub struct TransitionLog {
    entries: HistoryBuffer<TransitionRecord, TRANSITION_HISTORY>,
    total: u32,
}

impl TransitionLog {
    pub fn new() -> Self {
        Self {
            entries: HistoryBuffer::new(),
            total: 0,
        }
    }

    pub fn record(&mut self, at_ms: u32, from: StateId, to: StateId) {
        self.entries.write(TransitionRecord { at_ms, from, to });
        self.total = self.total.wrapping_add(1);
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.entries.oldest_ordered()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.entries.recent()
    }

    /// Entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    /// Transitions recorded since boot, including overwritten ones.
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for TransitionLog {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Panic hook
// ───────────────────────────────────────────────────────────────

/// Install a panic hook that logs the reason through `log` before the
/// default handler runs.  Call once during init, after the logger.
pub fn install_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        match info.location() {
            Some(loc) => log::error!("PANIC at {}:{}: {}", loc.file(), loc.line(), reason),
            None => log::error!("PANIC: {}", reason),
        }
        default_hook(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> StatusReport {
        StatusReport {
            now_ms: 1234,
            state: StateId::Boosting,
            fault: FaultCode::None,
            fault_code: 0,
            ms_in_state: 34,
            frame: SensorFrame::new(170.0, 80.0, 79.5, 12.0),
            duty_pos: 440,
            duty_neg: 0,
            charge_pos: false,
            charge_neg: false,
            polarity: HalfCycle::Positive,
            edge_count: 7,
            mains_stale: false,
            sensor_read_failures: 0,
            control_ticks: 1234,
        }
    }

    #[test]
    fn report_serialises_to_one_json_line() {
        let json = report().to_json().unwrap();
        assert!(!json.contains('\n'));
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["state"], "Boosting");
        assert_eq!(v["fault"], "None");
        assert_eq!(v["duty_pos"], 440);
        assert_eq!(v["polarity"], "Positive");
        assert_eq!(v["frame"]["load_a"], 12.0);
    }

    #[test]
    fn report_duty_helper() {
        assert_eq!(
            report().duty(),
            BankDuty {
                positive: 440,
                negative: 0
            }
        );
    }

    #[test]
    fn transition_log_keeps_order() {
        let mut log = TransitionLog::new();
        assert!(log.is_empty());
        log.record(0, StateId::Init, StateId::Charging);
        log.record(5_000, StateId::Charging, StateId::Ready);
        let v: Vec<_> = log.iter().map(|r| r.to).collect();
        assert_eq!(v, [StateId::Charging, StateId::Ready]);
        assert_eq!(log.last().map(|r| r.at_ms), Some(5_000));
    }

    #[test]
    fn transition_log_overwrites_oldest() {
        let mut log = TransitionLog::new();
        for i in 0..(TRANSITION_HISTORY as u32 + 4) {
            log.record(i, StateId::Ready, StateId::Boosting);
        }
        assert_eq!(log.len(), TRANSITION_HISTORY);
        assert_eq!(log.total(), TRANSITION_HISTORY as u32 + 4);
        assert_eq!(log.iter().next().map(|r| r.at_ms), Some(4));
    }
}
