//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, count them, etc.

use crate::error::FaultCode;
use crate::fsm::StateId;
use crate::fsm::context::BoostEndReason;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A fault was recorded and every actuator switched off.
    FaultDetected(FaultCode),

    /// A boost began with the given seeded duty.
    BoostStarted { duty: u16 },

    /// A boost ended.
    BoostEnded {
        elapsed_ms: u32,
        reason: BoostEndReason,
    },

    /// A command was refused in the current state.
    CommandRejected(&'static str),
}
