//! Status indicator patterns.
//!
//! A single on/off LED tells the operator what the supervisor is doing.
//! The FSM picks a pattern on state entry; the service samples it against
//! the time base every tick and drives the LED with the result.
//!
//! | State              | Pattern                                 |
//! |--------------------|-----------------------------------------|
//! | Init, Cooldown, Idle | off                                   |
//! | Charging           | slow blink, 500 ms half-period          |
//! | Ready              | solid on                                |
//! | Boosting           | fast blink, 50 ms half-period           |
//! | Fault              | blink code, one slot per 200 ms         |
//!
//! The fault blink code divides time into 200 ms slots grouped in frames
//! of `code + 1` slots; the LED is lit only in the first slot of each
//! frame.  Overvoltage (1) is a 50 % blink, ChargeTimeout (5) a short
//! flash every 1.2 s.

use serde::Serialize;

use crate::error::FaultCode;
use crate::fsm::StateId;

pub const CHARGING_HALF_PERIOD_MS: u32 = 500;
pub const BOOSTING_HALF_PERIOD_MS: u32 = 50;
pub const FAULT_SLOT_MS: u32 = 200;

/// Pattern identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndicatorPattern {
    Off,
    Solid,
    /// Square wave; on during odd half-periods.
    Blink { half_period_ms: u32 },
    /// Fault blink code for the given numeric fault code.
    FaultCode(u8),
}

impl IndicatorPattern {
    /// Pattern shown while in `state`.  `fault` is only consulted for
    /// `Fault`.
    pub fn for_state(state: StateId, fault: FaultCode) -> Self {
        match state {
            StateId::Init | StateId::Cooldown | StateId::Idle => Self::Off,
            StateId::Charging => Self::Blink {
                half_period_ms: CHARGING_HALF_PERIOD_MS,
            },
            StateId::Ready => Self::Solid,
            StateId::Boosting => Self::Blink {
                half_period_ms: BOOSTING_HALF_PERIOD_MS,
            },
            StateId::Fault => Self::FaultCode(fault.code()),
        }
    }

    /// LED level at `now_ms`.
    pub fn level(&self, now_ms: u32) -> bool {
        match *self {
            Self::Off => false,
            Self::Solid => true,
            Self::Blink { half_period_ms } => (now_ms / half_period_ms.max(1)) & 1 == 1,
            Self::FaultCode(code) => (now_ms / FAULT_SLOT_MS) % (code as u32 + 1) == 0,
        }
    }
}
