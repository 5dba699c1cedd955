//! Interrupt-to-main-loop handoff.
//!
//! Exactly two asynchronous producers exist:
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────┐
//! │ 1 ms timer tick  │────▶│  TimeBase    │──┐
//! └──────────────────┘     └──────────────┘  │    ┌──────────────┐
//!                                            ├───▶│  Main loop   │
//! ┌──────────────────┐     ┌──────────────┐  │    │  (consumer)  │
//! │ Zero-cross ISR   │────▶│ ZeroCross-   │──┘    └──────────────┘
//! └──────────────────┘     │ Latch        │
//!                          └──────────────┘
//! ```
//!
//! Each shared variable has one writer and one reader, so atomics are
//! enough: no locks, no critical sections.  Both live in [`IsrShared`],
//! which the binary places in a `static` and tests create on the stack.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::phase::ZeroCrossLatch;

/// Monotonic millisecond counter.  Wraps after ~49 days; all elapsed-time
/// arithmetic uses `wrapping_sub`.
pub struct TimeBase {
    ms: AtomicU32,
}

impl TimeBase {
    pub const fn new() -> Self {
        Self {
            ms: AtomicU32::new(0),
        }
    }

    /// Advance by `ms`.  Only the periodic timer calls this.
    pub fn advance(&self, ms: u32) {
        self.ms.fetch_add(ms, Ordering::Release);
    }

    pub fn now_ms(&self) -> u32 {
        self.ms.load(Ordering::Acquire)
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the interrupt handlers write and the control loop reads.
pub struct IsrShared {
    pub time: TimeBase,
    pub zero_cross: ZeroCrossLatch,
}

impl IsrShared {
    pub const fn new() -> Self {
        Self {
            time: TimeBase::new(),
            zero_cross: ZeroCrossLatch::new(),
        }
    }
}

impl Default for IsrShared {
    fn default() -> Self {
        Self::new()
    }
}
