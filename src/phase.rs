//! Phase reference: AC zero-crossing tracking.
//!
//! Split in two halves across the interrupt boundary:
//!
//! ```text
//!  ZC comparator ─▶ GPIO ISR ─▶ ZeroCrossLatch ──(take-and-clear)──▶ PhaseReference
//!                   (rising     pending flag        next control       polarity,
//!                    edge only)  polarity bit        tick               edge count
//!                               edge counter
//! ```
//!
//! The ISR half only records: it sets the pending flag, toggles polarity
//! and bumps the counter.  All interpretation happens synchronously on the
//! main loop.  No frequency estimation, no PLL: the control tick is assumed
//! to be much shorter than a half-cycle, so every edge is seen.
//!
//! Loss of mains is not detected here; a dead line shows up as
//! `Undervoltage` in the safety monitor's voltage check.  The staleness
//! query below is diagnostic only.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use serde::Serialize;

/// Which half of the AC waveform is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HalfCycle {
    Positive,
    Negative,
}

impl HalfCycle {
    fn from_bit(positive: bool) -> Self {
        if positive {
            Self::Positive
        } else {
            Self::Negative
        }
    }
}

/// One observed zero-crossing, as seen by the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseEvent {
    /// Polarity of the half-cycle that just started.
    pub polarity: HalfCycle,
    /// Total edges recorded since boot (wrapping).
    pub edge_count: u32,
}

// ── ISR half ──────────────────────────────────────────────────

/// Single-slot handoff from the zero-cross interrupt to the main loop.
///
/// One producer (`record_edge`, ISR context) and one consumer (`take`,
/// main loop).  The pending flag is consumed with an atomic swap so an
/// edge is never counted twice.
pub struct ZeroCrossLatch {
    pending: AtomicBool,
    /// `true` = positive half-cycle.
    polarity: AtomicBool,
    edges: AtomicU32,
}

impl ZeroCrossLatch {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            polarity: AtomicBool::new(false),
            edges: AtomicU32::new(0),
        }
    }

    /// Record a rising zero-cross edge.  ISR-safe, lock-free, O(1).
    pub fn record_edge(&self) {
        self.polarity.fetch_xor(true, Ordering::Relaxed);
        self.edges.fetch_add(1, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
    }

    /// Consume the pending edge, if any.  Read-and-clear in one step.
    pub fn take(&self) -> Option<PhaseEvent> {
        if self.pending.swap(false, Ordering::Acquire) {
            Some(PhaseEvent {
                polarity: self.polarity(),
                edge_count: self.edges.load(Ordering::Relaxed),
            })
        } else {
            None
        }
    }

    /// Current polarity without consuming anything.
    pub fn polarity(&self) -> HalfCycle {
        HalfCycle::from_bit(self.polarity.load(Ordering::Relaxed))
    }
}

impl Default for ZeroCrossLatch {
    fn default() -> Self {
        Self::new()
    }
}

// ── Main-loop half ────────────────────────────────────────────

/// Main-loop view of the AC phase.
#[derive(Debug, Clone)]
pub struct PhaseReference {
    polarity: HalfCycle,
    edge_count: u32,
    last_edge_ms: Option<u32>,
}

impl PhaseReference {
    pub fn new() -> Self {
        Self {
            polarity: HalfCycle::Negative,
            edge_count: 0,
            last_edge_ms: None,
        }
    }

    /// Poll the latch once per control tick.  Returns the edge consumed
    /// this tick, if one arrived since the previous poll.
    pub fn poll(&mut self, latch: &ZeroCrossLatch, now_ms: u32) -> Option<PhaseEvent> {
        let event = latch.take()?;
        self.polarity = event.polarity;
        self.edge_count = event.edge_count;
        self.last_edge_ms = Some(now_ms);
        Some(event)
    }

    pub fn polarity(&self) -> HalfCycle {
        self.polarity
    }

    pub fn edge_count(&self) -> u32 {
        self.edge_count
    }

    /// `true` if no edge has been seen within `timeout_ms`.
    pub fn is_stale(&self, now_ms: u32, timeout_ms: u32) -> bool {
        match self.last_edge_ms {
            Some(t) => now_ms.wrapping_sub(t) > timeout_ms,
            None => true,
        }
    }
}

impl Default for PhaseReference {
    fn default() -> Self {
        Self::new()
    }
}
