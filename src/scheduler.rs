//! Cooperative loop pacing.
//!
//! The main loop spins on the time base and asks the scheduler which
//! periodic jobs are due:
//!
//! ```text
//!  loop {
//!      now = time.now_ms()
//!      if sched.control_due(now) { app.tick(..) }      // every control period
//!      if sched.report_due(now)  { log status JSON }    // every report interval
//!      watchdog.feed()
//!  }
//! ```
//!
//! A job that is late fires once and is rescheduled one period after
//! `now`; missed periods are dropped, never replayed in a burst.  The
//! control logic is time-based, not tick-counted, so a dropped tick only
//! delays a decision.

use crate::config::SystemConfig;

/// One periodic job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Periodic {
    period_ms: u32,
    next_ms: u32,
    missed: u32,
}

impl Periodic {
    /// Due immediately on the first poll.
    pub const fn new(period_ms: u32, start_ms: u32) -> Self {
        Self {
            period_ms: if period_ms == 0 { 1 } else { period_ms },
            next_ms: start_ms,
            missed: 0,
        }
    }

    /// `true` once per period.  Wrap-safe.
    pub fn due(&mut self, now_ms: u32) -> bool {
        let late = now_ms.wrapping_sub(self.next_ms);
        if late > i32::MAX as u32 {
            // `next_ms` is still in the future.
            return false;
        }
        self.missed = self.missed.saturating_add(late / self.period_ms);
        self.next_ms = now_ms.wrapping_add(self.period_ms);
        true
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Whole periods skipped because the loop was late.
    pub fn missed(&self) -> u32 {
        self.missed
    }
}

/// The two jobs of the main loop.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    control: Periodic,
    report: Periodic,
}

impl TickScheduler {
    pub fn new(config: &SystemConfig, start_ms: u32) -> Self {
        Self {
            control: Periodic::new(config.control_period_ms, start_ms),
            report: Periodic::new(config.report_interval_ms, start_ms),
        }
    }

    pub fn control_due(&mut self, now_ms: u32) -> bool {
        self.control.due(now_ms)
    }

    pub fn report_due(&mut self, now_ms: u32) -> bool {
        self.report.due(now_ms)
    }

    pub fn missed_control_ticks(&self) -> u32 {
        self.control.missed()
    }
}
