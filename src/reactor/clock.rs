//! # Periodic-tick deadline with wall-clock drift handling.
//!
//! The reactor keeps one absolute deadline for the next coarse tick and
//! recomputes the remaining wait before every poll. Wall-clock time is used
//! deliberately: detecting that the system time was stepped is part of the
//! job here, and a stepped clock must produce exactly one resynchronizing
//! tick rather than a burst of catch-up ticks (after a forward step) or a
//! long silent gap (after a backward step).
//!
//! ## Rules
//! - deadline in the future by at most one period → wait out the remainder;
//! - deadline passed by up to [`MAX_LATE`] → fire, advance by one period
//!   (slow handlers produce bounded catch-up);
//! - deadline passed by more than [`MAX_LATE`], or deadline more than one
//!   period in the future (clock stepped backward) → fire once and
//!   resynchronize to now + period.

use std::time::{Duration, SystemTime};

/// Coarse tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Lateness beyond which the deadline is resynchronized instead of advanced.
pub const MAX_LATE: Duration = Duration::from_secs(4);

/// What the loop should do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStep {
    /// Block in the poll for at most this long.
    Wait(Duration),
    /// Fire the tick callbacks, then poll without blocking.
    Fire {
        /// The deadline was resynchronized because the clock diverged.
        resync: bool,
    },
}

/// Absolute deadline for the next periodic tick.
#[derive(Debug, Clone, Copy)]
pub struct TickSchedule {
    next: SystemTime,
}

impl TickSchedule {
    pub fn new(now: SystemTime) -> Self {
        Self {
            next: now + TICK_PERIOD,
        }
    }

    /// Evaluates the deadline against `now` and advances it when it fires.
    ///
    /// At most one tick fires per call; the caller polls (with a zero
    /// timeout) between consecutive fires, so readiness is still serviced
    /// while catching up.
    pub fn step(&mut self, now: SystemTime) -> TickStep {
        match self.next.duration_since(now) {
            Ok(remaining) if remaining.is_zero() => {
                self.next += TICK_PERIOD;
                TickStep::Fire { resync: false }
            }
            Ok(remaining) if remaining <= TICK_PERIOD => TickStep::Wait(remaining),
            Ok(_) => {
                // Deadline more than one period ahead: the clock went backward.
                self.next = now + TICK_PERIOD;
                TickStep::Fire { resync: true }
            }
            Err(passed) => {
                if passed.duration() > MAX_LATE {
                    // Most probably the system time was stepped forward.
                    self.next = now + TICK_PERIOD;
                    TickStep::Fire { resync: true }
                } else {
                    self.next += TICK_PERIOD;
                    TickStep::Fire { resync: false }
                }
            }
        }
    }
}
