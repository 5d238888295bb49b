//! clock.rs
//!
//! The time-of-day half of the engine: a chain of three digit marks (hour,
//! minute, second). Two layers of behavior live here:
//!
//! 1. **Whole-triple reset** (`reset_prev`, `reset_next`): snap an
//!    arbitrary wall time to the greatest admissible triple at-or-before it
//!    (or the least at-or-after), reporting whether the snap moved anything
//!    and whether it wrapped into the neighboring day.
//! 2. **Aligned travel** (`prev`, `next`): from the snapped triple, step
//!    the requested number of admissible firings, composing borrows and
//!    carries from seconds through minutes into hours. The returned
//!    borrow/carry counts whole days and feeds the calendar half.
//!
//! The leap count is literal seconds exactly when all three marks are the
//! wildcard; otherwise it counts admissible clock firings.

use crate::error::Error;
use crate::mark::{Mark, Spec};

/// An (hour, minute, second) triple, each 0-based.
pub type TimeOfDay = (u32, u32, u32);

/// Constraint chain over the three clock digits.
#[derive(Debug, Clone)]
pub struct Clock {
    hour: Mark,
    minute: Mark,
    second: Mark,
}

impl Clock {
    pub fn new(hour: &Spec, minute: &Spec, second: &Spec) -> Result<Self, Error> {
        Ok(Clock {
            hour: Mark::build(hour, 23, "hour")?,
            minute: Mark::build(minute, 59, "minute")?,
            second: Mark::build(second, 59, "second")?,
        })
    }

    pub fn contains(&self, now: TimeOfDay) -> bool {
        self.hour.contains(now.0) && self.minute.contains(now.1) && self.second.contains(now.2)
    }

    /// Greatest admissible triple at-or-before `now`. Returns the triple,
    /// the reset cost (0 when `now` is already admissible, 1 otherwise)
    /// and a borrow of 1 when the snap wrapped into the previous day.
    pub fn reset_prev(&self, now: TimeOfDay) -> (TimeOfDay, u64, u64) {
        let (h, m, s) = now;
        if self.hour.contains(h) {
            if self.minute.contains(m) {
                if self.second.contains(s) {
                    return (now, 0, 0);
                }
                let (s2, borrow) = self.second.prev(s, 1);
                if borrow == 0 {
                    return ((h, m, s2), 1, 0);
                }
            }
            let (m2, borrow) = self.minute.prev(m, 1);
            if borrow == 0 {
                return ((h, m2, self.second.last_opt().unwrap_or(0)), 1, 0);
            }
        }
        let (h2, borrow) = self.hour.prev(h, 1);
        let m2 = self.minute.last_opt().unwrap_or(0);
        let s2 = self.second.last_opt().unwrap_or(0);
        ((h2, m2, s2), 1, borrow)
    }

    /// Least admissible triple at-or-after `now`; carry of 1 when the snap
    /// wrapped into the next day. Mirror of [`Clock::reset_prev`].
    pub fn reset_next(&self, now: TimeOfDay) -> (TimeOfDay, u64, u64) {
        let (h, m, s) = now;
        if self.hour.contains(h) {
            if self.minute.contains(m) {
                if self.second.contains(s) {
                    return (now, 0, 0);
                }
                let (s2, carry) = self.second.next(s, 1);
                if carry == 0 {
                    return ((h, m, s2), 1, 0);
                }
            }
            let (m2, carry) = self.minute.next(m, 1);
            if carry == 0 {
                return ((h, m2, self.second.first_opt().unwrap_or(0)), 1, 0);
            }
        }
        let (h2, carry) = self.hour.next(h, 1);
        let m2 = self.minute.first_opt().unwrap_or(0);
        let s2 = self.second.first_opt().unwrap_or(0);
        ((h2, m2, s2), 1, carry)
    }

    /// The `leap`-th admissible firing strictly before `now` (after the
    /// zero-or-one-leap snap), with the whole-day borrow for the calendar.
    /// `leap = 0` yields the snap itself.
    pub fn prev(&self, now: TimeOfDay, leap: u64) -> (TimeOfDay, u64) {
        let ((h, m, s), reset, day) = self.reset_prev(now);
        let leap = leap.saturating_sub(reset);
        if leap == 0 {
            return ((h, m, s), day);
        }
        let (s2, aux) = self.second.prev(s, leap);
        let (m2, aux) = if aux > 0 { self.minute.prev(m, aux) } else { (m, 0) };
        let (h2, aux) = if aux > 0 { self.hour.prev(h, aux) } else { (h, 0) };
        ((h2, m2, s2), aux + day)
    }

    /// The `leap`-th admissible firing strictly after `now`; mirror of
    /// [`Clock::prev`].
    pub fn next(&self, now: TimeOfDay, leap: u64) -> (TimeOfDay, u64) {
        let ((h, m, s), reset, day) = self.reset_next(now);
        let leap = leap.saturating_sub(reset);
        if leap == 0 {
            return ((h, m, s), day);
        }
        let (s2, aux) = self.second.next(s, leap);
        let (m2, aux) = if aux > 0 { self.minute.next(m, aux) } else { (m, 0) };
        let (h2, aux) = if aux > 0 { self.hour.next(h, aux) } else { (h, 0) };
        ((h2, m2, s2), aux + day)
    }
}
