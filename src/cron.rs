//! cron.rs
//!
//! The engine façade tying the clock chain and the calendar tree together
//! behind a `chrono::NaiveDateTime` surface. A [`Cron`] is a point
//! recurrence: it computes the Nth next or previous firing and answers
//! membership. A [`CronPeriod`] is an interval recurrence built from a
//! start point and an end point; it answers the four directed traversals
//! and interval membership.
//!
//! The leap count is interpreted at the finest clock unit: with an
//! all-wildcard clock it is literal seconds; with a restricted clock it
//! counts admissible clock firings, and the borrow handed to the calendar
//! counts admissible-clock wraparounds (days), never literal seconds.

use chrono::{Duration, NaiveDateTime};
use log::trace;

use crate::calendar::{Calendar, Mode};
use crate::clock::Clock;
use crate::encode::{decode, encode};
use crate::error::Error;
use crate::mark::Spec;
use crate::parse;

/// A point recurrence: one calendar constraint tree plus one clock chain.
#[derive(Debug)]
pub struct Cron {
    calendar: Calendar,
    clock: Clock,
    mode: Mode,
    expr: String,
}

impl Cron {
    /// Parses a point expression, taking the mode from the `; <tag>`
    /// suffix and defaulting to month-day (M) without one.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use tempora::Cron;
    ///
    /// let cron = Cron::parse("* * * */3 0 0; 0").unwrap();
    /// let now = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap().and_hms_opt(1, 0, 0).unwrap();
    /// let hit = cron.next(now, 3).unwrap();
    /// assert_eq!(hit, NaiveDate::from_ymd_opt(2023, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap());
    /// ```
    pub fn parse(expr: &str) -> Result<Self, Error> {
        let (pattern, tagged) = parse::split_mode(expr)?;
        Self::build(pattern, tagged.unwrap_or(Mode::Month))
    }

    /// Parses a point expression under an explicit mode; a conflicting
    /// `; <tag>` suffix is a [`Error::ModeMismatch`].
    pub fn with_mode(expr: &str, mode: Mode) -> Result<Self, Error> {
        let (pattern, tagged) = parse::split_mode(expr)?;
        if tagged.is_some_and(|t| t != mode) {
            return Err(Error::ModeMismatch);
        }
        Self::build(pattern, mode)
    }

    fn build(pattern: &str, mode: Mode) -> Result<Self, Error> {
        let (cal, clock) = parse::decode_point(pattern, mode)?;
        Self::from_parts(&cal, &clock, mode, pattern)
    }

    pub(crate) fn from_parts(
        cal: &[Spec],
        clock: &[Spec; 3],
        mode: Mode,
        expr: &str,
    ) -> Result<Self, Error> {
        trace!("building {mode:?} recurrence over {} calendar digits", cal.len());
        Ok(Cron {
            calendar: Calendar::new(cal, mode)?,
            clock: Clock::new(&clock[0], &clock[1], &clock[2])?,
            mode,
            expr: expr.to_string(),
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The pattern this recurrence was parsed from, mode suffix excluded.
    pub fn expression(&self) -> &str {
        &self.expr
    }

    /// The `leap`-th firing strictly after `now` (`leap = 0` snaps to the
    /// earliest firing at-or-after `now`).
    pub fn next(&self, now: NaiveDateTime, leap: u64) -> Result<NaiveDateTime, Error> {
        let (date, time) = encode(now, self.mode)?;
        let (time, carry) = self.clock.next(time, leap);
        let date = self.calendar.next(&date, carry)?;
        decode(&date, time, self.mode)
    }

    /// The `leap`-th firing strictly before `now` (`leap = 0` snaps to the
    /// latest firing at-or-before `now`).
    pub fn prev(&self, now: NaiveDateTime, leap: u64) -> Result<NaiveDateTime, Error> {
        let (date, time) = encode(now, self.mode)?;
        let (time, borrow) = self.clock.prev(time, leap);
        let date = self.calendar.prev(&date, borrow)?;
        decode(&date, time, self.mode)
    }

    /// Whether `now` is itself a firing instant.
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        match encode(now, self.mode) {
            Ok((date, time)) => self.clock.contains(time) && self.calendar.contains(&date),
            Err(_) => false,
        }
    }

    /// The `leap`-th firing after the current local wall time.
    pub fn upcoming(&self, leap: u64) -> Result<NaiveDateTime, Error> {
        self.next(chrono::Local::now().naive_local(), leap)
    }

    /// The `leap`-th firing before the current local wall time.
    pub fn latest(&self, leap: u64) -> Result<NaiveDateTime, Error> {
        self.prev(chrono::Local::now().naive_local(), leap)
    }
}

/// An interval recurrence `start..end`; membership holds between a start
/// firing and the matching end firing, inclusive.
#[derive(Debug)]
pub struct CronPeriod {
    start: Cron,
    end: Cron,
    expr: String,
}

impl CronPeriod {
    /// Parses a period expression (one with a span scope), mode from the
    /// suffix as in [`Cron::parse`].
    pub fn parse(expr: &str) -> Result<Self, Error> {
        let (pattern, tagged) = parse::split_mode(expr)?;
        Self::build(pattern, tagged.unwrap_or(Mode::Month))
    }

    /// Parses a period expression under an explicit mode.
    pub fn with_mode(expr: &str, mode: Mode) -> Result<Self, Error> {
        let (pattern, tagged) = parse::split_mode(expr)?;
        if tagged.is_some_and(|t| t != mode) {
            return Err(Error::ModeMismatch);
        }
        Self::build(pattern, mode)
    }

    fn build(pattern: &str, mode: Mode) -> Result<Self, Error> {
        let ((s_cal, s_clock), (e_cal, e_clock)) = parse::decode_period(pattern, mode)?;
        Ok(CronPeriod {
            start: Cron::from_parts(&s_cal, &s_clock, mode, pattern)?,
            end: Cron::from_parts(&e_cal, &e_clock, mode, pattern)?,
            expr: pattern.to_string(),
        })
    }

    pub fn mode(&self) -> Mode {
        self.start.mode()
    }

    /// The pattern this period was parsed from, mode suffix excluded.
    pub fn expression(&self) -> &str {
        &self.expr
    }

    /// The `leap`-th interval opening strictly after `now`.
    pub fn next_start(&self, now: NaiveDateTime, leap: u64) -> Result<NaiveDateTime, Error> {
        self.start.next(now, leap)
    }

    /// The `leap`-th interval closing strictly after `now`.
    pub fn next_end(&self, now: NaiveDateTime, leap: u64) -> Result<NaiveDateTime, Error> {
        self.end.next(now, leap)
    }

    /// The `leap`-th interval opening strictly before `now`.
    pub fn prev_start(&self, now: NaiveDateTime, leap: u64) -> Result<NaiveDateTime, Error> {
        self.start.prev(now, leap)
    }

    /// The `leap`-th interval closing strictly before `now`.
    pub fn prev_end(&self, now: NaiveDateTime, leap: u64) -> Result<NaiveDateTime, Error> {
        self.end.prev(now, leap)
    }

    /// Whether `now` lies inside a matching interval: the next closing must
    /// come at-or-before the next opening when seen from one unit back.
    pub fn contains(&self, now: NaiveDateTime) -> Result<bool, Error> {
        let opening = self.next_start(now, 1)?;
        let closing = self.next_end(now - Duration::seconds(1), 1)?;
        Ok(opening > closing)
    }

    /// Whether `now` is exactly an interval opening.
    pub fn start_contains(&self, now: NaiveDateTime) -> bool {
        self.start.contains(now)
    }

    /// Whether `now` is exactly an interval closing.
    pub fn end_contains(&self, now: NaiveDateTime) -> bool {
        self.end.contains(now)
    }
}

/// A parsed cron expression: point or period form.
#[derive(Debug)]
pub enum CronExpr {
    Point(Cron),
    Period(CronPeriod),
}

/// Parses either form, deciding by the presence of a span (`..`).
pub fn parse_cron(expr: &str) -> Result<CronExpr, Error> {
    if expr.contains("..") {
        Ok(CronExpr::Period(CronPeriod::parse(expr)?))
    } else {
        Ok(CronExpr::Point(Cron::parse(expr)?))
    }
}
