//! encode.rs
//!
//! Conversions between absolute instants (`chrono::NaiveDateTime`) and the
//! engine's digit tuples. Each mode decomposes the date differently; the
//! calendar digits come back in reverse order (finest first, year last) and
//! 0-based, the year digit being the civil (or ISO) year minus one. Clock
//! digits are the plain (hour, minute, second) triple.
//!
//! The MW decomposition partitions the ISO year's weeks among the civil
//! months by the rule "a week belongs to the month of its Thursday", so a
//! civil date near a month boundary may encode under the neighboring month
//! (2000-02-29, a Tuesday, is week 0 of March).

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};

use crate::calendar::{five_week_pattern, pattern_weeks, pattern_weeks_before, Mode};
use crate::clock::TimeOfDay;
use crate::error::Error;

/// Internal year digit from a civil or ISO year; the engine's domain is
/// civil years 1 through 9999.
fn year_digit(year: i32) -> Result<u32, Error> {
    if (1..=9999).contains(&year) {
        Ok(year as u32 - 1)
    } else {
        Err(Error::Inadequate)
    }
}

/// Encodes an instant into (reverse calendar digits, clock triple).
pub(crate) fn encode(now: NaiveDateTime, mode: Mode) -> Result<(Vec<u32>, TimeOfDay), Error> {
    let clock = (now.hour(), now.minute(), now.second());
    let date = now.date();
    let digits = match mode {
        Mode::Month => vec![
            date.day() - 1,
            date.month() - 1,
            year_digit(date.year())?,
        ],
        Mode::Day => vec![date.ordinal() - 1, year_digit(date.year())?],
        Mode::Week => {
            let iso = date.iso_week();
            vec![
                date.weekday().num_days_from_monday(),
                iso.week() - 1,
                year_digit(iso.year())?,
            ]
        }
        Mode::MonthWeek => {
            let iso = date.iso_week();
            let year = year_digit(iso.year())?;
            let pattern = five_week_pattern(year + 1);
            let woy = iso.week() - 1;
            let mut month = 0;
            let mut before = 0;
            while before + pattern_weeks(pattern, month) <= woy {
                before += pattern_weeks(pattern, month);
                month += 1;
            }
            vec![
                date.weekday().num_days_from_monday(),
                woy - before,
                month,
                year,
            ]
        }
    };
    Ok((digits, clock))
}

/// Decodes (reverse calendar digits, clock triple) back into an instant.
pub(crate) fn decode(digits: &[u32], clock: TimeOfDay, mode: Mode) -> Result<NaiveDateTime, Error> {
    let date = match mode {
        Mode::Month => NaiveDate::from_ymd_opt(
            digits[2] as i32 + 1,
            digits[1] + 1,
            digits[0] + 1,
        ),
        Mode::Day => NaiveDate::from_yo_opt(digits[1] as i32 + 1, digits[0] + 1),
        Mode::Week => NaiveDate::from_isoywd_opt(
            digits[2] as i32 + 1,
            digits[1] + 1,
            weekday_from(digits[0]),
        ),
        Mode::MonthWeek => {
            let pattern = five_week_pattern(digits[3] + 1);
            let woy = pattern_weeks_before(pattern, digits[2]) + digits[1];
            NaiveDate::from_isoywd_opt(digits[3] as i32 + 1, woy + 1, weekday_from(digits[0]))
        }
    };
    date.and_then(|d| d.and_hms_opt(clock.0, clock.1, clock.2))
        .ok_or(Error::Inadequate)
}

fn weekday_from(dow: u32) -> Weekday {
    match dow {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}
