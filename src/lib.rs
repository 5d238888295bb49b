//! tempora
//!
//! A calendar-aware cron engine. Given a cron-like recurrence expression
//! and a reference instant, it computes the **Nth next or previous**
//! matching instant (not merely the next one), and decides whether an
//! instant matches. Recurrences can be phrased over four decompositions of
//! the date:
//!
//! - **M**: year → month → day-of-month (classical cron shape),
//! - **D**: year → day-of-year,
//! - **W**: ISO year → week → day-of-week,
//! - **MW**: year → month → week-of-month → day-of-week ("the second
//!   Friday of June"), weeks assigned to months ISO-style by their
//!   Thursday.
//!
//! Expressions run coarse to fine (`year month day hour minute second`
//! for M mode) and every scope takes a single value, a wildcard `*`, an
//! enumeration `1,15,30`, or a strided band `10~20/2`. `0` means the first
//! admissible position of a scope and negative values count from the end,
//! so `* * -1 0 0 0` is midnight on the last day of every month. Interval
//! expressions replace point scopes with spans: `* 5..9 .. .. ..` covers
//! May through September of every year.
//!
//! ```
//! use chrono::NaiveDate;
//! use tempora::Cron;
//!
//! // Every third hour, on the hour.
//! let cron = Cron::parse("* * * */3 0 0; 0").unwrap();
//! let now = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let tenth = cron.next(now, 10).unwrap();
//! assert_eq!(tenth, NaiveDate::from_ymd_opt(2023, 3, 2).unwrap().and_hms_opt(6, 0, 0).unwrap());
//! assert!(cron.contains(tenth));
//! ```
//!
//! The engine is a recursive positional number system over a mixed-radix,
//! calendar-dependent digit tree: [`mark::Mark`] constrains one digit,
//! [`clock::Clock`] chains the three time digits, and [`calendar::Calendar`]
//! walks the date digits with borrow/carry across leap years, long months,
//! five-week months and 53-week ISO years. Everything is built once at
//! parse time and immutable afterwards; traversal only touches its own
//! digit buffers, so sharing a [`Cron`] across threads needs no locks.
//!
//! Out of scope: time zones and DST (all instants are naive), sub-second
//! resolution, and leap seconds. The representable domain is civil years 1
//! through 9999; leaps that run off either end fail with
//! [`Error::Inadequate`].

pub mod calendar;
pub mod clock;
mod cron;
mod encode;
mod error;
pub mod mark;
mod parse;

pub use calendar::{Calendar, Mode};
pub use clock::Clock;
pub use cron::{parse_cron, Cron, CronExpr, CronPeriod};
pub use error::Error;
pub use mark::{Mark, Spec};
