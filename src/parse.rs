//! parse.rs
//!
//! Decoders for the cron expression grammar:
//!
//! ```text
//! cron := pattern (';' mode)?
//! mode := 0 (M) | 1 (D) | 2 (MW) | 3 (W)
//! pattern := scope (WS scope)*
//! scope := solo | '*' | enum | seq | span
//! solo := -?\d+
//! enum := (-?\d+ ',')+ -?\d+ ','?
//! seq  := ('*' | -?\d+ '~' -?\d+) ('/' \d+)?
//! span := -?\d+? '..' -?\d+?        ; period forms only
//! ```
//!
//! Scopes run coarse to fine (year first, seconds last); the seconds scope
//! may be omitted and defaults to `0` in point form and `0..-1` in period
//! form. Calendar scopes are written 1-based and shift to the engine's
//! 0-based digits here (`0` keeps meaning "first", negatives keep counting
//! from the end); clock scopes pass through unshifted.
//!
//! In period form the first span switches the expression over: every later
//! scope must be a span or a bare integer, the latter standing for the
//! inclusive pair `v..v`. Ranges are not checked here; the mark layer
//! validates them at construction.

use lazy_static::lazy_static;
use regex::Regex;

use crate::calendar::Mode;
use crate::error::Error;
use crate::mark::Spec;

lazy_static! {
    static ref SOLO_RE: Regex = Regex::new(r"^-?\d+$").unwrap();
    static ref EVERY_RE: Regex = Regex::new(r"^\*$").unwrap();
    static ref ENUM_RE: Regex = Regex::new(r"^(?:-?\d+,)+-?\d+,?$").unwrap();
    static ref SEQ_RE: Regex = Regex::new(r"^(\*|-?\d+~-?\d+)(/\d+)?$").unwrap();
    static ref SPAN_RE: Regex = Regex::new(r"^(-?\d+)?\.\.(-?\d+)?$").unwrap();
}

/// Shifts a 1-based surface value to the 0-based digit (`0` stays "first",
/// negatives stay relative to the end).
fn shift(value: i64, one_based: bool) -> i64 {
    if one_based && value > 0 {
        value - 1
    } else {
        value
    }
}

fn int(token: &str) -> Result<i64, Error> {
    token.parse::<i64>().map_err(|_| Error::NoMatch)
}

/// Decodes a point-form scope (solo, `*`, enum or seq).
fn decode_scope(token: &str, one_based: bool) -> Result<Spec, Error> {
    if SOLO_RE.is_match(token) {
        return Ok(Spec::Solo(shift(int(token)?, one_based)));
    }
    if EVERY_RE.is_match(token) {
        return Ok(Spec::Every);
    }
    if ENUM_RE.is_match(token) {
        let values = token
            .split(',')
            .filter(|p| !p.is_empty())
            .map(|p| Ok(shift(int(p)?, one_based)))
            .collect::<Result<Vec<_>, Error>>()?;
        return Ok(Spec::Enum(values));
    }
    if let Some(caps) = SEQ_RE.captures(token) {
        let stride = match caps.get(2) {
            Some(m) => m.as_str()[1..].parse::<u32>().map_err(|_| Error::NoMatch)?,
            None => 1,
        };
        let band = caps.get(1).map(|m| m.as_str()).unwrap_or("*");
        if band == "*" {
            return Ok(Spec::Seq(0, -1, stride));
        }
        let (a, b) = band.split_once('~').ok_or(Error::NoMatch)?;
        return Ok(Spec::Seq(
            shift(int(a)?, one_based),
            shift(int(b)?, one_based),
            stride,
        ));
    }
    Err(Error::NoMatch)
}

/// Decodes a span scope; omitted bounds default to the whole range.
fn decode_span(token: &str, one_based: bool) -> Result<(i64, i64), Error> {
    let caps = SPAN_RE.captures(token).ok_or(Error::NoMatch)?;
    let start = match caps.get(1) {
        Some(m) => shift(int(m.as_str())?, one_based),
        None => 0,
    };
    let end = match caps.get(2) {
        Some(m) => shift(int(m.as_str())?, one_based),
        None => -1,
    };
    Ok((start, end))
}

/// Splits the optional `; mode` suffix off a cron expression.
pub(crate) fn split_mode(expr: &str) -> Result<(&str, Option<Mode>), Error> {
    match expr.split_once(';') {
        None => Ok((expr.trim(), None)),
        Some((pattern, tag)) => {
            let tag = tag.trim().parse::<u32>().map_err(|_| Error::ModeMismatch)?;
            let mode = Mode::from_tag(tag).ok_or(Error::ModeMismatch)?;
            Ok((pattern.trim(), Some(mode)))
        }
    }
}

fn split_scopes(pattern: &str, mode: Mode) -> Result<(Vec<&str>, usize), Error> {
    let scopes: Vec<&str> = pattern.split_whitespace().collect();
    let want = mode.scopes();
    if scopes.len() + 1 < want || scopes.len() > want {
        return Err(Error::ModeMismatch);
    }
    Ok((scopes, want))
}

/// Decodes a point-form pattern into (reverse calendar specs, clock specs).
pub(crate) fn decode_point(pattern: &str, mode: Mode) -> Result<(Vec<Spec>, [Spec; 3]), Error> {
    let (scopes, want) = split_scopes(pattern, mode)?;
    let cal_len = want - 3;
    let mut specs = Vec::with_capacity(want);
    for (i, token) in scopes.iter().enumerate() {
        specs.push(decode_scope(token, i < cal_len)?);
    }
    if specs.len() < want {
        specs.push(Spec::Solo(0));
    }
    let clock = [
        specs[cal_len].clone(),
        specs[cal_len + 1].clone(),
        specs[cal_len + 2].clone(),
    ];
    let calendar = specs[..cal_len].iter().rev().cloned().collect();
    Ok((calendar, clock))
}

/// Start/end spec pairs of a period-form pattern, each half shaped like the
/// point form: (reverse calendar specs, clock specs).
pub(crate) type PeriodSpecs = ((Vec<Spec>, [Spec; 3]), (Vec<Spec>, [Spec; 3]));

/// Decodes a period-form pattern. Before the first span every point scope
/// duplicates into both halves; from the first span on, only spans and bare
/// integers (inclusive pairs) may follow.
pub(crate) fn decode_period(pattern: &str, mode: Mode) -> Result<PeriodSpecs, Error> {
    let (scopes, want) = split_scopes(pattern, mode)?;
    let cal_len = want - 3;
    let mut pairs: Vec<(Spec, Spec)> = Vec::with_capacity(want);
    let mut in_span = false;
    for (i, token) in scopes.iter().enumerate() {
        let one_based = i < cal_len;
        let pair = if in_span {
            if SOLO_RE.is_match(token) {
                let v = shift(int(token)?, one_based);
                (Spec::Solo(v), Spec::Solo(v))
            } else {
                let (a, b) = decode_span(token, one_based)?;
                (Spec::Solo(a), Spec::Solo(b))
            }
        } else if SPAN_RE.is_match(token) {
            in_span = true;
            let (a, b) = decode_span(token, one_based)?;
            (Spec::Solo(a), Spec::Solo(b))
        } else {
            let spec = decode_scope(token, one_based)?;
            (spec.clone(), spec)
        };
        pairs.push(pair);
    }
    if pairs.len() < want {
        pairs.push((Spec::Solo(0), Spec::Solo(-1)));
    }
    let half = |pick: fn(&(Spec, Spec)) -> Spec| {
        let clock = [
            pick(&pairs[cal_len]),
            pick(&pairs[cal_len + 1]),
            pick(&pairs[cal_len + 2]),
        ];
        let calendar: Vec<Spec> = pairs[..cal_len].iter().rev().map(pick).collect();
        (calendar, clock)
    };
    Ok((half(|p| p.0.clone()), half(|p| p.1.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_decoding() {
        assert_eq!(decode_scope("-1", false), Ok(Spec::Solo(-1)));
        assert_eq!(decode_scope("10", false), Ok(Spec::Solo(10)));
        assert_eq!(decode_scope("999999", false), Ok(Spec::Solo(999999)));
        assert_eq!(decode_scope("*", false), Ok(Spec::Every));
        assert_eq!(decode_scope("1~-1", false), Ok(Spec::Seq(1, -1, 1)));
        assert_eq!(decode_scope("0~59", false), Ok(Spec::Seq(0, 59, 1)));
        assert_eq!(decode_scope("-3~10/3", false), Ok(Spec::Seq(-3, 10, 3)));
        assert_eq!(decode_scope("*/3", false), Ok(Spec::Seq(0, -1, 3)));
        assert_eq!(decode_scope("1,2,3", false), Ok(Spec::Enum(vec![1, 2, 3])));
        assert_eq!(decode_scope("5,-6,", false), Ok(Spec::Enum(vec![5, -6])));
        assert_eq!(decode_scope("..", false), Err(Error::NoMatch));
        assert_eq!(decode_scope("x", false), Err(Error::NoMatch));
    }

    #[test]
    fn one_based_scopes_shift_to_digits() {
        assert_eq!(decode_scope("10", true), Ok(Spec::Solo(9)));
        assert_eq!(decode_scope("-10", true), Ok(Spec::Solo(-10)));
        assert_eq!(
            decode_scope("-10,10", true),
            Ok(Spec::Enum(vec![-10, 9]))
        );
        assert_eq!(decode_scope("-10~10", true), Ok(Spec::Seq(-10, 9, 1)));
        assert_eq!(decode_scope("10~-10", true), Ok(Spec::Seq(9, -10, 1)));
        assert_eq!(decode_scope("10~10", true), Ok(Spec::Seq(9, 9, 1)));
        assert_eq!(decode_span("10..11", true), Ok((9, 10)));
        assert_eq!(decode_span("-10..11", true), Ok((-10, 10)));
        assert_eq!(decode_span("10..-11", true), Ok((9, -11)));
        assert_eq!(decode_span("..", true), Ok((0, -1)));
        assert_eq!(decode_span("..1", true), Ok((0, 0)));
        assert_eq!(decode_span("-3..", true), Ok((-3, -1)));
    }

    #[test]
    fn point_patterns_split_calendar_and_clock() {
        // D mode: year day hh mm (ss defaults to 0).
        let (cal, clock) = decode_point("* * * * 1", Mode::Day).unwrap();
        assert_eq!(cal, vec![Spec::Every, Spec::Every]);
        assert_eq!(clock, [Spec::Every, Spec::Every, Spec::Solo(1)]);

        let (cal, clock) = decode_point("2000~3000/3 */5 1,3,20 * 0", Mode::Day).unwrap();
        assert_eq!(cal, vec![Spec::Seq(0, -1, 5), Spec::Seq(1999, 2999, 3)]);
        assert_eq!(
            clock,
            [Spec::Enum(vec![1, 3, 20]), Spec::Every, Spec::Solo(0)]
        );

        let (cal, clock) = decode_point("* */5 1,3,20, * */3 0", Mode::Month).unwrap();
        assert_eq!(
            cal,
            vec![Spec::Enum(vec![0, 2, 19]), Spec::Seq(0, -1, 5), Spec::Every]
        );
        assert_eq!(clock, [Spec::Every, Spec::Seq(0, -1, 3), Spec::Solo(0)]);

        let (cal, _) = decode_point("* */5 1,3,20, 1 * */3 0", Mode::MonthWeek).unwrap();
        assert_eq!(
            cal,
            vec![
                Spec::Solo(0),
                Spec::Enum(vec![0, 2, 19]),
                Spec::Seq(0, -1, 5),
                Spec::Every
            ]
        );
    }

    #[test]
    fn point_patterns_reject_bad_arity_and_spans() {
        assert_eq!(decode_point("* * *", Mode::Day), Err(Error::ModeMismatch));
        assert_eq!(
            decode_point("* * * * * * *", Mode::Day),
            Err(Error::ModeMismatch)
        );
        assert_eq!(decode_point("* 1..6 * * 1", Mode::Day), Err(Error::NoMatch));
    }

    #[test]
    fn period_patterns_pair_start_and_end() {
        let ((s_cal, s_clock), (e_cal, e_clock)) =
            decode_period("* * * * ..", Mode::Day).unwrap();
        assert_eq!(s_cal, vec![Spec::Every, Spec::Every]);
        assert_eq!(e_cal, vec![Spec::Every, Spec::Every]);
        assert_eq!(s_clock, [Spec::Every, Spec::Every, Spec::Solo(0)]);
        assert_eq!(e_clock, [Spec::Every, Spec::Every, Spec::Solo(-1)]);

        let ((s_cal, s_clock), (e_cal, e_clock)) =
            decode_period("* 1..6 .. .. ..", Mode::Day).unwrap();
        assert_eq!(s_cal, vec![Spec::Solo(0), Spec::Every]);
        assert_eq!(e_cal, vec![Spec::Solo(5), Spec::Every]);
        assert_eq!(s_clock, [Spec::Solo(0), Spec::Solo(0), Spec::Solo(0)]);
        assert_eq!(e_clock, [Spec::Solo(-1), Spec::Solo(-1), Spec::Solo(-1)]);

        // A bare integer after a span is an inclusive pair.
        let ((s_cal, s_clock), (e_cal, e_clock)) =
            decode_period("* 1..6 .. .. 10 ..", Mode::Month).unwrap();
        assert_eq!(s_cal, vec![Spec::Solo(0), Spec::Solo(0), Spec::Every]);
        assert_eq!(e_cal, vec![Spec::Solo(-1), Spec::Solo(5), Spec::Every]);
        assert_eq!(s_clock, [Spec::Solo(0), Spec::Solo(10), Spec::Solo(0)]);
        assert_eq!(e_clock, [Spec::Solo(-1), Spec::Solo(10), Spec::Solo(-1)]);

        let ((s_cal, _), (e_cal, _)) =
            decode_period("* 1.. .. 6 .. 10 ..", Mode::MonthWeek).unwrap();
        assert_eq!(
            s_cal,
            vec![Spec::Solo(5), Spec::Solo(0), Spec::Solo(0), Spec::Every]
        );
        assert_eq!(
            e_cal,
            vec![Spec::Solo(5), Spec::Solo(-1), Spec::Solo(-1), Spec::Every]
        );
    }

    #[test]
    fn period_patterns_reject_multi_scopes_after_spans() {
        assert_eq!(
            decode_period("* * 1..6 * ..", Mode::Day),
            Err(Error::NoMatch)
        );
        assert_eq!(
            decode_period("* 1..6 .. 2,3 ..", Mode::Day),
            Err(Error::NoMatch)
        );
    }

    #[test]
    fn mode_suffix() {
        assert_eq!(split_mode("* * * * * *"), Ok(("* * * * * *", None)));
        assert_eq!(
            split_mode("* * * * * * ; 0"),
            Ok(("* * * * * *", Some(Mode::Month)))
        );
        assert_eq!(split_mode("* * * * 1; 1"), Ok(("* * * * 1", Some(Mode::Day))));
        assert_eq!(
            split_mode("* * * * * * *;2"),
            Ok(("* * * * * * *", Some(Mode::MonthWeek)))
        );
        assert_eq!(split_mode("* * * * * *; 3"), Ok(("* * * * * *", Some(Mode::Week))));
        assert_eq!(split_mode("* * * * * *; 7"), Err(Error::ModeMismatch));
        assert_eq!(split_mode("* * * * * *; x"), Err(Error::ModeMismatch));
    }
}
