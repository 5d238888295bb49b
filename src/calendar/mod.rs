//! calendar
//!
//! The calendar half of the engine: a mode selects one of four
//! decompositions of the date into digits, and the [`Calendar`] façade
//! builds the matching digit tree from a reverse-ordered spec list and
//! exposes snapping, traversal and membership over reverse-ordered digit
//! tuples (finest digit first, year last; all digits 0-based, the year
//! digit being the civil year minus one).

mod node;
mod year;

pub use year::{iso_weeks, leap_year};
pub(crate) use year::{five_week_pattern, pattern_weeks, pattern_weeks_before};

use crate::error::Error;
use crate::mark::{Mark, Spec};

use node::{Branch, Node};

/// Calendar decomposition of the date digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// year → month → day-of-month
    Month,
    /// year → day-of-year
    Day,
    /// year → month → week-of-month → day-of-week
    MonthWeek,
    /// ISO year → week → day-of-week
    Week,
}

impl Mode {
    /// Mode tag digit of the cron grammar (`; <tag>` suffix).
    pub fn from_tag(tag: u32) -> Option<Mode> {
        match tag {
            0 => Some(Mode::Month),
            1 => Some(Mode::Day),
            2 => Some(Mode::MonthWeek),
            3 => Some(Mode::Week),
            _ => None,
        }
    }

    /// Number of calendar digits in this decomposition.
    pub fn depth(self) -> usize {
        match self {
            Mode::Month | Mode::Week => 3,
            Mode::Day => 2,
            Mode::MonthWeek => 4,
        }
    }

    /// Number of scopes a cron expression carries in this mode, seconds
    /// included.
    pub fn scopes(self) -> usize {
        self.depth() + 3
    }
}

const YEAR_CAP: u32 = 9998;

/// A built digit tree for one mode, answering snap, traversal and
/// membership over reverse-ordered digit tuples.
#[derive(Debug)]
pub struct Calendar {
    root: Node,
    mode: Mode,
}

impl Calendar {
    /// Builds the tree from specs in reverse digit order (finest first,
    /// year last): M `[day, month, year]`, D `[day-of-year, year]`,
    /// W `[weekday, week, year]`, MW `[weekday, week, month, year]`.
    pub fn new(specs: &[Spec], mode: Mode) -> Result<Self, Error> {
        if specs.len() != mode.depth() {
            return Err(Error::ModeMismatch);
        }
        let root = match mode {
            Mode::Month => {
                let (day, month, year) = (&specs[0], &specs[1], &specs[2]);
                Mark::build(day, 30, "day")?;
                Node::new(
                    Mark::build(year, YEAR_CAP, "year")?,
                    Branch::YearMonths {
                        common: Box::new(month_node(month, day, 27)?),
                        leap: Box::new(month_node(month, day, 28)?),
                    },
                )
            }
            Mode::Day => {
                let (day, year) = (&specs[0], &specs[1]);
                Mark::build(day, 365, "day of year")?;
                Node::new(
                    Mark::build(year, YEAR_CAP, "year")?,
                    Branch::YearDays {
                        common: Box::new(Node::leaf(Mark::restricted(day, 364))),
                        leap: Box::new(Node::leaf(Mark::restricted(day, 365))),
                    },
                )
            }
            Mode::Week => {
                let (dow, week, year) = (&specs[0], &specs[1], &specs[2]);
                Mark::build(dow, 6, "weekday")?;
                Mark::build(week, 52, "week")?;
                Node::new(
                    Mark::build(year, YEAR_CAP, "year")?,
                    Branch::YearWeeks {
                        common: Box::new(week_node(week, dow, 51)),
                        long: Box::new(week_node(week, dow, 52)),
                    },
                )
            }
            Mode::MonthWeek => {
                let (dow, week, month, year) = (&specs[0], &specs[1], &specs[2], &specs[3]);
                Mark::build(dow, 6, "weekday")?;
                Mark::build(week, 4, "week of month")?;
                Mark::build(month, 11, "month")?;
                // One month tree per five-week bitmask; the 400-year
                // Gregorian cycle exhausts the year shapes.
                let mut variants: Vec<(u16, Node)> = Vec::new();
                for y in 1..=400u32 {
                    let pattern = five_week_pattern(y);
                    if variants.iter().any(|(p, _)| *p == pattern) {
                        continue;
                    }
                    let node = Node::new(
                        Mark::build(month, 11, "month")?,
                        Branch::MonthWeeks {
                            pattern,
                            four: Box::new(week_node(week, dow, 3)),
                            five: Box::new(week_node(week, dow, 4)),
                        },
                    );
                    variants.push((pattern, node));
                }
                Node::new(
                    Mark::build(year, YEAR_CAP, "year")?,
                    Branch::YearMonthWeeks { variants },
                )
            }
        };
        Ok(Calendar { root, mode })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the digit tuple (reverse order) is an admissible date.
    pub fn contains(&self, digits: &[u32]) -> bool {
        digits.len() == self.mode.depth() && self.root.contains(digits)
    }

    /// Greatest admissible tuple at-or-before `digits`, with its reset cost
    /// (0 when already admissible). With `passed` the absolute last
    /// admissible tuple of the whole calendar is produced instead.
    pub fn reset_prev(&self, digits: &[u32], passed: bool) -> Result<(Vec<u32>, u64), Error> {
        self.check_depth(digits)?;
        if passed {
            let mut t = Vec::with_capacity(self.mode.depth());
            self.root.last_tuple(&mut t)?;
            return Ok((t, 1));
        }
        let mut n = digits.to_vec();
        self.root.reset_prev(&mut n)
    }

    /// Mirror of [`Calendar::reset_prev`]; with `passed` the absolute first
    /// admissible tuple.
    pub fn reset_next(&self, digits: &[u32], passed: bool) -> Result<(Vec<u32>, u64), Error> {
        self.check_depth(digits)?;
        if passed {
            let mut t = Vec::with_capacity(self.mode.depth());
            self.root.first_tuple(&mut t)?;
            return Ok((t, 1));
        }
        let mut n = digits.to_vec();
        self.root.reset_next(&mut n)
    }

    /// The `leap`-th admissible date strictly before `digits` (after the
    /// zero-or-one-leap snap; `leap = 0` yields the snap itself).
    pub fn prev(&self, digits: &[u32], leap: u64) -> Result<Vec<u32>, Error> {
        self.check_depth(digits)?;
        let mut n = digits.to_vec();
        let (tuple, reset) = match self.root.reset_prev(&mut n) {
            // Nothing at-or-before the reference: the range is exhausted.
            Err(Error::Indecisive) => return Err(Error::Inadequate),
            other => other?,
        };
        if leap <= reset {
            return Ok(tuple);
        }
        let mut t = tuple;
        self.root.prev(&mut t, leap - reset)
    }

    /// Mirror of [`Calendar::prev`].
    pub fn next(&self, digits: &[u32], leap: u64) -> Result<Vec<u32>, Error> {
        self.check_depth(digits)?;
        let mut n = digits.to_vec();
        let (tuple, reset) = match self.root.reset_next(&mut n) {
            Err(Error::Indecisive) => return Err(Error::Inadequate),
            other => other?,
        };
        if leap <= reset {
            return Ok(tuple);
        }
        let mut t = tuple;
        self.root.next(&mut t, leap - reset)
    }

    fn check_depth(&self, digits: &[u32]) -> Result<(), Error> {
        if digits.len() == self.mode.depth() {
            Ok(())
        } else {
            Err(Error::ModeMismatch)
        }
    }
}

/// Month digit over the three day-length children; `feb_cap` is 27 or 28
/// depending on which year variant owns the node.
fn month_node(month: &Spec, day: &Spec, feb_cap: u32) -> Result<Node, Error> {
    Ok(Node::new(
        Mark::build(month, 11, "month")?,
        Branch::Month {
            dom: Box::new(Node::leaf(Mark::restricted(day, 29))),
            long: Box::new(Node::leaf(Mark::restricted(day, 30))),
            feb: Box::new(Node::leaf(Mark::restricted(day, feb_cap))),
        },
    ))
}

/// Week digit (of month or year, per `cap`) over its day-of-week child.
fn week_node(week: &Spec, dow: &Spec, cap: u32) -> Node {
    Node::new(
        Mark::restricted(week, cap),
        Branch::Week(Box::new(Node::leaf(Mark::restricted(dow, 6)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // The fixtures mirror realistic constraint mixes: enumerated days, a
    // pinned month, strided years.
    fn d0() -> Calendar {
        Calendar::new(
            &[Spec::Enum(vec![1, 3, 5]), Spec::Seq(2000, 3000, 3)],
            Mode::Day,
        )
        .unwrap()
    }
    fn m0() -> Calendar {
        Calendar::new(
            &[
                Spec::Enum(vec![1, 3, 5]),
                Spec::Solo(1),
                Spec::Seq(2000, 3000, 3),
            ],
            Mode::Month,
        )
        .unwrap()
    }
    fn m1() -> Calendar {
        Calendar::new(
            &[Spec::Every, Spec::Solo(1), Spec::Seq(2000, 3000, 3)],
            Mode::Month,
        )
        .unwrap()
    }
    fn mw0() -> Calendar {
        Calendar::new(
            &[
                Spec::Enum(vec![1, 3, 5]),
                Spec::Every,
                Spec::Solo(5),
                Spec::Seq(2000, 3000, 3),
            ],
            Mode::MonthWeek,
        )
        .unwrap()
    }
    fn w0() -> Calendar {
        Calendar::new(
            &[Spec::Solo(3), Spec::Every, Spec::Seq(2000, 3000, 3)],
            Mode::Week,
        )
        .unwrap()
    }

    #[test]
    fn reset_prev_snaps_to_latest_admissible() {
        assert_eq!(d0().reset_prev(&[5, 2003], false), Ok((vec![5, 2003], 0)));
        assert_eq!(d0().reset_prev(&[6, 2003], false), Ok((vec![5, 2003], 1)));
        assert_eq!(d0().reset_prev(&[0, 2000], false), Err(Error::Indecisive));
        assert_eq!(
            m0().reset_prev(&[0, 3, 2003], false),
            Ok((vec![5, 1, 2003], 1))
        );
        assert_eq!(
            m0().reset_prev(&[0, 1, 2003], false),
            Ok((vec![5, 1, 2000], 1))
        );
        assert_eq!(m0().reset_prev(&[0, 1, 2000], false), Err(Error::Indecisive));
        // Internal year 2003 is civil 2004: February keeps its leap day.
        assert_eq!(
            m1().reset_prev(&[0, 1, 2004], false),
            Ok((vec![28, 1, 2003], 1))
        );
        assert_eq!(
            m1().reset_prev(&[0, 1, 2001], false),
            Ok((vec![27, 1, 2000], 1))
        );
        assert_eq!(
            mw0().reset_prev(&[0, 0, 1, 2001], false),
            Ok((vec![5, 3, 5, 2000], 1))
        );
        // June of civil 2016 spans five ISO weeks.
        assert_eq!(
            mw0().reset_prev(&[0, 0, 1, 2018], false),
            Ok((vec![5, 4, 5, 2015], 1))
        );
        assert_eq!(
            mw0().reset_prev(&[0, 0, 6, 2018], false),
            Ok((vec![5, 3, 5, 2018], 1))
        );
        assert_eq!(
            w0().reset_prev(&[0, 1, 2003], false),
            Ok((vec![3, 0, 2003], 1))
        );
        assert_eq!(
            w0().reset_prev(&[0, 0, 2003], false),
            Ok((vec![3, 51, 2000], 1))
        );
        // Civil 2004 is a 53-week ISO year.
        assert_eq!(
            w0().reset_prev(&[0, 0, 2004], false),
            Ok((vec![3, 52, 2003], 1))
        );
    }

    #[test]
    fn reset_next_snaps_to_earliest_admissible() {
        assert_eq!(d0().reset_next(&[5, 2003], false), Ok((vec![5, 2003], 0)));
        assert_eq!(d0().reset_next(&[4, 2003], false), Ok((vec![5, 2003], 1)));
        assert_eq!(d0().reset_next(&[6, 2999], false), Err(Error::Indecisive));
        assert_eq!(
            m0().reset_next(&[0, 3, 2003], false),
            Ok((vec![1, 1, 2006], 1))
        );
        assert_eq!(
            m0().reset_next(&[0, 3, 2003], true),
            Ok((vec![1, 1, 2000], 1))
        );
        assert_eq!(
            m0().reset_next(&[6, 1, 2003], false),
            Ok((vec![1, 1, 2006], 1))
        );
        assert_eq!(m0().reset_next(&[6, 1, 2999], false), Err(Error::Indecisive));
        assert_eq!(
            mw0().reset_next(&[0, 0, 6, 2015], false),
            Ok((vec![1, 0, 5, 2018], 1))
        );
        assert_eq!(
            mw0().reset_next(&[0, 3, 5, 2014], false),
            Ok((vec![1, 0, 5, 2015], 1))
        );
        assert_eq!(
            mw0().reset_next(&[6, 4, 11, 2999], false),
            Err(Error::Indecisive)
        );
        assert_eq!(
            w0().reset_next(&[0, 1, 2003], false),
            Ok((vec![3, 1, 2003], 1))
        );
        assert_eq!(
            w0().reset_next(&[5, 0, 2003], false),
            Ok((vec![3, 1, 2003], 1))
        );
        assert_eq!(
            w0().reset_next(&[0, 0, 2004], false),
            Ok((vec![3, 0, 2006], 1))
        );
    }

    #[test]
    fn prev_leaps_admissible_dates() {
        assert_eq!(d0().prev(&[5, 2003], 1), Ok(vec![3, 2003]));
        assert_eq!(d0().prev(&[1, 2003], 1), Ok(vec![5, 2000]));
        assert_eq!(d0().prev(&[1, 2012], 10), Ok(vec![5, 2000]));
        assert_eq!(m0().prev(&[1, 1, 2012], 10), Ok(vec![5, 1, 2000]));
        assert_eq!(m0().prev(&[3, 1, 2012], 1), Ok(vec![1, 1, 2012]));
        assert_eq!(m1().prev(&[3, 1, 2012], 10), Ok(vec![21, 1, 2009]));
        assert_eq!(m1().prev(&[3, 1, 2006], 28), Ok(vec![4, 1, 2003]));
        assert_eq!(m1().prev(&[3, 1, 2006], 57), Ok(vec![3, 1, 2000]));
        assert_eq!(mw0().prev(&[3, 0, 5, 2003], 1), Ok(vec![1, 0, 5, 2003]));
        assert_eq!(mw0().prev(&[3, 1, 5, 2003], 10), Ok(vec![1, 2, 5, 2000]));
        assert_eq!(w0().prev(&[3, 0, 2006], 1), Ok(vec![3, 52, 2003]));
        assert_eq!(w0().prev(&[3, 0, 2006], 10), Ok(vec![3, 43, 2003]));
        assert_eq!(w0().prev(&[3, 0, 2006], 105), Ok(vec![3, 0, 2000]));
        assert_eq!(w0().prev(&[3, 0, 2006], 106), Err(Error::Inadequate));
    }

    #[test]
    fn next_leaps_admissible_dates() {
        assert_eq!(d0().next(&[3, 2003], 1), Ok(vec![5, 2003]));
        assert_eq!(d0().next(&[5, 2000], 1), Ok(vec![1, 2003]));
        assert_eq!(d0().next(&[5, 2000], 10), Ok(vec![1, 2012]));
        assert_eq!(m0().next(&[5, 1, 2000], 10), Ok(vec![1, 1, 2012]));
        assert_eq!(m0().next(&[1, 1, 2012], 1), Ok(vec![3, 1, 2012]));
        assert_eq!(m1().next(&[21, 1, 2009], 10), Ok(vec![3, 1, 2012]));
        assert_eq!(m1().next(&[4, 1, 2003], 28), Ok(vec![3, 1, 2006]));
        assert_eq!(m1().next(&[3, 1, 2000], 57), Ok(vec![3, 1, 2006]));
        assert_eq!(mw0().next(&[1, 0, 5, 2003], 1), Ok(vec![3, 0, 5, 2003]));
        assert_eq!(mw0().next(&[1, 2, 5, 2000], 10), Ok(vec![3, 1, 5, 2003]));
        assert_eq!(w0().next(&[3, 52, 2003], 1), Ok(vec![3, 0, 2006]));
        assert_eq!(w0().next(&[3, 51, 2003], 1), Ok(vec![3, 52, 2003]));
        assert_eq!(w0().next(&[3, 43, 2003], 10), Ok(vec![3, 0, 2006]));
        assert_eq!(w0().next(&[3, 0, 2000], 105), Ok(vec![3, 0, 2006]));
        assert_eq!(w0().next(&[3, 0, 2993], 155), Ok(vec![3, 51, 2999]));
        assert_eq!(w0().next(&[3, 0, 2993], 156), Err(Error::Inadequate));
    }

    #[test]
    fn snapping_via_traversal_entry() {
        // An inadmissible reference snaps first; the snap consumes the
        // single requested leap.
        let w = Calendar::new(
            &[Spec::Solo(0), Spec::Seq(0, -1, 2), Spec::Solo(2003)],
            Mode::Week,
        )
        .unwrap();
        assert_eq!(w.prev(&[0, 1, 2003], 1), Ok(vec![0, 0, 2003]));
        assert_eq!(w.prev(&[0, 50, 2003], 10), Ok(vec![0, 30, 2003]));
        assert_eq!(w.next(&[0, 33, 2003], 1), Ok(vec![0, 34, 2003]));
    }

    #[test]
    fn contains_checks_the_whole_tuple() {
        assert!(m0().contains(&[3, 1, 2012]));
        assert!(!m0().contains(&[2, 1, 2012]));
        assert!(!m0().contains(&[3, 2, 2012]));
        assert!(!m0().contains(&[3, 1, 2013]));
        assert!(!m0().contains(&[3, 1]));
        assert!(w0().contains(&[3, 52, 2003]));
        assert!(!w0().contains(&[3, 52, 2000])); // civil 2001 has 52 weeks
    }

    #[test]
    fn unsatisfiable_february_day_is_skipped_or_surfaced() {
        // Day 30 (internal 29) exists in no February: months simply skip
        // it, and a reset forced into February alone surfaces Indecisive.
        let skipping = Calendar::new(
            &[Spec::Solo(29), Spec::Every, Spec::Every],
            Mode::Month,
        )
        .unwrap();
        assert_eq!(
            skipping.next(&[29, 0, 2022], 1),
            Ok(vec![29, 2, 2022]) // Jan 30 -> Mar 30, February skipped
        );
        let feb_only = Calendar::new(
            &[Spec::Solo(29), Spec::Solo(1), Spec::Every],
            Mode::Month,
        )
        .unwrap();
        assert_eq!(feb_only.reset_next(&[0, 0, 2022], false), Err(Error::Indecisive));
    }

    #[test]
    fn leap_zero_is_the_snap() {
        assert_eq!(d0().prev(&[6, 2003], 0), Ok(vec![5, 2003]));
        assert_eq!(d0().prev(&[5, 2003], 0), Ok(vec![5, 2003]));
        assert_eq!(d0().next(&[4, 2003], 0), Ok(vec![5, 2003]));
    }
}
