//! node.rs
//!
//! The calendar half of the engine is a tree of digits. Each **node** owns
//! the mark of its own digit plus the child subtrees the digit value can
//! select; all context-dependence (leap years, long months, five-week
//! months, 53-week ISO years) is compiled into separate pre-built children
//! chosen by `which_child`, so every node is context-free and can cache its
//! totals once.
//!
//! Digit tuples travel in reverse positional order (finest digit first,
//! year last): operations pop their own digit off the end, recurse into the
//! selected child with the remainder, and push their digit back onto the
//! child's result.
//!
//! Three groups of operations:
//!
//! - counting: `total_count`, `cost_ahead`, `cost_behind`;
//! - snapping: `reset_prev`/`reset_next` (nearest admissible tuple in the
//!   traversal direction) and `first_tuple`/`last_tuple` (absolute
//!   extremes, consulting `which_child` at every level so that February of
//!   a leap year ends on day 29 and a 53-week year on week 53);
//! - traversal: `prev`/`next` over an already-admissible tuple, leaping an
//!   arbitrary count of admissible points with borrow/carry across digit
//!   boundaries, accelerated by the shortcuts of the week and year levels.

use log::trace;
use once_cell::sync::OnceCell;

use crate::error::Error;
use crate::mark::Mark;

use super::year::{five_week_pattern, iso_weeks, leap_year, leaps_between};

/// Months spanning 31 days, 0-based.
const LONG_MONTHS: [bool; 12] = [
    true, false, true, false, true, false, true, true, false, true, false, true,
];

/// Child selection of one digit of the tree.
#[derive(Debug)]
pub(crate) enum Branch {
    /// Terminal digit; the mark is the whole constraint.
    Day,
    /// Week-of-month or week-of-year digit over a single day-of-week child.
    Week(Box<Node>),
    /// Month digit of the M decomposition; children by month length.
    /// `feb` is built against 28 or 29 days depending on which year variant
    /// owns this node.
    Month {
        dom: Box<Node>,
        long: Box<Node>,
        feb: Box<Node>,
    },
    /// Month digit of the MW decomposition for one five-week bitmask.
    MonthWeeks {
        pattern: u16,
        four: Box<Node>,
        five: Box<Node>,
    },
    /// Year digit over month trees (M mode).
    YearMonths { common: Box<Node>, leap: Box<Node> },
    /// Year digit over day-of-year leaves (D mode).
    YearDays { common: Box<Node>, leap: Box<Node> },
    /// Year digit over week trees (W mode).
    YearWeeks { common: Box<Node>, long: Box<Node> },
    /// Year digit over MW month trees, one per five-week bitmask occurring
    /// in the Gregorian cycle.
    YearMonthWeeks { variants: Vec<(u16, Node)> },
}

/// One digit of the calendar tree.
#[derive(Debug)]
pub(crate) struct Node {
    mark: Mark,
    branch: Branch,
    total: OnceCell<u64>,
    spread: OnceCell<Vec<u64>>,
}

impl Node {
    pub(crate) fn new(mark: Mark, branch: Branch) -> Self {
        Node {
            mark,
            branch,
            total: OnceCell::new(),
            spread: OnceCell::new(),
        }
    }

    pub(crate) fn leaf(mark: Mark) -> Self {
        Self::new(mark, Branch::Day)
    }

    fn child_len(&self) -> usize {
        match &self.branch {
            Branch::Day => 0,
            Branch::Week(_) => 1,
            Branch::Month { .. } => 3,
            Branch::MonthWeeks { .. } => 2,
            Branch::YearMonths { .. } | Branch::YearDays { .. } | Branch::YearWeeks { .. } => 2,
            Branch::YearMonthWeeks { variants } => variants.len(),
        }
    }

    fn child_at(&self, i: usize) -> &Node {
        match &self.branch {
            Branch::Day => unreachable!("terminal digit has no children"),
            Branch::Week(dow) => dow,
            Branch::Month { dom, long, feb } => [dom, long, feb][i],
            Branch::MonthWeeks { four, five, .. } => [four, five][i],
            Branch::YearMonths { common, leap }
            | Branch::YearDays { common, leap }
            | Branch::YearWeeks {
                common,
                long: leap,
            } => [common, leap][i],
            Branch::YearMonthWeeks { variants } => &variants[i].1,
        }
    }

    /// Child selected by an admissible value of this digit. Year digits are
    /// internal (civil year − 1).
    fn which_child(&self, v: u32) -> (&Node, usize) {
        match &self.branch {
            Branch::Day => unreachable!("terminal digit has no children"),
            Branch::Week(dow) => (dow, 0),
            Branch::Month { dom, long, feb } => {
                if LONG_MONTHS[v as usize] {
                    (long, 1)
                } else if v == 1 {
                    (feb, 2)
                } else {
                    (dom, 0)
                }
            }
            Branch::MonthWeeks {
                pattern,
                four,
                five,
            } => {
                if pattern >> v & 1 == 1 {
                    (five, 1)
                } else {
                    (four, 0)
                }
            }
            Branch::YearMonths { common, leap } | Branch::YearDays { common, leap } => {
                if leap_year(v + 1) {
                    (leap, 1)
                } else {
                    (common, 0)
                }
            }
            Branch::YearWeeks { common, long } => {
                if iso_weeks(v + 1) == 53 {
                    (long, 1)
                } else {
                    (common, 0)
                }
            }
            Branch::YearMonthWeeks { variants } => {
                let pattern = five_week_pattern(v + 1);
                let i = variants
                    .iter()
                    .position(|(p, _)| *p == pattern)
                    .expect("every Gregorian year shape has a prebuilt variant");
                (&variants[i].1, i)
            }
        }
    }

    /// Admissible tuples rooted at this node.
    pub(crate) fn total_count(&self) -> u64 {
        *self.total.get_or_init(|| match &self.branch {
            Branch::Day => self.mark.count(),
            _ => {
                let spread = self.spread();
                (0..self.child_len())
                    .map(|i| spread[i] * self.child_at(i).total_count())
                    .sum()
            }
        })
    }

    /// Admissible values of this digit partitioned by selected child.
    fn spread(&self) -> &Vec<u64> {
        self.spread.get_or_init(|| {
            let mut counts = vec![0u64; self.child_len()];
            for m in self.mark.values() {
                counts[self.which_child(m).1] += 1;
            }
            counts
        })
    }

    /// Like [`Node::spread`] but only for digit values `<= v`.
    fn spread_through(&self, v: u32) -> Vec<u64> {
        let mut counts = vec![0u64; self.child_len()];
        for m in self.mark.values() {
            if m > v {
                break;
            }
            counts[self.which_child(m).1] += 1;
        }
        counts
    }

    pub(crate) fn contains(&self, n: &[u32]) -> bool {
        match n.split_last() {
            None => false,
            Some((v, rest)) => {
                if !self.mark.contains(*v) {
                    return false;
                }
                match &self.branch {
                    Branch::Day => rest.is_empty(),
                    _ => self.which_child(*v).0.contains(rest),
                }
            }
        }
    }

    /// Admissible tuples strictly after `n` within this subtree. When the
    /// own digit is inadmissible it snaps up first (finer digits are kept
    /// as-is); a snap that carries past the cap means nothing lies ahead.
    pub(crate) fn cost_ahead(&self, n: &mut Vec<u32>) -> u64 {
        let mut v = match n.pop() {
            Some(v) => v,
            None => return 0,
        };
        if let Branch::Day = self.branch {
            return self.mark.cost_ahead(v);
        }
        if !self.mark.contains(v) {
            let (nv, carry) = self.mark.next(v, 1);
            if carry > 0 {
                return 0;
            }
            v = nv;
        }
        let amount = self.which_child(v).0.cost_ahead(n);
        let spread = self.spread();
        let through = self.spread_through(v);
        amount
            + (0..self.child_len())
                .map(|i| (spread[i] - through[i]) * self.child_at(i).total_count())
                .sum::<u64>()
    }

    /// Mirror of [`Node::cost_ahead`]: admissible tuples strictly before
    /// `n`, snapping the own digit down when inadmissible.
    pub(crate) fn cost_behind(&self, n: &mut Vec<u32>) -> u64 {
        let mut v = match n.pop() {
            Some(v) => v,
            None => return 0,
        };
        if let Branch::Day = self.branch {
            return self.mark.cost_behind(v);
        }
        if !self.mark.contains(v) {
            let (nv, borrow) = self.mark.prev(v, 1);
            if borrow > 0 {
                return 0;
            }
            v = nv;
        }
        let (child, _) = self.which_child(v);
        let amount = child.cost_behind(n);
        let through = self.spread_through(v);
        (0..self.child_len())
            .map(|i| through[i] * self.child_at(i).total_count())
            .sum::<u64>()
            - child.total_count()
            + amount
    }

    /// Appends the first admissible tuple of this subtree in reverse order.
    pub(crate) fn first_tuple(&self, out: &mut Vec<u32>) -> Result<(), Error> {
        let v = self.mark.first_opt().ok_or(Error::Indecisive)?;
        if !matches!(self.branch, Branch::Day) {
            self.which_child(v).0.first_tuple(out)?;
        }
        out.push(v);
        Ok(())
    }

    /// Appends the last admissible tuple of this subtree in reverse order,
    /// consulting `which_child` at every level.
    pub(crate) fn last_tuple(&self, out: &mut Vec<u32>) -> Result<(), Error> {
        let v = self.mark.last_opt().ok_or(Error::Indecisive)?;
        if !matches!(self.branch, Branch::Day) {
            self.which_child(v).0.last_tuple(out)?;
        }
        out.push(v);
        Ok(())
    }

    /// Snaps to the greatest admissible tuple at-or-before `n`. Returns the
    /// tuple and the reset cost: 0 when `n` was already admissible, 1 when
    /// anything moved. Fails with `Indecisive` when no admissible tuple
    /// lies at or below `n` in this subtree.
    pub(crate) fn reset_prev(&self, n: &mut Vec<u32>) -> Result<(Vec<u32>, u64), Error> {
        let v = match n.pop() {
            Some(v) => v,
            None => return Err(Error::Indecisive),
        };
        if let Branch::Day = self.branch {
            if self.mark.contains(v) {
                return Ok((vec![v], 0));
            }
            if self.mark.is_void() {
                return Err(Error::Indecisive);
            }
            let (nv, borrow) = self.mark.prev(v, 1);
            if borrow > 0 {
                return Err(Error::Indecisive);
            }
            return Ok((vec![nv], 1));
        }
        if self.mark.contains(v) {
            match self.which_child(v).0.reset_prev(n) {
                Ok((mut t, cost)) => {
                    t.push(v);
                    return Ok((t, cost));
                }
                Err(Error::Indecisive) => {}
                Err(e) => return Err(e),
            }
        }
        if self.mark.is_void() {
            return Err(Error::Indecisive);
        }
        // Step the own digit down until a child has a last tuple to land on.
        let mut cv = v;
        loop {
            let (nv, borrow) = self.mark.prev(cv, 1);
            if borrow > 0 {
                return Err(Error::Indecisive);
            }
            cv = nv;
            let mut t = Vec::new();
            match self.which_child(cv).0.last_tuple(&mut t) {
                Ok(()) => {
                    t.push(cv);
                    return Ok((t, 1));
                }
                Err(Error::Indecisive) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Mirror of [`Node::reset_prev`]: least admissible tuple at-or-after.
    pub(crate) fn reset_next(&self, n: &mut Vec<u32>) -> Result<(Vec<u32>, u64), Error> {
        let v = match n.pop() {
            Some(v) => v,
            None => return Err(Error::Indecisive),
        };
        if let Branch::Day = self.branch {
            if self.mark.contains(v) {
                return Ok((vec![v], 0));
            }
            if self.mark.is_void() {
                return Err(Error::Indecisive);
            }
            let (nv, carry) = self.mark.next(v, 1);
            if carry > 0 {
                return Err(Error::Indecisive);
            }
            return Ok((vec![nv], 1));
        }
        if self.mark.contains(v) {
            match self.which_child(v).0.reset_next(n) {
                Ok((mut t, cost)) => {
                    t.push(v);
                    return Ok((t, cost));
                }
                Err(Error::Indecisive) => {}
                Err(e) => return Err(e),
            }
        }
        if self.mark.is_void() {
            return Err(Error::Indecisive);
        }
        let mut cv = v;
        loop {
            let (nv, carry) = self.mark.next(cv, 1);
            if carry > 0 {
                return Err(Error::Indecisive);
            }
            cv = nv;
            let mut t = Vec::new();
            match self.which_child(cv).0.first_tuple(&mut t) {
                Ok(()) => {
                    t.push(cv);
                    return Ok((t, 1));
                }
                Err(Error::Indecisive) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// The `leap`-th admissible tuple strictly before the admissible tuple
    /// `n` within this subtree (`leap = 0` is the identity). `Inadequate`
    /// when the leap runs off the front of the digit range.
    pub(crate) fn prev(&self, n: &mut Vec<u32>, leap: u64) -> Result<Vec<u32>, Error> {
        let v = match n.pop() {
            Some(v) => v,
            None => return Err(Error::Inadequate),
        };
        if let Branch::Day = self.branch {
            let (nv, borrow) = self.mark.prev(v, leap);
            if borrow > 0 {
                return Err(Error::Inadequate);
            }
            return Ok(vec![nv]);
        }
        let (child, _) = self.which_child(v);
        let behind = child.cost_behind(&mut n.clone());
        if leap <= behind {
            let mut t = child.prev(n, leap)?;
            t.push(v);
            return Ok(t);
        }
        let mut leap_left = leap - behind;
        let (mut cv, borrow) = self.mark.prev(v, 1);
        if borrow > 0 {
            return Err(Error::Inadequate);
        }
        if let Some((jv, jl)) = self.shortcut_prev(cv, leap_left)? {
            cv = jv;
            leap_left = jl;
        }
        let mut child = self.which_child(cv).0;
        while child.total_count() < leap_left {
            leap_left -= child.total_count();
            let (nv, borrow) = self.mark.prev(cv, 1);
            if borrow > 0 {
                return Err(Error::Inadequate);
            }
            cv = nv;
            child = self.which_child(cv).0;
        }
        // Landing on the child's last tuple consumes one leap.
        let mut t = Vec::new();
        child.last_tuple(&mut t)?;
        let mut t = child.prev(&mut t, leap_left - 1)?;
        t.push(cv);
        Ok(t)
    }

    /// Mirror of [`Node::prev`].
    pub(crate) fn next(&self, n: &mut Vec<u32>, leap: u64) -> Result<Vec<u32>, Error> {
        let v = match n.pop() {
            Some(v) => v,
            None => return Err(Error::Inadequate),
        };
        if let Branch::Day = self.branch {
            let (nv, carry) = self.mark.next(v, leap);
            if carry > 0 {
                return Err(Error::Inadequate);
            }
            return Ok(vec![nv]);
        }
        let (child, _) = self.which_child(v);
        let ahead = child.cost_ahead(&mut n.clone());
        if leap <= ahead {
            let mut t = child.next(n, leap)?;
            t.push(v);
            return Ok(t);
        }
        let mut leap_left = leap - ahead;
        let (mut cv, carry) = self.mark.next(v, 1);
        if carry > 0 {
            return Err(Error::Inadequate);
        }
        if let Some((jv, jl)) = self.shortcut_next(cv, leap_left)? {
            cv = jv;
            leap_left = jl;
        }
        let mut child = self.which_child(cv).0;
        while child.total_count() < leap_left {
            leap_left -= child.total_count();
            let (nv, carry) = self.mark.next(cv, 1);
            if carry > 0 {
                return Err(Error::Inadequate);
            }
            cv = nv;
            child = self.which_child(cv).0;
        }
        let mut t = Vec::new();
        child.first_tuple(&mut t)?;
        let mut t = child.next(&mut t, leap_left - 1)?;
        t.push(cv);
        Ok(t)
    }

    /// Bulk advance toward the front, entered on a fresh digit value with
    /// `leap` counting that digit's last tuple as the first step. `None`
    /// when no accelerated path applies.
    fn shortcut_prev(&self, v: u32, leap: u64) -> Result<Option<(u32, u64)>, Error> {
        match &self.branch {
            Branch::Week(dow) => {
                let per_week = dow.total_count();
                if per_week == 0 {
                    return Ok(None);
                }
                let stride = (leap - 1) / per_week;
                if stride == 0 {
                    return Ok(None);
                }
                if self.mark.cost_behind(v) < stride {
                    return Err(Error::Inadequate);
                }
                let (nv, _) = self.mark.prev(v, stride);
                trace!("week shortcut: back {stride} weeks to {nv}");
                Ok(Some((nv, leap - stride * per_week)))
            }
            Branch::YearMonths { common, leap: lp } | Branch::YearDays { common, leap: lp }
                if self.mark.is_every() =>
            {
                let tc = common.total_count();
                let tl = lp.total_count();
                // Upper bound of any four-consecutive-year window; using the
                // maximum keeps the jump from overshooting across the
                // no-leap centuries of the 100/400 rule.
                let window = 4 * tc.max(tl);
                if window == 0 {
                    return Ok(None);
                }
                let stride = (leap - 1) / window;
                if stride == 0 {
                    return Ok(None);
                }
                let years = 4 * stride;
                if self.mark.cost_behind(v) < years {
                    return Err(Error::Inadequate);
                }
                let (nv, _) = self.mark.prev(v, years);
                let leaps = u64::from(leaps_between(nv + 2, v + 1));
                let consumed = tc * (years - leaps) + tl * leaps;
                trace!("year shortcut: back {years} years to {nv}, consumed {consumed}");
                Ok(Some((nv, leap - consumed)))
            }
            _ => Ok(None),
        }
    }

    /// Mirror of [`Node::shortcut_prev`].
    fn shortcut_next(&self, v: u32, leap: u64) -> Result<Option<(u32, u64)>, Error> {
        match &self.branch {
            Branch::Week(dow) => {
                let per_week = dow.total_count();
                if per_week == 0 {
                    return Ok(None);
                }
                let stride = (leap - 1) / per_week;
                if stride == 0 {
                    return Ok(None);
                }
                if self.mark.cost_ahead(v) < stride {
                    return Err(Error::Inadequate);
                }
                let (nv, _) = self.mark.next(v, stride);
                trace!("week shortcut: ahead {stride} weeks to {nv}");
                Ok(Some((nv, leap - stride * per_week)))
            }
            Branch::YearMonths { common, leap: lp } | Branch::YearDays { common, leap: lp }
                if self.mark.is_every() =>
            {
                let tc = common.total_count();
                let tl = lp.total_count();
                let window = 4 * tc.max(tl);
                if window == 0 {
                    return Ok(None);
                }
                let stride = (leap - 1) / window;
                if stride == 0 {
                    return Ok(None);
                }
                let years = 4 * stride;
                if self.mark.cost_ahead(v) < years {
                    return Err(Error::Inadequate);
                }
                let (nv, _) = self.mark.next(v, years);
                let leaps = u64::from(leaps_between(v + 1, nv));
                let consumed = tc * (years - leaps) + tl * leaps;
                trace!("year shortcut: ahead {years} years to {nv}, consumed {consumed}");
                Ok(Some((nv, leap - consumed)))
            }
            _ => Ok(None),
        }
    }
}
