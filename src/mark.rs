//! mark.rs
//!
//! A **mark** is the constraint set of one recurrence digit: the admissible
//! integers of a single positional slot (second, hour, day-of-month, year,
//! …) within `[0, cap]`. Marks answer four questions, each in O(1) for the
//! arithmetic kinds and O(log k) for enumerations:
//!
//! - membership (`contains`),
//! - the Lth admissible value strictly below/above a point, together with
//!   the number of borrow/carry wraps (`prev`, `next`),
//! - how many admissible values lie strictly ahead of / behind a point
//!   (`cost_ahead`, `cost_behind`).
//!
//! Four kinds exist, mirroring the surface grammar: a single value, the
//! wildcard, an arithmetic band with stride (which may wrap past the cap),
//! and an explicit enumeration. All negative surface values index from the
//! end of the range (`-1` is the last admissible position) and `0` always
//! means the first; normalization happens here, at construction, never at
//! lookup.

use crate::error::Error;

/// A surface recipe for one digit, as produced by the cron parser or built
/// directly by a caller. Values are pre-shifted to the digit's 0-based
/// internal range; negatives count from the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spec {
    /// Exactly one value (`0` = first, negatives from the end).
    Solo(i64),
    /// Every value of the digit (`*`).
    Every,
    /// `start~end/stride`; the band wraps through 0 when `start > end`
    /// after resolution.
    Seq(i64, i64, u32),
    /// An explicit list of values.
    Enum(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Solo(u32),
    Every,
    Seq {
        /// Resolved band anchor; first element in cycle order.
        start: u32,
        /// First element of the wrapped (low) arm; meaningful when `high < count`.
        low_first: u32,
        stride: u32,
        /// Number of elements in `[start, cap]`; equals `count` when the
        /// band does not wrap.
        high: u32,
        count: u32,
    },
    Enum(Vec<u32>),
    /// Empty set; arises only from restricted sibling construction.
    Void,
}

/// A normalized digit constraint over `[0, cap]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    kind: Kind,
    cap: u32,
}

/// Resolves a surface value against an inclusive cap: `0` is the base,
/// negatives index backward from `cap + 1`. Returns `None` when the value
/// falls outside `[0, cap]`.
fn resolve(value: i64, cap: u32) -> Option<u32> {
    let cap = i64::from(cap);
    let v = if value < 0 { cap + 1 + value } else { value };
    if (0..=cap).contains(&v) {
        Some(v as u32)
    } else {
        None
    }
}

impl Mark {
    /// Builds a mark, rejecting values outside `[0, cap]`.
    pub fn build(spec: &Spec, cap: u32, scope: &'static str) -> Result<Self, Error> {
        let kind = match spec {
            Spec::Solo(v) => {
                let v = resolve(*v, cap).ok_or(Error::Range { scope, value: *v })?;
                Kind::Solo(v)
            }
            Spec::Every => Kind::Every,
            Spec::Seq(start, end, stride) => {
                if *stride == 0 {
                    return Err(Error::Range { scope, value: 0 });
                }
                let s = resolve(*start, cap).ok_or(Error::Range { scope, value: *start })?;
                let e = resolve(*end, cap).ok_or(Error::Range { scope, value: *end })?;
                seq_kind(s, e, *stride, cap)
            }
            Spec::Enum(values) => {
                let mut out = Vec::with_capacity(values.len());
                for v in values {
                    out.push(resolve(*v, cap).ok_or(Error::Range { scope, value: *v })?);
                }
                out.sort_unstable();
                out.dedup();
                if out.len() == 1 {
                    Kind::Solo(out[0])
                } else {
                    Kind::Enum(out)
                }
            }
        };
        Ok(Mark { kind, cap })
    }

    /// Builds a mark against a sibling cap smaller than the one the spec was
    /// validated for. Negatives and wildcards re-resolve against this cap
    /// (`-1` stays "last"); explicit values that overflow it are dropped,
    /// possibly leaving the mark empty. An empty sibling is a satisfiable
    /// spec that simply never fires in this context (day 31 in April), and
    /// the node layer skips it through its zero total count.
    pub fn restricted(spec: &Spec, cap: u32) -> Self {
        let kind = match spec {
            Spec::Solo(v) => match resolve(*v, cap) {
                Some(v) => Kind::Solo(v),
                None => Kind::Void,
            },
            Spec::Every => Kind::Every,
            Spec::Seq(start, end, stride) => {
                let start = resolve(*start, cap);
                // A positive end beyond this cap clamps to it; the surviving
                // band is the in-range prefix.
                let end = resolve(*end, cap).or(if *end > 0 { Some(cap) } else { None });
                match (start, end) {
                    (Some(s), Some(e)) if *stride > 0 => seq_kind(s, e, *stride, cap),
                    _ => Kind::Void,
                }
            }
            Spec::Enum(values) => {
                let mut out: Vec<u32> = values.iter().filter_map(|v| resolve(*v, cap)).collect();
                out.sort_unstable();
                out.dedup();
                match out.len() {
                    0 => Kind::Void,
                    1 => Kind::Solo(out[0]),
                    _ => Kind::Enum(out),
                }
            }
        };
        Mark { kind, cap }
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Number of admissible values.
    pub fn count(&self) -> u64 {
        match &self.kind {
            Kind::Solo(_) => 1,
            Kind::Every => u64::from(self.cap) + 1,
            Kind::Seq { count, .. } => u64::from(*count),
            Kind::Enum(v) => v.len() as u64,
            Kind::Void => 0,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, Kind::Void)
    }

    pub fn is_every(&self) -> bool {
        matches!(self.kind, Kind::Every)
    }

    /// The i-th admissible value in ascending order. `i < count()`.
    fn nth(&self, i: u64) -> u32 {
        match &self.kind {
            Kind::Solo(v) => *v,
            Kind::Every => i as u32,
            Kind::Seq {
                start,
                low_first,
                stride,
                high,
                count,
            } => {
                let low = u64::from(count - high);
                if i < low {
                    low_first + (i as u32) * stride
                } else {
                    start + (i - low) as u32 * stride
                }
            }
            Kind::Enum(v) => v[i as usize],
            Kind::Void => unreachable!("nth on an empty mark"),
        }
    }

    /// Number of admissible values strictly below `n`.
    fn rank_below(&self, n: u32) -> u64 {
        fn arm(first: u32, len: u32, stride: u32, n: u32) -> u64 {
            if n <= first {
                0
            } else {
                u64::from(len.min((n - 1 - first) / stride + 1))
            }
        }
        match &self.kind {
            Kind::Solo(v) => u64::from(n > *v),
            Kind::Every => u64::from(n.min(self.cap + 1)),
            Kind::Seq {
                start,
                low_first,
                stride,
                high,
                count,
            } => arm(*low_first, count - high, *stride, n) + arm(*start, *high, *stride, n),
            Kind::Enum(v) => v.partition_point(|x| *x < n) as u64,
            Kind::Void => 0,
        }
    }

    pub fn contains(&self, n: u32) -> bool {
        match &self.kind {
            Kind::Solo(v) => n == *v,
            Kind::Every => n <= self.cap,
            Kind::Seq {
                start,
                low_first,
                stride,
                high,
                count,
            } => {
                if n >= *start {
                    (n - start) % stride == 0 && (n - start) / stride < *high
                } else {
                    *count > *high
                        && n >= *low_first
                        && (n - low_first) % stride == 0
                        && (n - low_first) / stride < count - high
                }
            }
            Kind::Enum(v) => v.binary_search(&n).is_ok(),
            Kind::Void => false,
        }
    }

    /// The Lth admissible value numerically strictly below `n`, stepping
    /// down the sorted set cyclically. The returned borrow counts how many
    /// times the search wrapped past 0. When `n` is not admissible the
    /// first step is the snap to the nearest admissible value below.
    /// `leap = 0` is the identity (callers only pass it for admissible `n`).
    pub fn prev(&self, n: u32, leap: u64) -> (u32, u64) {
        debug_assert!(!self.is_void());
        if leap == 0 {
            return (n, 0);
        }
        let k = self.count();
        let below = self.rank_below(n);
        let (j, borrow) = if below > 0 { (below - 1, 0) } else { (k - 1, 1) };
        let steps = leap - 1;
        if steps <= j {
            (self.nth(j - steps), borrow)
        } else {
            let t = steps - j;
            let wraps = 1 + (t - 1) / k;
            (self.nth((j + k - steps % k) % k), borrow + wraps)
        }
    }

    /// The Lth admissible value strictly above `n`; the carry counts the
    /// wraps past the cap. Mirror of [`Mark::prev`].
    pub fn next(&self, n: u32, leap: u64) -> (u32, u64) {
        debug_assert!(!self.is_void());
        if leap == 0 {
            return (n, 0);
        }
        let k = self.count();
        let at = self.rank_below(n) + u64::from(self.contains(n));
        let (j, carry) = if at < k { (at, 0) } else { (0, 1) };
        let steps = leap - 1;
        if steps <= k - 1 - j {
            (self.nth(j + steps), carry)
        } else {
            let t = steps - (k - 1 - j);
            let wraps = 1 + (t - 1) / k;
            (self.nth((j + steps % k) % k), carry + wraps)
        }
    }

    /// Count of admissible values in `(n, cap]`.
    pub fn cost_ahead(&self, n: u32) -> u64 {
        self.count() - self.rank_below(n) - u64::from(self.contains(n))
    }

    /// Count of admissible values in `[0, n)`.
    pub fn cost_behind(&self, n: u32) -> u64 {
        self.rank_below(n)
    }

    pub fn first_opt(&self) -> Option<u32> {
        (!self.is_void()).then(|| self.nth(0))
    }

    pub fn last_opt(&self) -> Option<u32> {
        (!self.is_void()).then(|| self.nth(self.count() - 1))
    }

    /// Ascending iteration over the admissible values.
    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.count()).map(move |i| self.nth(i))
    }
}

/// Normalizes a resolved `start~end/stride` band. When `start > end` the
/// band wraps through 0 with cycle length `cap + 1`.
fn seq_kind(start: u32, end: u32, stride: u32, cap: u32) -> Kind {
    let cycle = cap + 1;
    if start <= end {
        let count = (end - start) / stride + 1;
        Kind::Seq {
            start,
            low_first: 0,
            stride,
            high: count,
            count,
        }
    } else {
        let width = end + cycle - start;
        let count = width / stride + 1;
        let high = (cap - start) / stride + 1;
        // First element of the arm that wrapped past the cap.
        let low_first = start + high * stride - cycle;
        Kind::Seq {
            start,
            low_first,
            stride,
            high,
            count,
        }
    }
}
