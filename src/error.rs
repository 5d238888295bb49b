use std::error::Error as StdError;
use std::fmt;

/// Error type for the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested leap runs past the representable year range
    /// (civil years 1 through 9999).
    Inadequate,
    /// A reset was requested in a context with no admissible first or last
    /// point, e.g. a day-of-month constraint that only admits day 30 inside
    /// a month of 28 days. Such specs are unsatisfiable in some years; the
    /// engine surfaces this instead of skipping silently.
    Indecisive,
    /// No scope decoder accepted a token of the cron expression.
    NoMatch,
    /// The number of scopes in the expression does not fit the calendar
    /// mode, or the mode tag itself is malformed or conflicting.
    ModeMismatch,
    /// A spec value lies outside the documented range of its digit.
    Range {
        /// Which digit the value was given for.
        scope: &'static str,
        /// The offending surface value.
        value: i64,
    },
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        None
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Inadequate => write!(f, "leap exceeds the representable calendar range"),
            Self::Indecisive => write!(f, "no admissible first/last point in this context"),
            Self::NoMatch => write!(f, "unrecognized cron scope"),
            Self::ModeMismatch => write!(f, "scope count or mode tag does not fit the calendar mode"),
            Self::Range { scope, value } => {
                write!(f, "value {value} is out of range for the {scope} scope")
            }
        }
    }
}
