//! Error types for rotation-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RotationError {
    /// The rule's frequency is neither DAILY nor WEEKLY. Callers degrade the
    /// event to a single occurrence instead of failing.
    #[error("Unsupported recurrence frequency: {frequency}")]
    UnsupportedRecurrence { frequency: String },

    #[error("Malformed RRULE: {0}")]
    MalformedRule(String),

    /// An occurrence whose end does not come after its start.
    #[error("Invalid occurrence: {0}")]
    InvalidOccurrence(String),

    #[error("Calendar contains no events")]
    EmptyCalendar,

    /// A horizon that is negative or runs past the representable range.
    #[error("Invalid horizon: {days} days")]
    InvalidHorizon { days: i64 },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

pub type Result<T> = std::result::Result<T, RotationError>;
