use thiserror::Error;

/// Recurrence rule errors.
///
/// Every variant means the schedule itself is unusable; callers treat them
/// uniformly as an invalid rule for the owning group.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Non-existent local time: {0}")]
    NonExistentTime(String),

    #[error("No occurrence found: {0}")]
    NoOccurrence(String),
}

pub type RuleResult<T> = std::result::Result<T, RuleError>;
