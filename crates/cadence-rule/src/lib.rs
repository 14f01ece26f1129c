//! Recurrence rules for group meetings and the next-occurrence calculator.
//!
//! Everything in this crate is pure: callers pass the reference instant in,
//! nothing reads the system clock.

pub mod clock;
pub mod error;
pub mod next;
pub mod rule;
pub mod zone;

pub use clock::ClockTime;
pub use error::{RuleError, RuleResult};
pub use next::{Occurrence, next_occurrence};
pub use rule::{
    CustomRule, DailyRule, DayTime, MonthlyRule, Ordinal, OrdinalRule, RecurrenceRule, Routine,
    WeekdayRule,
};
pub use zone::start_instant;
