//! Recurrence value types and the rule model.
//!
//! - `Date`, `DateTime` and `Instance`: the values a recurrence starts from
//!   and produces
//! - `RecurrenceRule`: the normalized, immutable rule with its BY-parts

mod datetime;
mod part;
mod rrule;
mod value;

pub use datetime::{DateTime, DateTimeForm};
pub use part::{Part, PartValues};
pub use rrule::{
    Frequency, RecurrenceRule, SkipPolicy, Termination, Until, Weekday, WeekdayNum,
};
pub use value::{Date, Instance};
