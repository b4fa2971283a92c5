//! Recurrence rule parsing (RFC 5545 §3.3.10).
//!
//! - Values: DATE, DATE-TIME and first-instance parsing
//! - Rule: RECUR text into a checked `RecurrenceRule`

mod error;
mod rule;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use rule::parse_rule;
pub use values::{parse_date, parse_datetime, parse_instance};
