//! Recurrence rule engine for iCalendar (RFC 5545, RFC 2445, RFC 7529).
//!
//! Parses `RRULE` values into an immutable [`RecurrenceRule`], checks them
//! against a [`ComplianceMode`], and expands them lazily from a first
//! instance through a [`RecurrenceIterator`].

pub mod error;
pub mod rfc;

pub use cadence_core::types::ComplianceMode;
pub use error::{InvalidRule, RfcError, RfcResult};
pub use rfc::ical::core::{
    Date, DateTime, DateTimeForm, Frequency, Instance, Part, PartValues, RecurrenceRule,
    SkipPolicy, Termination, Until, Weekday, WeekdayNum,
};
pub use rfc::ical::expand::{IterOptions, RecurrenceIterator};
