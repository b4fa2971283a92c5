//! RFC implementations backing the recurrence engine.

pub mod ical;
pub mod validation;
