//! Validation logic for RFC compliance.
//!
//! Recurrence rules are checked against one of four compliance modes; see
//! [`compliance`] for the accept/correct/reject table.

pub mod compliance;

pub use compliance::{Condition, Correction, Outcome, Verdict, check, check_anchor};
