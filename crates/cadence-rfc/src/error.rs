use thiserror::Error;

use crate::rfc::ical::parse::ParseError;

/// A rule that parsed but violates a range or compliance constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{part}: {constraint}")]
pub struct InvalidRule {
    /// Name of the offending rule part, e.g. `BYMONTH` or `UNTIL`.
    pub part: String,
    /// The constraint the part violates.
    pub constraint: String,
}

impl InvalidRule {
    #[must_use]
    pub fn new(part: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            constraint: constraint.into(),
        }
    }
}

/// Recurrence rule parsing, validation and expansion errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error("Malformed rule: {0}")]
    MalformedRule(#[from] ParseError),

    #[error("Invalid rule: {0}")]
    InvalidRule(#[from] InvalidRule),

    #[error("No further instance in the recurrence set")]
    NoSuchInstance,

    #[error(transparent)]
    CoreError(#[from] cadence_core::error::CoreError),
}

impl RfcError {
    /// Shorthand for an [`InvalidRule`] error.
    #[must_use]
    pub fn invalid(part: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::InvalidRule(InvalidRule::new(part, constraint))
    }
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
