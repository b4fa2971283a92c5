//! Recurrence rule parsing error types.

use std::fmt;

/// Result type for rule parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Grammar-level failure while reading rule or date text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Kind of error.
    pub kind: ParseErrorKind,
    /// Column where the offending segment starts (1-based).
    pub column: usize,
    /// Additional context about the error.
    pub context: Option<String>,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(kind: ParseErrorKind, column: usize) -> Self {
        Self {
            kind,
            column,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at column {}", self.kind, self.column)?;
        if let Some(ref ctx) = self.context {
            write!(f, ": {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Kinds of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A segment without `=`.
    MissingEquals,
    /// A key that is neither a known rule part nor an `X-` name.
    UnknownPart,
    /// The same key given twice.
    DuplicatePart,
    /// No `FREQ` part.
    MissingFrequency,
    /// A key with nothing after `=`.
    EmptyValue,
    /// A list item that is not an integer.
    InvalidInteger,
    /// Invalid frequency.
    InvalidFrequency,
    /// Invalid weekday.
    InvalidWeekday,
    /// Invalid skip policy.
    InvalidSkip,
    /// Invalid date format.
    InvalidDate,
    /// Invalid date-time format.
    InvalidDateTime,
    /// UNTIL and COUNT are mutually exclusive.
    UntilCountConflict,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEquals => write!(f, "missing '=' in rule part"),
            Self::UnknownPart => write!(f, "unknown rule part"),
            Self::DuplicatePart => write!(f, "duplicate rule part"),
            Self::MissingFrequency => write!(f, "missing FREQ"),
            Self::EmptyValue => write!(f, "empty value"),
            Self::InvalidInteger => write!(f, "invalid integer value"),
            Self::InvalidFrequency => write!(f, "invalid frequency"),
            Self::InvalidWeekday => write!(f, "invalid weekday"),
            Self::InvalidSkip => write!(f, "invalid skip policy"),
            Self::InvalidDate => write!(f, "invalid date format"),
            Self::InvalidDateTime => write!(f, "invalid date-time format"),
            Self::UntilCountConflict => write!(f, "UNTIL and COUNT are mutually exclusive"),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
