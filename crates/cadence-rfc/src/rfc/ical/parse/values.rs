//! DATE and DATE-TIME value parsers (RFC 5545 §3.3.4, §3.3.5).
//!
//! Error sources are intentionally discarded during parsing (`map_err_ignore`);
//! the column and kind carry everything a caller can act on.
#![expect(
    clippy::map_err_ignore,
    reason = "Value parsers report position and kind, the integer parse error adds nothing"
)]

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{Date, DateTime, DateTimeForm, Instance};

/// Parses a DATE value (RFC 5545 §3.3.4).
///
/// Format: YYYYMMDD (e.g., "19970714")
///
/// ## Errors
/// Returns an error if the string is not 8 digits naming a real date.
pub fn parse_date(s: &str, col: usize) -> ParseResult<Date> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidDate, col).with_context(s));
    }

    let year = s[0..4]
        .parse::<u16>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, col))?;
    let month = s[4..6]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, col))?;
    let day = s[6..8]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, col))?;

    Date::checked(year, month, day).ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidDate, col).with_context(format!("{s} is not a date"))
    })
}

/// Parses a DATE-TIME value (RFC 5545 §3.3.5).
///
/// Format: YYYYMMDD"T"HHMMSS[Z] (e.g., "19970714T133000Z")
///
/// A trailing `Z` makes the value UTC; otherwise `tzid` selects the zoned
/// form and its absence the floating form.
///
/// ## Errors
/// Returns an error if the string is not a valid date-time.
pub fn parse_datetime(s: &str, tzid: Option<&str>, col: usize) -> ParseResult<DateTime> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidDateTime, col).with_context(s);

    let (date_str, time_str) = s.split_once(['T', 't']).ok_or_else(invalid)?;
    let date = parse_date(date_str, col)?;

    let (time_str, is_utc) = match time_str.strip_suffix(['Z', 'z']) {
        Some(stripped) => (stripped, true),
        None => (time_str, false),
    };
    if time_str.len() != 6 || !time_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let field = |range: std::ops::Range<usize>| {
        time_str[range]
            .parse::<u8>()
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidDateTime, col))
    };
    let hour = field(0..2)?;
    let minute = field(2..4)?;
    let second = field(4..6)?;
    if hour > 23 || minute > 59 || second > 60 {
        return Err(invalid());
    }

    let form = if is_utc {
        DateTimeForm::Utc
    } else if let Some(tz) = tzid {
        DateTimeForm::Zoned {
            tzid: tz.to_string(),
        }
    } else {
        DateTimeForm::Floating
    };

    Ok(DateTime::new(date, hour, minute, second, form))
}

/// Parses a first-instance value: a DATE for all-day recurrences or a
/// DATE-TIME otherwise.
///
/// ## Errors
/// Returns an error if the text is neither form.
pub fn parse_instance(s: &str, tzid: Option<&str>) -> ParseResult<Instance> {
    let s = s.trim();
    if s.contains(['T', 't']) {
        parse_datetime(s, tzid, 1).map(Instance::DateTime)
    } else {
        parse_date(s, 1).map(Instance::Date)
    }
}
