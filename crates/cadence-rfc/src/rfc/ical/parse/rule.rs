//! RECUR value parser (RFC 5545 §3.3.10, RFC 7529).
//!
//! Parsing happens in two passes. The grammar pass reads every `KEY=VALUE`
//! segment into raw values and fails with `MalformedRule`; the range pass
//! turns them into a [`RecurrenceRule`] and fails with `InvalidRule`. The
//! compliance check for the requested mode runs last.
#![expect(
    clippy::map_err_ignore,
    reason = "Integer parse errors carry no detail beyond the offending text"
)]

use std::collections::HashSet;

use cadence_core::types::ComplianceMode;

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::values::{parse_date, parse_datetime};
use crate::error::{RfcError, RfcResult};
use crate::rfc::ical::calendar::CalendarScaleId;
use crate::rfc::ical::core::{
    Frequency, Part, RecurrenceRule, SkipPolicy, Termination, Until, Weekday, WeekdayNum,
};
use crate::rfc::validation::compliance;

/// Weekday with an ordinal that has not been range-checked yet.
#[derive(Debug)]
struct RawWeekday {
    ordinal: Option<i64>,
    weekday: Weekday,
}

#[derive(Debug)]
enum RawList {
    Numbers(Vec<i64>),
    Days(Vec<RawWeekday>),
}

/// Grammar-checked but not yet range-checked rule parts.
#[derive(Debug, Default)]
struct RawRule {
    freq: Option<Frequency>,
    interval: Option<i64>,
    count: Option<i64>,
    until: Option<Until>,
    week_start: Option<Weekday>,
    scale: Option<String>,
    skip: Option<SkipPolicy>,
    parts: Vec<(Part, RawList)>,
    experimental: Vec<(String, String)>,
}

/// ## Summary
/// Parses a RECUR value into a rule checked under `mode`.
///
/// ## Errors
/// `MalformedRule` for grammar violations regardless of mode; `InvalidRule`
/// for out-of-range values, an unknown `RSCALE`, or a rule shape the mode
/// rejects.
pub fn parse_rule(text: &str, mode: ComplianceMode) -> RfcResult<RecurrenceRule> {
    let raw = read_segments(text)?;
    let mut rule = validate(raw)?;
    rule.mode = mode;
    let rule = compliance::enforce(rule)?;
    tracing::debug!(rule = %rule, %mode, "Parsed recurrence rule");
    Ok(rule)
}

fn read_segments(text: &str) -> ParseResult<RawRule> {
    let mut raw = RawRule::default();
    let mut seen = HashSet::new();
    let mut offset = 0;

    for segment in text.split(';') {
        let col = offset + 1;
        offset += segment.len() + 1;

        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let (key, value) = segment.split_once('=').ok_or_else(|| {
            ParseError::new(ParseErrorKind::MissingEquals, col).with_context(segment)
        })?;
        let key = key.trim().to_ascii_uppercase();
        let value = value.trim();

        if !seen.insert(key.clone()) {
            return Err(ParseError::new(ParseErrorKind::DuplicatePart, col).with_context(key));
        }
        if value.is_empty() {
            return Err(ParseError::new(ParseErrorKind::EmptyValue, col).with_context(key));
        }

        tracing::trace!(%key, %value, col, "Rule part");
        read_segment(&mut raw, &key, value, col)?;
    }

    if raw.freq.is_none() {
        return Err(ParseError::new(ParseErrorKind::MissingFrequency, 1));
    }
    Ok(raw)
}

fn read_segment(raw: &mut RawRule, key: &str, value: &str, col: usize) -> ParseResult<()> {
    match key {
        "FREQ" => {
            raw.freq = Some(Frequency::parse(value).ok_or_else(|| {
                ParseError::new(ParseErrorKind::InvalidFrequency, col).with_context(value)
            })?);
        }
        "INTERVAL" => raw.interval = Some(parse_integer(value, col)?),
        "COUNT" => {
            if raw.until.is_some() {
                return Err(ParseError::new(ParseErrorKind::UntilCountConflict, col));
            }
            raw.count = Some(parse_integer(value, col)?);
        }
        "UNTIL" => {
            if raw.count.is_some() {
                return Err(ParseError::new(ParseErrorKind::UntilCountConflict, col));
            }
            raw.until = Some(if value.contains(['T', 't']) {
                Until::DateTime(parse_datetime(value, None, col)?)
            } else {
                Until::Date(parse_date(value, col)?)
            });
        }
        "WKST" => {
            raw.week_start = Some(Weekday::parse(value).ok_or_else(|| {
                ParseError::new(ParseErrorKind::InvalidWeekday, col).with_context(value)
            })?);
        }
        "RSCALE" => raw.scale = Some(value.to_string()),
        "SKIP" => {
            raw.skip = Some(SkipPolicy::parse(value).ok_or_else(|| {
                ParseError::new(ParseErrorKind::InvalidSkip, col).with_context(value)
            })?);
        }
        _ if key.starts_with("X-") && key.len() > 2 => {
            raw.experimental.push((key.to_string(), value.to_string()));
        }
        _ => {
            let part = Part::parse(key).ok_or_else(|| {
                ParseError::new(ParseErrorKind::UnknownPart, col).with_context(key)
            })?;
            let list = if part == Part::ByDay {
                RawList::Days(parse_weekday_list(value, col)?)
            } else {
                RawList::Numbers(parse_integer_list(value, col)?)
            };
            raw.parts.push((part, list));
        }
    }
    Ok(())
}

/// Parses a single integer; a leading `+` is accepted.
fn parse_integer(s: &str, col: usize) -> ParseResult<i64> {
    s.trim()
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidInteger, col).with_context(s))
}

/// Parses a comma-separated list of integers.
fn parse_integer_list(s: &str, col: usize) -> ParseResult<Vec<i64>> {
    s.split(',').map(|v| parse_integer(v, col)).collect()
}

/// Parses a BYDAY value (weekdays with optional ordinals).
fn parse_weekday_list(s: &str, col: usize) -> ParseResult<Vec<RawWeekday>> {
    s.split(',')
        .map(|v| parse_weekday_num(v.trim(), col))
        .collect()
}

/// Parses a single weekday with optional ordinal (e.g., "MO", "+3TH", "-1FR").
fn parse_weekday_num(s: &str, col: usize) -> ParseResult<RawWeekday> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidWeekday, col).with_context(s);

    // The last two characters are the weekday, anything before is the ordinal
    let split = s.len().checked_sub(2).ok_or_else(invalid)?;
    if !s.is_char_boundary(split) {
        return Err(invalid());
    }
    let (ordinal_str, weekday_str) = s.split_at(split);

    let weekday = Weekday::parse(weekday_str).ok_or_else(invalid)?;
    let ordinal = if ordinal_str.is_empty() {
        None
    } else {
        Some(parse_integer(ordinal_str, col)?)
    };

    Ok(RawWeekday { ordinal, weekday })
}

/// Range pass: raw values into a rule, reporting `InvalidRule`.
fn validate(raw: RawRule) -> RfcResult<RecurrenceRule> {
    let freq = raw
        .freq
        .ok_or_else(|| RfcError::MalformedRule(ParseError::new(ParseErrorKind::MissingFrequency, 1)))?;
    let mut rule = RecurrenceRule::new(freq);

    if let Some(interval) = raw.interval {
        let interval = u32::try_from(interval)
            .map_err(|_| RfcError::invalid("INTERVAL", format!("{interval} is not positive")))?;
        rule = rule.with_interval(interval)?;
    }
    if let Some(count) = raw.count {
        let count = u32::try_from(count)
            .map_err(|_| RfcError::invalid("COUNT", format!("{count} is not positive")))?;
        rule = rule.with_count(count)?;
    }
    if let Some(until) = raw.until {
        rule.termination = Termination::Until(until);
    }
    if let Some(week_start) = raw.week_start {
        rule = rule.with_week_start(week_start);
    }
    if let Some(name) = raw.scale {
        let scale = CalendarScaleId::parse(&name).ok_or_else(|| {
            RfcError::invalid("RSCALE", format!("calendar scale {name} is not supported"))
        })?;
        rule = rule.with_scale(scale);
    }
    // Set directly: an implicit RSCALE is the compliance engine's call.
    rule.skip = raw.skip.unwrap_or_default();

    for (part, list) in raw.parts {
        rule = match list {
            RawList::Numbers(values) => {
                let values = values
                    .into_iter()
                    .map(|v| {
                        i16::try_from(v).map_err(|_| {
                            RfcError::invalid(part.as_str(), format!("value {v} out of range"))
                        })
                    })
                    .collect::<RfcResult<Vec<_>>>()?;
                rule.with_numbers(part, values)?
            }
            RawList::Days(days) => {
                let days = days
                    .into_iter()
                    .map(|day| -> RfcResult<WeekdayNum> {
                        let ordinal = day
                            .ordinal
                            .map(|n| {
                                i8::try_from(n).map_err(|_| {
                                    RfcError::invalid("BYDAY", format!("ordinal {n} out of range"))
                                })
                            })
                            .transpose()?;
                        Ok(WeekdayNum {
                            ordinal,
                            weekday: day.weekday,
                        })
                    })
                    .collect::<RfcResult<Vec<_>>>()?;
                rule.with_by_day(days)?
            }
        };
    }

    rule.experimental = raw.experimental;
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::PartValues;

    fn malformed(text: &str) -> ParseErrorKind {
        match parse_rule(text, ComplianceMode::Rfc5545Lax) {
            Err(RfcError::MalformedRule(err)) => err.kind,
            other => panic!("expected a malformed rule for {text}, got {other:?}"),
        }
    }

    fn invalid(text: &str) -> String {
        match parse_rule(text, ComplianceMode::Rfc5545Lax) {
            Err(RfcError::InvalidRule(err)) => err.part,
            other => panic!("expected an invalid rule for {text}, got {other:?}"),
        }
    }

    #[test]
    fn reads_every_standard_part() {
        let rule = parse_rule(
            "freq=yearly;interval=2;wkst=su;bymonth=1,2;byyearday=100;\
             bymonthday=-1;byday=+3TH,mo;byhour=9;byminute=30;bysecond=0;bysetpos=1;count=4",
            ComplianceMode::Rfc5545Lax,
        )
        .unwrap();

        assert_eq!(rule.frequency(), Frequency::Yearly);
        assert_eq!(rule.interval(), 2);
        assert_eq!(rule.week_start(), Weekday::Sunday);
        assert_eq!(rule.count(), Some(4));
        assert_eq!(rule.numbers(Part::ByMonth), &[1, 2]);
        assert_eq!(rule.numbers(Part::ByYearDay), &[100]);
        assert_eq!(
            rule.part(Part::ByDay),
            Some(&PartValues::Days(vec![
                WeekdayNum::nth(3, Weekday::Thursday),
                WeekdayNum::every(Weekday::Monday),
            ]))
        );
        assert_eq!(rule.numbers(Part::BySecond), &[0]);
    }

    #[test]
    fn empty_segments_are_skipped() {
        let rule = parse_rule("FREQ=DAILY;;COUNT=3;", ComplianceMode::Rfc5545Strict).unwrap();
        assert_eq!(rule.count(), Some(3));
    }

    #[test]
    fn grammar_violations_are_malformed() {
        assert_eq!(malformed("COUNT=3"), ParseErrorKind::MissingFrequency);
        assert_eq!(malformed("FREQ=DAILY;FREQ=WEEKLY"), ParseErrorKind::DuplicatePart);
        assert_eq!(malformed("FREQ=DAILY;BYHOUR=1;byhour=2"), ParseErrorKind::DuplicatePart);
        assert_eq!(malformed("FREQ=DAILY;BYFOO=1"), ParseErrorKind::UnknownPart);
        assert_eq!(malformed("FREQ=DAILY;BYHOUR=a"), ParseErrorKind::InvalidInteger);
        assert_eq!(malformed("FREQ=DAILY;COUNT"), ParseErrorKind::MissingEquals);
        assert_eq!(malformed("FREQ=FORTNIGHTLY"), ParseErrorKind::InvalidFrequency);
        assert_eq!(malformed("FREQ=DAILY;BYDAY=XX"), ParseErrorKind::InvalidWeekday);
        assert_eq!(malformed("FREQ=DAILY;WKST=MONDAY"), ParseErrorKind::InvalidWeekday);
        assert_eq!(malformed("FREQ=MONTHLY;SKIP=SIDEWAYS"), ParseErrorKind::InvalidSkip);
        assert_eq!(malformed("FREQ=DAILY;UNTIL=20230230"), ParseErrorKind::InvalidDate);
        assert_eq!(
            malformed("FREQ=DAILY;COUNT=2;UNTIL=20230301"),
            ParseErrorKind::UntilCountConflict
        );
        assert_eq!(malformed("FREQ=DAILY;BYHOUR="), ParseErrorKind::EmptyValue);
    }

    #[test]
    fn malformed_is_mode_independent() {
        for mode in ComplianceMode::ALL {
            assert!(matches!(
                parse_rule("FREQ=DAILY;FREQ=DAILY", mode),
                Err(RfcError::MalformedRule(_))
            ));
        }
    }

    #[test]
    fn error_reports_segment_column() {
        let Err(RfcError::MalformedRule(err)) =
            parse_rule("FREQ=DAILY;BYFOO=1", ComplianceMode::Rfc5545Lax)
        else {
            panic!("expected malformed rule");
        };
        assert_eq!(err.column, 12);
    }

    #[test]
    fn ranges_are_invalid_rules() {
        assert_eq!(invalid("FREQ=DAILY;INTERVAL=0"), "INTERVAL");
        assert_eq!(invalid("FREQ=DAILY;COUNT=0"), "COUNT");
        assert_eq!(invalid("FREQ=DAILY;BYHOUR=24"), "BYHOUR");
        assert_eq!(invalid("FREQ=DAILY;BYMINUTE=60"), "BYMINUTE");
        assert_eq!(invalid("FREQ=MINUTELY;BYSECOND=61"), "BYSECOND");
        assert_eq!(invalid("FREQ=MONTHLY;BYMONTHDAY=0"), "BYMONTHDAY");
        assert_eq!(invalid("FREQ=MONTHLY;BYMONTHDAY=-32"), "BYMONTHDAY");
        assert_eq!(invalid("FREQ=YEARLY;BYYEARDAY=367"), "BYYEARDAY");
        assert_eq!(invalid("FREQ=YEARLY;BYWEEKNO=54"), "BYWEEKNO");
        assert_eq!(invalid("FREQ=YEARLY;BYMONTH=13"), "BYMONTH");
        assert_eq!(invalid("FREQ=MONTHLY;BYDAY=MO;BYSETPOS=0"), "BYSETPOS");
        assert_eq!(invalid("FREQ=MONTHLY;BYDAY=54MO"), "BYDAY");
        assert_eq!(invalid("FREQ=MONTHLY;BYDAY=0MO"), "BYDAY");
        assert_eq!(invalid("FREQ=YEARLY;BYYEARDAY=99999"), "BYYEARDAY");
        assert_eq!(invalid("FREQ=MONTHLY;RSCALE=HEBREW"), "RSCALE");
    }

    #[test]
    fn experimental_parts_are_kept() {
        let rule = parse_rule("FREQ=DAILY;X-NAME=value;COUNT=1", ComplianceMode::Rfc5545Lax).unwrap();
        assert_eq!(
            rule.experimental(),
            &[("X-NAME".to_string(), "value".to_string())]
        );
    }
}
