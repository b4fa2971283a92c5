//! iCalendar RRULE value type (RFC 5545 §3.3.10, RFC 7529).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use cadence_core::types::ComplianceMode;

use super::{Date, DateTime, Instance, Part, PartValues};
use crate::error::{RfcError, RfcResult};
use crate::rfc::ical::calendar::CalendarScaleId;
use crate::rfc::ical::expand::{IterOptions, RecurrenceIterator};

/// Recurrence frequency (RFC 5545 §3.3.10).
///
/// Ordered from finest to coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses a frequency from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }

    /// Length of one step in seconds, for frequencies with a fixed length.
    #[must_use]
    pub const fn fixed_seconds(self) -> Option<i64> {
        match self {
            Self::Secondly => Some(1),
            Self::Minutely => Some(60),
            Self::Hourly => Some(3_600),
            Self::Daily => Some(86_400),
            Self::Weekly => Some(604_800),
            Self::Monthly | Self::Yearly => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// Returns the two-letter abbreviation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "SU",
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
        }
    }

    /// Parses a weekday from a two-letter abbreviation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(s))
    }

    /// Returns all weekdays in order (Sunday through Saturday).
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::Sunday,
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
        ]
    }

    /// Position in a Sunday-first week, 0 through 6.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Days from `week_start` forward to this weekday, 0 through 6.
    #[must_use]
    pub const fn offset_from(self, week_start: Self) -> u8 {
        (self.index() + 7 - week_start.index()) % 7
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Weekday with optional occurrence number.
///
/// Used in BYDAY rule part. Examples:
/// - `MO` - every Monday
/// - `1MO` - first Monday of the month/year
/// - `-1FR` - last Friday of the month/year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayNum {
    /// Optional occurrence number (-53 to 53, excluding 0).
    pub ordinal: Option<i8>,
    /// The day of the week.
    pub weekday: Weekday,
}

impl WeekdayNum {
    /// Creates a weekday occurrence without an ordinal.
    #[must_use]
    pub const fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// Creates a weekday occurrence with an ordinal. The range is checked
    /// when the value is added to a rule.
    #[must_use]
    pub const fn nth(ordinal: i8, weekday: Weekday) -> Self {
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        write!(f, "{}", self.weekday)
    }
}

/// How a generated date that does not exist is resolved (RFC 7529 `SKIP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SkipPolicy {
    /// Drop the date.
    #[default]
    Omit,
    /// Use the last valid day of the month.
    Backward,
    /// Use the first day of the following month.
    Forward,
}

impl SkipPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Omit => "OMIT",
            Self::Backward => "BACKWARD",
            Self::Forward => "FORWARD",
        }
    }

    /// Parses a skip policy (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "OMIT" => Self::Omit,
            "BACKWARD" => Self::Backward,
            "FORWARD" => Self::Forward,
            _ => return None,
        })
    }
}

impl fmt::Display for SkipPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UNTIL value for RRULE - can be either DATE or DATE-TIME.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Until {
    /// Date-only boundary (inclusive).
    Date(Date),
    /// Date-time boundary (inclusive, should be UTC if the first instance is
    /// UTC or zoned).
    DateTime(DateTime),
}

impl fmt::Display for Until {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// How a recurrence ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Termination {
    #[default]
    Unbounded,
    /// A fixed number of instances (at least 1).
    Count(u32),
    /// An inclusive end bound.
    Until(Until),
}

/// Recurrence rule (RFC 5545 §3.3.10, RFC 7529).
///
/// Immutable once built: every `with_*` method consumes the rule and returns
/// a new one, validating its own argument first. Cursors created by
/// [`RecurrenceRule::iterator`] borrow nothing from the rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub(crate) freq: Frequency,
    pub(crate) interval: u32,
    pub(crate) termination: Termination,
    pub(crate) week_start: Weekday,
    pub(crate) scale: Option<CalendarScaleId>,
    pub(crate) skip: SkipPolicy,
    pub(crate) parts: BTreeMap<Part, PartValues>,
    pub(crate) experimental: Vec<(String, String)>,
    pub(crate) mode: ComplianceMode,
}

impl RecurrenceRule {
    /// Creates a rule with the given frequency and every other field at its
    /// default: interval 1, unbounded, weeks starting Monday, Gregorian
    /// scale, skip policy OMIT and the default compliance mode.
    #[must_use]
    pub fn new(freq: Frequency) -> Self {
        Self {
            freq,
            interval: 1,
            termination: Termination::Unbounded,
            week_start: Weekday::Monday,
            scale: None,
            skip: SkipPolicy::Omit,
            parts: BTreeMap::new(),
            experimental: Vec::new(),
            mode: ComplianceMode::default(),
        }
    }

    /// ## Summary
    /// Parses rule text under the given compliance mode.
    ///
    /// ## Errors
    /// `MalformedRule` for grammar violations, `InvalidRule` for range
    /// violations and compliance rejections.
    pub fn parse(text: &str, mode: ComplianceMode) -> RfcResult<Self> {
        crate::rfc::ical::parse::parse_rule(text, mode)
    }

    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.freq
    }

    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    #[must_use]
    pub const fn termination(&self) -> &Termination {
        &self.termination
    }

    #[must_use]
    pub const fn count(&self) -> Option<u32> {
        match self.termination {
            Termination::Count(count) => Some(count),
            Termination::Unbounded | Termination::Until(_) => None,
        }
    }

    #[must_use]
    pub const fn until(&self) -> Option<&Until> {
        match &self.termination {
            Termination::Until(until) => Some(until),
            Termination::Unbounded | Termination::Count(_) => None,
        }
    }

    #[must_use]
    pub const fn week_start(&self) -> Weekday {
        self.week_start
    }

    #[must_use]
    pub const fn skip(&self) -> SkipPolicy {
        self.skip
    }

    /// The calendar scale in effect, Gregorian unless set otherwise.
    #[must_use]
    pub fn scale(&self) -> CalendarScaleId {
        self.scale.unwrap_or_default()
    }

    /// The calendar scale only if `RSCALE` was given explicitly.
    #[must_use]
    pub const fn explicit_scale(&self) -> Option<CalendarScaleId> {
        self.scale
    }

    #[must_use]
    pub const fn mode(&self) -> ComplianceMode {
        self.mode
    }

    /// Raw selector list of a BY-part.
    #[must_use]
    pub fn part(&self, part: Part) -> Option<&PartValues> {
        self.parts.get(&part)
    }

    #[must_use]
    pub fn has_part(&self, part: Part) -> bool {
        self.parts.contains_key(&part)
    }

    /// All BY-parts in canonical order.
    pub fn parts(&self) -> impl Iterator<Item = (Part, &PartValues)> {
        self.parts.iter().map(|(part, values)| (*part, values))
    }

    /// Numeric selectors of a part; empty if absent or `BYDAY`.
    #[must_use]
    pub fn numbers(&self, part: Part) -> &[i16] {
        self.parts
            .get(&part)
            .map(PartValues::numbers)
            .unwrap_or_default()
    }

    /// `BYDAY` selectors; empty if absent.
    #[must_use]
    pub fn by_day(&self) -> &[WeekdayNum] {
        self.parts
            .get(&Part::ByDay)
            .map(PartValues::days)
            .unwrap_or_default()
    }

    /// Experimental `X-` parts in the order they were given.
    #[must_use]
    pub fn experimental(&self) -> &[(String, String)] {
        &self.experimental
    }

    /// ## Summary
    /// Sets the interval.
    ///
    /// ## Errors
    /// `InvalidRule` if `interval` is 0.
    pub fn with_interval(mut self, interval: u32) -> RfcResult<Self> {
        if interval == 0 {
            return Err(RfcError::invalid("INTERVAL", "must be at least 1"));
        }
        self.interval = interval;
        Ok(self)
    }

    /// ## Summary
    /// Ends the recurrence after `count` instances, replacing any end bound.
    ///
    /// ## Errors
    /// `InvalidRule` if `count` is 0.
    pub fn with_count(mut self, count: u32) -> RfcResult<Self> {
        if count == 0 {
            return Err(RfcError::invalid("COUNT", "must be at least 1"));
        }
        self.termination = Termination::Count(count);
        Ok(self)
    }

    /// ## Summary
    /// Ends the recurrence at an inclusive bound, replacing any count.
    ///
    /// ## Errors
    /// `InvalidRule` if the bound is not a real calendar date or time.
    pub fn with_until(mut self, until: Until) -> RfcResult<Self> {
        let real = match &until {
            Until::Date(date) => date.to_naive().is_some(),
            Until::DateTime(dt) => dt.to_naive().is_some(),
        };
        if !real {
            return Err(RfcError::invalid(
                "UNTIL",
                format!("{until} is not a valid date"),
            ));
        }
        self.termination = Termination::Until(until);
        Ok(self)
    }

    #[must_use]
    pub fn with_unbounded(mut self) -> Self {
        self.termination = Termination::Unbounded;
        self
    }

    #[must_use]
    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    /// Sets the skip policy. A policy other than OMIT only exists together
    /// with an explicit calendar scale, so one is filled in if missing.
    #[must_use]
    pub fn with_skip(mut self, skip: SkipPolicy) -> Self {
        self.skip = skip;
        if skip != SkipPolicy::Omit && self.scale.is_none() {
            self.scale = Some(CalendarScaleId::default());
        }
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: CalendarScaleId) -> Self {
        self.scale = Some(scale);
        self
    }

    /// ## Summary
    /// Sets the selector list of a numeric BY-part. An empty list removes
    /// the part.
    ///
    /// ## Errors
    /// `InvalidRule` if `part` is `BYDAY` or any value is out of range.
    pub fn with_numbers(mut self, part: Part, values: Vec<i16>) -> RfcResult<Self> {
        if part == Part::ByDay {
            return Err(RfcError::invalid(
                part.as_str(),
                "takes weekday values, not numbers",
            ));
        }
        let max_month = i16::from(self.scale().scale().max_months_in_year());
        for &value in &values {
            part.check_value(value)
                .map_err(|constraint| RfcError::invalid(part.as_str(), constraint))?;
            if part == Part::ByMonth && value > max_month {
                return Err(RfcError::invalid(
                    part.as_str(),
                    format!("value {value} exceeds the months of {}", self.scale()),
                ));
            }
        }
        if values.is_empty() {
            self.parts.remove(&part);
        } else {
            self.parts.insert(part, PartValues::Numbers(values));
        }
        Ok(self)
    }

    /// ## Summary
    /// Sets the `BYDAY` selectors. An empty list removes the part.
    ///
    /// ## Errors
    /// `InvalidRule` if an ordinal is 0 or beyond ±53.
    pub fn with_by_day(mut self, days: Vec<WeekdayNum>) -> RfcResult<Self> {
        for day in &days {
            if let Some(ordinal) = day.ordinal {
                Part::ByDay
                    .check_value(i16::from(ordinal))
                    .map_err(|constraint| RfcError::invalid("BYDAY", constraint))?;
            }
        }
        if days.is_empty() {
            self.parts.remove(&Part::ByDay);
        } else {
            self.parts.insert(Part::ByDay, PartValues::Days(days));
        }
        Ok(self)
    }

    #[must_use]
    pub fn without_part(mut self, part: Part) -> Self {
        self.parts.remove(&part);
        self
    }

    /// ## Summary
    /// Adds or replaces an experimental `X-` part.
    ///
    /// ## Errors
    /// `InvalidRule` if the name does not start with `X-`.
    pub fn with_experimental(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> RfcResult<Self> {
        let name = name.into().to_ascii_uppercase();
        if !name.starts_with("X-") || name.len() < 3 {
            return Err(RfcError::invalid(name, "experimental parts start with X-"));
        }
        let value = value.into();
        if let Some(existing) = self.experimental.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = value;
        } else {
            self.experimental.push((name, value));
        }
        Ok(self)
    }

    /// ## Summary
    /// Re-checks the rule under another compliance mode, applying that
    /// mode's corrections.
    ///
    /// ## Errors
    /// `InvalidRule` if the mode rejects the rule.
    pub fn with_mode(mut self, mode: ComplianceMode) -> RfcResult<Self> {
        self.mode = mode;
        crate::rfc::validation::compliance::enforce(self)
    }

    /// ## Summary
    /// Starts a lazy cursor over the instances of this rule, anchored at
    /// `first`.
    ///
    /// ## Errors
    /// `InvalidRule` if the rule cannot be used with this first instance
    /// under the rule's compliance mode.
    pub fn iterator(&self, first: impl Into<Instance>) -> RfcResult<RecurrenceIterator> {
        self.iterator_with(first, IterOptions::default())
    }

    /// ## Summary
    /// Same as [`RecurrenceRule::iterator`] with explicit cursor options.
    ///
    /// ## Errors
    /// `InvalidRule` if the rule cannot be used with this first instance
    /// under the rule's compliance mode.
    pub fn iterator_with(
        &self,
        first: impl Into<Instance>,
        options: IterOptions,
    ) -> RfcResult<RecurrenceIterator> {
        RecurrenceIterator::new(self, first.into(), options)
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::rfc::ical::build::serialize(self))
    }
}

impl serde::Serialize for RecurrenceRule {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for RecurrenceRule {
    type Err = RfcError;

    /// Parses under the default compliance mode.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, ComplianceMode::default())
    }
}
