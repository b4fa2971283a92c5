//! DATE values and the instances a recurrence produces.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use super::{DateTime, DateTimeForm};
use crate::error::RfcError;

/// DATE value (RFC 5545 §3.3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    /// Year (e.g., 2026).
    pub year: u16,
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
}

impl Date {
    /// Creates a new date value. Fields are not checked.
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Creates a date, returning `None` unless it names a real Gregorian day.
    #[must_use]
    pub fn checked(year: u16, month: u8, day: u8) -> Option<Self> {
        let date = Self::new(year, month, day);
        date.to_naive().map(|_| date)
    }

    #[must_use]
    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
    }

    /// Returns `None` for years the four-digit text form cannot hold.
    #[must_use]
    pub fn from_naive(naive: NaiveDate) -> Option<Self> {
        Some(Self::new(
            u16::try_from(naive.year()).ok().filter(|y| *y <= 9999)?,
            u8::try_from(naive.month()).ok()?,
            u8::try_from(naive.day()).ok()?,
        ))
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

/// One occurrence of a recurrence: an all-day DATE or a DATE-TIME.
///
/// Instances order by their wall-clock fields; an all-day instance sorts as
/// midnight of its day. Ties between different kinds or forms are broken by
/// kind and then form, which keeps the order total.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instance {
    Date(Date),
    DateTime(DateTime),
}

impl Instance {
    /// The calendar date of this instance.
    #[must_use]
    pub const fn date(&self) -> Date {
        match self {
            Self::Date(date) => *date,
            Self::DateTime(dt) => dt.date(),
        }
    }

    /// Hour, minute and second; midnight for all-day instances.
    #[must_use]
    pub const fn time(&self) -> (u8, u8, u8) {
        match self {
            Self::Date(_) => (0, 0, 0),
            Self::DateTime(dt) => (dt.hour, dt.minute, dt.second),
        }
    }

    #[must_use]
    pub const fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// The DATE-TIME form, `None` for all-day instances.
    #[must_use]
    pub const fn form(&self) -> Option<&DateTimeForm> {
        match self {
            Self::Date(_) => None,
            Self::DateTime(dt) => Some(&dt.form),
        }
    }

    /// Wall-clock reading as a chrono value.
    #[must_use]
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(date) => date.to_naive()?.and_hms_opt(0, 0, 0),
            Self::DateTime(dt) => dt.to_naive(),
        }
    }

    fn sort_key(&self) -> (Date, (u8, u8, u8), u8) {
        let kind = match self {
            Self::Date(_) => 0,
            Self::DateTime(_) => 1,
        };
        (self.date(), self.time(), kind)
    }
}

impl PartialOrd for Instance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Instance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.form().cmp(&other.form()))
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{date}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

impl serde::Serialize for Instance {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<Date> for Instance {
    fn from(date: Date) -> Self {
        Self::Date(date)
    }
}

impl From<DateTime> for Instance {
    fn from(dt: DateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl FromStr for Instance {
    type Err = RfcError;

    /// Parses `YYYYMMDD`, `YYYYMMDDTHHMMSS` or `YYYYMMDDTHHMMSSZ`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(crate::rfc::ical::parse::parse_instance(s, None)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_text() {
        let instances = vec![
            Instance::Date(Date::new(2020, 9, 2)),
            Instance::DateTime(DateTime::utc(2013, 1, 1, 5, 0, 0)),
        ];
        assert_eq!(
            serde_json::to_string(&instances).unwrap(),
            r#"["20200902","20130101T050000Z"]"#
        );
    }

    #[test]
    fn date_display() {
        assert_eq!(Date::new(2026, 1, 23).to_string(), "20260123");
    }

    #[test]
    fn checked_rejects_missing_days() {
        assert!(Date::checked(2024, 2, 29).is_some());
        assert!(Date::checked(2023, 2, 29).is_none());
        assert!(Date::checked(2023, 13, 1).is_none());
    }

    #[test]
    fn all_day_sorts_as_midnight() {
        let day = Instance::Date(Date::new(2020, 9, 2));
        let morning = Instance::DateTime(DateTime::floating(2020, 9, 2, 8, 0, 0));
        let day_before = Instance::DateTime(DateTime::floating(2020, 9, 1, 23, 0, 0));
        assert!(day_before < day);
        assert!(day < morning);
    }

    #[test]
    fn parses_all_three_text_forms() {
        assert_eq!(
            "20200902".parse::<Instance>().unwrap(),
            Instance::Date(Date::new(2020, 9, 2))
        );
        assert_eq!(
            "20201230T000000".parse::<Instance>().unwrap(),
            Instance::DateTime(DateTime::floating(2020, 12, 30, 0, 0, 0))
        );
        assert_eq!(
            "20130101T050000Z".parse::<Instance>().unwrap().to_string(),
            "20130101T050000Z"
        );
        assert!("2013-01-01".parse::<Instance>().is_err());
    }
}
