//! iCalendar DATE-TIME value type (RFC 5545 §3.3.5).

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};

use super::Date;

/// Form of a DATE-TIME value (RFC 5545 §3.3.5).
///
/// Ordered so that values with identical wall-clock fields still compare
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateTimeForm {
    /// Floating time, the same wall-clock reading in any zone.
    ///
    /// Example: `19980118T230000`
    Floating,

    /// Absolute UTC instant, written with a trailing `Z`.
    ///
    /// Example: `19980119T070000Z`
    Utc,

    /// Wall-clock time in the zone named by a TZID parameter.
    ///
    /// Example: `TZID=America/New_York:19980119T020000`
    Zoned {
        /// The timezone identifier, normally an IANA name.
        tzid: String,
    },
}

/// DATE-TIME value (RFC 5545 §3.3.5).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime {
    /// Year (e.g., 2026).
    pub year: u16,
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
    /// Hour (0-23).
    pub hour: u8,
    /// Minute (0-59).
    pub minute: u8,
    /// Second (0-60, allowing for leap seconds).
    pub second: u8,
    /// Floating, UTC or zoned.
    pub form: DateTimeForm,
}

impl DateTime {
    /// Creates a DATE-TIME with an explicit form.
    #[must_use]
    pub const fn new(date: Date, hour: u8, minute: u8, second: u8, form: DateTimeForm) -> Self {
        Self {
            year: date.year,
            month: date.month,
            day: date.day,
            hour,
            minute,
            second,
            form,
        }
    }

    /// Creates a floating DATE-TIME.
    #[must_use]
    pub const fn floating(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self::new(
            Date::new(year, month, day),
            hour,
            minute,
            second,
            DateTimeForm::Floating,
        )
    }

    /// Creates a UTC DATE-TIME.
    #[must_use]
    pub const fn utc(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self::new(
            Date::new(year, month, day),
            hour,
            minute,
            second,
            DateTimeForm::Utc,
        )
    }

    /// Creates a zoned DATE-TIME.
    #[must_use]
    pub fn zoned(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        tzid: impl Into<String>,
    ) -> Self {
        Self::new(
            Date::new(year, month, day),
            hour,
            minute,
            second,
            DateTimeForm::Zoned { tzid: tzid.into() },
        )
    }

    /// Returns whether this is a UTC time.
    #[must_use]
    pub fn is_utc(&self) -> bool {
        matches!(self.form, DateTimeForm::Utc)
    }

    /// Returns whether this is a floating time.
    #[must_use]
    pub fn is_floating(&self) -> bool {
        matches!(self.form, DateTimeForm::Floating)
    }

    /// Returns the timezone ID if this is a zoned time.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match &self.form {
            DateTimeForm::Zoned { tzid } => Some(tzid),
            DateTimeForm::Floating | DateTimeForm::Utc => None,
        }
    }

    /// The calendar date part.
    #[must_use]
    pub const fn date(&self) -> Date {
        Date::new(self.year, self.month, self.day)
    }

    /// Wall-clock reading as a chrono value, `None` if the fields do not
    /// name a real date and time.
    #[must_use]
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        self.date().to_naive()?.and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second.min(59)),
        )
    }

    /// Builds a DATE-TIME from a chrono wall-clock value.
    ///
    /// Returns `None` for years outside `0..=9999`, which the text form
    /// cannot represent.
    #[must_use]
    pub fn from_naive(naive: NaiveDateTime, form: DateTimeForm) -> Option<Self> {
        let date = Date::from_naive(naive.date())?;
        let time = naive.time();
        Some(Self::new(
            date,
            u8::try_from(time.hour()).ok()?,
            u8::try_from(time.minute()).ok()?,
            u8::try_from(time.second()).ok()?,
            form,
        ))
    }

    /// Converts to a chrono UTC instant when this value is in UTC form.
    #[must_use]
    pub fn to_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        if self.is_utc() {
            self.to_naive().map(|naive| naive.and_utc())
        } else {
            None
        }
    }

    /// Builds a UTC DATE-TIME from a chrono instant.
    #[must_use]
    pub fn from_utc(instant: chrono::DateTime<chrono::Utc>) -> Option<Self> {
        let naive = instant.naive_utc();
        if naive.year() < 0 {
            return None;
        }
        Self::from_naive(naive, DateTimeForm::Utc)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}T{:02}{:02}{:02}",
            self.date(),
            self.hour,
            self.minute,
            self.second
        )?;
        if self.is_utc() {
            write!(f, "Z")?;
        }
        Ok(())
    }
}
