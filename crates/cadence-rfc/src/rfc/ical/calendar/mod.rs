//! Calendar scale arithmetic (RFC 7529 `RSCALE`).
//!
//! The generation pipeline never does date math itself. It asks a
//! [`CalendarScale`] for month lengths, weekdays, week numbers and day
//! stepping, so another scale only needs a new implementation of the trait.
//! All operations are integer-only and work on [`CivilDate`] triples, which
//! may temporarily name a day that does not exist (e.g. February 30) until
//! the skip policy resolves it.

mod gregorian;

use std::fmt;
use std::ops::RangeInclusive;

pub use gregorian::Gregorian;

use super::core::Weekday;

/// Year, month and day within some calendar scale. The day may be past the
/// end of the month while an expansion is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CivilDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl CivilDate {
    #[must_use]
    pub const fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }
}

impl fmt::Display for CivilDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Identifier of a registered calendar scale, as written in `RSCALE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalendarScaleId {
    #[default]
    Gregorian,
}

impl CalendarScaleId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gregorian => "GREGORIAN",
        }
    }

    /// Parses a scale name (case-insensitive). Unregistered names yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GREGORIAN" => Some(Self::Gregorian),
            _ => None,
        }
    }

    /// The arithmetic backing this scale.
    #[must_use]
    pub fn scale(self) -> &'static dyn CalendarScale {
        static GREGORIAN: Gregorian = Gregorian;
        match self {
            Self::Gregorian => &GREGORIAN,
        }
    }
}

impl fmt::Display for CalendarScaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability contract for a calendar scale.
///
/// Implementors provide month structure, a linear day count and weekdays;
/// everything week- and year-relative is derived from those.
pub trait CalendarScale: fmt::Debug + Send + Sync {
    /// Years this scale can represent.
    fn year_range(&self) -> RangeInclusive<i32>;

    fn is_leap_year(&self, year: i32) -> bool;

    fn months_in_year(&self, year: i32) -> u8;

    /// Largest month count of any year, used to validate `BYMONTH`.
    fn max_months_in_year(&self) -> u8;

    fn days_in_month(&self, year: i32, month: u8) -> u8;

    /// Linear day number; consecutive days have consecutive numbers.
    /// `None` when the date does not exist.
    fn day_number(&self, date: CivilDate) -> Option<i64>;

    /// Inverse of [`CalendarScale::day_number`].
    fn from_day_number(&self, day_number: i64) -> Option<CivilDate>;

    /// Weekday of a linear day number.
    fn weekday_of(&self, day_number: i64) -> Weekday;

    fn is_valid(&self, date: CivilDate) -> bool {
        self.year_range().contains(&date.year)
            && (1..=self.months_in_year(date.year)).contains(&date.month)
            && (1..=self.days_in_month(date.year, date.month)).contains(&date.day)
    }

    fn days_in_year(&self, year: i32) -> u16 {
        (1..=self.months_in_year(year))
            .map(|month| u16::from(self.days_in_month(year, month)))
            .sum()
    }

    fn weekday(&self, date: CivilDate) -> Option<Weekday> {
        self.day_number(date).map(|n| self.weekday_of(n))
    }

    /// 1-based day of the year.
    fn day_of_year(&self, date: CivilDate) -> Option<u16> {
        let first = self.day_number(CivilDate::new(date.year, 1, 1))?;
        let offset = self.day_number(date)? - first;
        u16::try_from(offset + 1).ok()
    }

    /// Date of the given 1-based day of the year.
    fn date_of_year_day(&self, year: i32, year_day: u16) -> Option<CivilDate> {
        if year_day == 0 || year_day > self.days_in_year(year) {
            return None;
        }
        let first = self.day_number(CivilDate::new(year, 1, 1))?;
        self.from_day_number(first + i64::from(year_day) - 1)
    }

    /// Adds whole months to a year/month pair. Scales whose years differ in
    /// month count must override this.
    fn add_months(&self, year: i32, month: u8, months: i64) -> Option<(i32, u8)> {
        let per_year = i64::from(self.max_months_in_year());
        let index = i64::from(year) * per_year + i64::from(month) - 1 + months;
        let year = i32::try_from(index.div_euclid(per_year)).ok()?;
        let month = u8::try_from(index.rem_euclid(per_year) + 1).ok()?;
        Some((year, month))
    }

    /// Day number of the first day of week 1.
    ///
    /// Week 1 is the first week starting on `week_start` that has at least
    /// four days in the year (ISO 8601 when `week_start` is Monday).
    fn week_one_start(&self, year: i32, week_start: Weekday) -> Option<i64> {
        let jan_first = self.day_number(CivilDate::new(year, 1, 1))?;
        let offset = i64::from(self.weekday_of(jan_first).offset_from(week_start));
        let containing = jan_first - offset;
        Some(if offset <= 3 { containing } else { containing + 7 })
    }

    /// 52 or 53.
    fn weeks_in_year(&self, year: i32, week_start: Weekday) -> Option<u8> {
        let this = self.week_one_start(year, week_start)?;
        let next = self.week_one_start(year + 1, week_start)?;
        u8::try_from((next - this) / 7).ok()
    }

    /// Week-numbering year and 1-based week of a date.
    fn week_of_year(&self, date: CivilDate, week_start: Weekday) -> Option<(i32, u8)> {
        let day = self.day_number(date)?;
        let this = self.week_one_start(date.year, week_start)?;
        if day < this {
            let previous = self.week_one_start(date.year - 1, week_start)?;
            return Some((date.year - 1, u8::try_from((day - previous) / 7 + 1).ok()?));
        }
        let next = self.week_one_start(date.year + 1, week_start)?;
        if day >= next {
            return Some((date.year + 1, 1));
        }
        Some((date.year, u8::try_from((day - this) / 7 + 1).ok()?))
    }

    /// Day number of the first day of a week. `week` may be negative to count
    /// from the last week of the year.
    fn date_of_week(&self, year: i32, week: i16, week_start: Weekday) -> Option<i64> {
        let weeks = i16::from(self.weeks_in_year(year, week_start)?);
        let week = if week < 0 { weeks + week + 1 } else { week };
        if week < 1 || week > weeks {
            return None;
        }
        Some(self.week_one_start(year, week_start)? + 7 * i64::from(week - 1))
    }

    /// Day number of the first day of the week containing `day_number`.
    fn start_of_week(&self, day_number: i64, week_start: Weekday) -> i64 {
        day_number - i64::from(self.weekday_of(day_number).offset_from(week_start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gregorian() -> &'static dyn CalendarScale {
        CalendarScaleId::Gregorian.scale()
    }

    #[test]
    fn scale_id_parses_case_insensitively() {
        assert_eq!(
            CalendarScaleId::parse("gregorian"),
            Some(CalendarScaleId::Gregorian)
        );
        assert_eq!(CalendarScaleId::parse("HEBREW"), None);
    }

    #[test]
    fn iso_week_numbers() {
        let scale = gregorian();
        // 2021-01-01 is a Friday and belongs to week 53 of 2020.
        assert_eq!(
            scale.week_of_year(CivilDate::new(2021, 1, 1), Weekday::Monday),
            Some((2020, 53))
        );
        assert_eq!(
            scale.week_of_year(CivilDate::new(2021, 1, 4), Weekday::Monday),
            Some((2021, 1))
        );
        // 2024-12-30 is a Monday and starts week 1 of 2025.
        assert_eq!(
            scale.week_of_year(CivilDate::new(2024, 12, 30), Weekday::Monday),
            Some((2025, 1))
        );
        assert_eq!(scale.weeks_in_year(2020, Weekday::Monday), Some(53));
        assert_eq!(scale.weeks_in_year(2021, Weekday::Monday), Some(52));
    }

    #[test]
    fn week_start_changes_numbering() {
        let scale = gregorian();
        // 2017-01-01 is a Sunday: with Sunday weeks it opens week 1.
        assert_eq!(
            scale.week_of_year(CivilDate::new(2017, 1, 1), Weekday::Sunday),
            Some((2017, 1))
        );
        assert_eq!(
            scale.week_of_year(CivilDate::new(2017, 1, 1), Weekday::Monday),
            Some((2016, 52))
        );
    }

    #[test]
    fn date_of_week_counts_from_either_end() {
        let scale = gregorian();
        let first = scale.date_of_week(2021, 1, Weekday::Monday).unwrap();
        assert_eq!(
            scale.from_day_number(first),
            Some(CivilDate::new(2021, 1, 4))
        );
        let last = scale.date_of_week(2020, -1, Weekday::Monday).unwrap();
        assert_eq!(
            scale.from_day_number(last),
            Some(CivilDate::new(2020, 12, 28))
        );
        assert!(scale.date_of_week(2021, 53, Weekday::Monday).is_none());
    }

    #[test]
    fn month_stepping_wraps_years() {
        let scale = gregorian();
        assert_eq!(scale.add_months(2020, 11, 3), Some((2021, 2)));
        assert_eq!(scale.add_months(2020, 1, -1), Some((2019, 12)));
        assert_eq!(scale.add_months(2020, 1, 24), Some((2022, 1)));
    }

    #[test]
    fn year_days() {
        let scale = gregorian();
        assert_eq!(scale.days_in_year(2024), 366);
        assert_eq!(scale.days_in_year(2023), 365);
        assert_eq!(
            scale.day_of_year(CivilDate::new(2024, 12, 31)),
            Some(366)
        );
        assert_eq!(
            scale.date_of_year_day(2023, 60),
            Some(CivilDate::new(2023, 3, 1))
        );
        assert_eq!(scale.date_of_year_day(2023, 366), None);
    }
}
