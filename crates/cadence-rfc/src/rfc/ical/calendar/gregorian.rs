//! Proleptic Gregorian calendar backed by `chrono`.

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};

use super::{CalendarScale, CivilDate};
use crate::rfc::ical::core::Weekday;

/// The Gregorian calendar, the default `RSCALE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gregorian;

impl Gregorian {
    fn naive(date: CivilDate) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(date.year, u32::from(date.month), u32::from(date.day))
    }
}

impl CalendarScale for Gregorian {
    fn year_range(&self) -> RangeInclusive<i32> {
        0..=9999
    }

    fn is_leap_year(&self, year: i32) -> bool {
        (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
    }

    fn months_in_year(&self, _year: i32) -> u8 {
        12
    }

    fn max_months_in_year(&self) -> u8 {
        12
    }

    fn days_in_month(&self, year: i32, month: u8) -> u8 {
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if self.is_leap_year(year) => 29,
            2 => 28,
            _ => 0,
        }
    }

    fn day_number(&self, date: CivilDate) -> Option<i64> {
        Self::naive(date).map(|naive| i64::from(naive.num_days_from_ce()))
    }

    fn from_day_number(&self, day_number: i64) -> Option<CivilDate> {
        let naive = NaiveDate::from_num_days_from_ce_opt(i32::try_from(day_number).ok()?)?;
        Some(CivilDate::new(
            naive.year(),
            u8::try_from(naive.month()).ok()?,
            u8::try_from(naive.day()).ok()?,
        ))
    }

    fn weekday_of(&self, day_number: i64) -> Weekday {
        // Day 1 of the common era (0001-01-01) was a Monday.
        match (day_number - 1).rem_euclid(7) {
            0 => Weekday::Monday,
            1 => Weekday::Tuesday,
            2 => Weekday::Wednesday,
            3 => Weekday::Thursday,
            4 => Weekday::Friday,
            5 => Weekday::Saturday,
            _ => Weekday::Sunday,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_years() {
        let scale = Gregorian;
        assert!(scale.is_leap_year(2000));
        assert!(scale.is_leap_year(2024));
        assert!(!scale.is_leap_year(1900));
        assert!(!scale.is_leap_year(2023));
        assert_eq!(scale.days_in_month(2024, 2), 29);
        assert_eq!(scale.days_in_month(2023, 2), 28);
        assert_eq!(scale.days_in_month(2023, 4), 30);
    }

    #[test]
    fn weekday_agrees_with_chrono() {
        let scale = Gregorian;
        for (date, expected) in [
            (CivilDate::new(2018, 1, 1), Weekday::Monday),
            (CivilDate::new(2013, 1, 17), Weekday::Thursday),
            (CivilDate::new(2020, 4, 4), Weekday::Saturday),
            (CivilDate::new(1, 1, 1), Weekday::Monday),
        ] {
            assert_eq!(scale.weekday(date), Some(expected), "{date}");
        }
    }

    #[test]
    fn day_numbers_round_trip() {
        let scale = Gregorian;
        let date = CivilDate::new(2020, 2, 29);
        let n = scale.day_number(date).unwrap();
        assert_eq!(scale.from_day_number(n), Some(date));
        assert_eq!(scale.from_day_number(n + 1), Some(CivilDate::new(2020, 3, 1)));
        assert!(scale.day_number(CivilDate::new(2021, 2, 29)).is_none());
    }

    #[test]
    fn validity_follows_month_lengths() {
        let scale = Gregorian;
        assert!(scale.is_valid(CivilDate::new(2024, 2, 29)));
        assert!(!scale.is_valid(CivilDate::new(2023, 2, 29)));
        assert!(!scale.is_valid(CivilDate::new(2023, 4, 31)));
        assert!(!scale.is_valid(CivilDate::new(10_000, 1, 1)));
    }
}
