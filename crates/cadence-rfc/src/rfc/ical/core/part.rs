//! BY-part names and selector lists of a recurrence rule.

use std::fmt;
use std::ops::RangeInclusive;

use super::WeekdayNum;

/// A restriction part of a recurrence rule (RFC 5545 §3.3.10).
///
/// Variants are declared in canonical serialization order, so the derived
/// `Ord` doubles as the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Part {
    ByMonth,
    ByWeekNo,
    ByYearDay,
    ByMonthDay,
    ByDay,
    ByHour,
    ByMinute,
    BySecond,
    BySetPos,
}

impl Part {
    /// All parts in canonical order.
    pub const ALL: [Self; 9] = [
        Self::ByMonth,
        Self::ByWeekNo,
        Self::ByYearDay,
        Self::ByMonthDay,
        Self::ByDay,
        Self::ByHour,
        Self::ByMinute,
        Self::BySecond,
        Self::BySetPos,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ByMonth => "BYMONTH",
            Self::ByWeekNo => "BYWEEKNO",
            Self::ByYearDay => "BYYEARDAY",
            Self::ByMonthDay => "BYMONTHDAY",
            Self::ByDay => "BYDAY",
            Self::ByHour => "BYHOUR",
            Self::ByMinute => "BYMINUTE",
            Self::BySecond => "BYSECOND",
            Self::BySetPos => "BYSETPOS",
        }
    }

    /// Parses a part name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_ascii_uppercase();
        Self::ALL.into_iter().find(|part| part.as_str() == upper)
    }

    /// Magnitude range of legal selector values. For `BYDAY` this is the
    /// range of the optional ordinal.
    #[must_use]
    pub const fn range(self) -> RangeInclusive<i16> {
        match self {
            Self::BySecond => 0..=60,
            Self::ByMinute => 0..=59,
            Self::ByHour => 0..=23,
            Self::ByMonthDay => 1..=31,
            Self::ByYearDay | Self::BySetPos => 1..=366,
            Self::ByWeekNo | Self::ByDay => 1..=53,
            Self::ByMonth => 1..=12,
        }
    }

    /// Whether negative selectors (counted from the end of the unit) are legal.
    #[must_use]
    pub const fn signed(self) -> bool {
        matches!(
            self,
            Self::ByMonthDay | Self::ByYearDay | Self::ByWeekNo | Self::BySetPos | Self::ByDay
        )
    }

    /// Whether this part selects a time of day rather than a date.
    #[must_use]
    pub const fn is_time_part(self) -> bool {
        matches!(self, Self::ByHour | Self::ByMinute | Self::BySecond)
    }

    /// Checks a single selector value against the legal range.
    ///
    /// ## Errors
    /// Returns the violated constraint as text.
    pub fn check_value(self, value: i16) -> Result<(), String> {
        let range = self.range();
        let magnitude = if self.signed() {
            i32::from(value).abs()
        } else {
            i32::from(value)
        };
        if (i32::from(*range.start())..=i32::from(*range.end())).contains(&magnitude) {
            Ok(())
        } else if self.signed() {
            Err(format!(
                "value {value} outside ±{}..={}",
                range.start(),
                range.end()
            ))
        } else {
            Err(format!(
                "value {value} outside {}..={}",
                range.start(),
                range.end()
            ))
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selector list of one BY-part, kept in the order it was given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartValues {
    /// Signed integers for every part except `BYDAY`.
    Numbers(Vec<i16>),
    /// Weekdays with optional ordinals for `BYDAY`.
    Days(Vec<WeekdayNum>),
}

impl PartValues {
    /// Numeric selectors; empty for a `BYDAY` list.
    #[must_use]
    pub fn numbers(&self) -> &[i16] {
        match self {
            Self::Numbers(values) => values,
            Self::Days(_) => &[],
        }
    }

    /// Weekday selectors; empty for numeric lists.
    #[must_use]
    pub fn days(&self) -> &[WeekdayNum] {
        match self {
            Self::Numbers(_) => &[],
            Self::Days(days) => days,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Numbers(values) => values.len(),
            Self::Days(days) => days.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a numeric selector list holds `value`.
    #[must_use]
    pub fn contains(&self, value: i16) -> bool {
        self.numbers().contains(&value)
    }
}

impl fmt::Display for PartValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numbers(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{value}")?;
                }
            }
            Self::Days(days) => {
                for (i, day) in days.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{day}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_matches_declaration() {
        let mut parts = vec![Part::BySetPos, Part::ByDay, Part::ByMonth, Part::ByHour];
        parts.sort();
        assert_eq!(
            parts,
            vec![Part::ByMonth, Part::ByDay, Part::ByHour, Part::BySetPos]
        );
    }

    #[test]
    fn ranges_reject_zero_for_signed_parts() {
        assert!(Part::ByMonthDay.check_value(0).is_err());
        assert!(Part::ByMonthDay.check_value(-31).is_ok());
        assert!(Part::ByMonthDay.check_value(32).is_err());
        assert!(Part::BySecond.check_value(60).is_ok());
        assert!(Part::ByHour.check_value(-1).is_err());
        assert!(Part::ByMonth.check_value(13).is_err());
        assert!(Part::BySetPos.check_value(-366).is_ok());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Part::parse("byWeekNo"), Some(Part::ByWeekNo));
        assert_eq!(Part::parse("BYFOO"), None);
    }
}
