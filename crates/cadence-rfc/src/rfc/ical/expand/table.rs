//! BY-part dispatch table (RFC 5545 §3.3.10, "BYxxx rule parts" table).
//!
//! Whether a part expands the candidate set or limits it depends on the
//! frequency and on which other parts are present. [`PART_TABLE`] holds one
//! entry per part with its priority, the function deciding its role and the
//! functions implementing both roles.

use std::fmt;

use super::pipeline::{Candidate, Plan};
use crate::rfc::ical::calendar::CivilDate;
use crate::rfc::ical::core::{Frequency, Part, RecurrenceRule, Weekday, WeekdayNum};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Expand,
    Limit,
    SetPos,
}

pub(crate) type RoleFn = fn(Frequency, &RecurrenceRule) -> Role;
pub(crate) type ExpandFn = fn(&Plan, Candidate, &mut Vec<Candidate>);
pub(crate) type LimitFn = fn(&Plan, &Candidate) -> bool;

pub(crate) struct PartEntry {
    pub part: Part,
    /// Expansion order; lower runs first.
    pub priority: u8,
    pub role: RoleFn,
    pub expand: ExpandFn,
    pub limit: LimitFn,
}

impl fmt::Debug for PartEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartEntry")
            .field("part", &self.part)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// One entry per part, in priority order.
pub(crate) static PART_TABLE: [PartEntry; 9] = [
    PartEntry {
        part: Part::ByMonth,
        priority: 0,
        role: by_month_role,
        expand: expand_by_month,
        limit: limit_by_month,
    },
    PartEntry {
        part: Part::ByWeekNo,
        priority: 1,
        role: by_week_no_role,
        expand: expand_by_week_no,
        limit: limit_by_week_no,
    },
    PartEntry {
        part: Part::ByYearDay,
        priority: 2,
        role: by_year_day_role,
        expand: expand_by_year_day,
        limit: limit_by_year_day,
    },
    PartEntry {
        part: Part::ByMonthDay,
        priority: 3,
        role: by_month_day_role,
        expand: expand_by_month_day,
        limit: limit_by_month_day,
    },
    PartEntry {
        part: Part::ByDay,
        priority: 4,
        role: by_day_role,
        expand: expand_by_day,
        limit: limit_by_day,
    },
    PartEntry {
        part: Part::ByHour,
        priority: 5,
        role: |freq, _| coarser_than(freq, Frequency::Hourly),
        expand: |plan, candidate, out| {
            for hour in selectors::<u8>(plan, Part::ByHour) {
                out.push(Candidate { hour, ..candidate });
            }
        },
        limit: |plan, candidate| plan.rule.numbers(Part::ByHour).contains(&i16::from(candidate.hour)),
    },
    PartEntry {
        part: Part::ByMinute,
        priority: 6,
        role: |freq, _| coarser_than(freq, Frequency::Minutely),
        expand: |plan, candidate, out| {
            for minute in selectors::<u8>(plan, Part::ByMinute) {
                out.push(Candidate { minute, ..candidate });
            }
        },
        limit: |plan, candidate| {
            plan.rule
                .numbers(Part::ByMinute)
                .contains(&i16::from(candidate.minute))
        },
    },
    PartEntry {
        part: Part::BySecond,
        priority: 7,
        role: |freq, _| coarser_than(freq, Frequency::Secondly),
        expand: |plan, candidate, out| {
            for second in selectors::<u8>(plan, Part::BySecond) {
                out.push(Candidate { second, ..candidate });
            }
        },
        limit: |plan, candidate| {
            plan.rule
                .numbers(Part::BySecond)
                .contains(&i16::from(candidate.second))
        },
    },
    // Applied by the pipeline after every other part.
    PartEntry {
        part: Part::BySetPos,
        priority: 8,
        role: |_, _| Role::SetPos,
        expand: |_, candidate, out| out.push(candidate),
        limit: |_, _| true,
    },
];

fn coarser_than(freq: Frequency, unit: Frequency) -> Role {
    if freq > unit { Role::Expand } else { Role::Limit }
}

/// Positive selectors of a part that fit the target type.
fn selectors<T: TryFrom<i16>>(plan: &Plan, part: Part) -> impl Iterator<Item = T> + '_ {
    plan.rule
        .numbers(part)
        .iter()
        .filter_map(|&value| T::try_from(value).ok())
}

/// Resolves a signed selector against a unit of `len` elements: positive
/// values count from 1, negative values from the end.
fn resolve(selector: i16, len: i32) -> Option<i32> {
    let selector = i32::from(selector);
    let index = if selector > 0 {
        selector
    } else {
        len + selector + 1
    };
    (1..=len).contains(&index).then_some(index)
}

fn by_month_role(freq: Frequency, rule: &RecurrenceRule) -> Role {
    if freq == Frequency::Yearly
        && !rule.has_part(Part::ByWeekNo)
        && !rule.has_part(Part::ByYearDay)
    {
        Role::Expand
    } else {
        Role::Limit
    }
}

fn by_week_no_role(freq: Frequency, _rule: &RecurrenceRule) -> Role {
    if freq == Frequency::Yearly {
        Role::Expand
    } else {
        Role::Limit
    }
}

fn by_year_day_role(freq: Frequency, rule: &RecurrenceRule) -> Role {
    if freq == Frequency::Yearly && !rule.has_part(Part::ByWeekNo) {
        Role::Expand
    } else {
        Role::Limit
    }
}

fn by_month_day_role(freq: Frequency, rule: &RecurrenceRule) -> Role {
    match freq {
        Frequency::Monthly => Role::Expand,
        Frequency::Yearly
            if !rule.has_part(Part::ByWeekNo) && !rule.has_part(Part::ByYearDay) =>
        {
            Role::Expand
        }
        _ => Role::Limit,
    }
}

fn by_day_role(freq: Frequency, rule: &RecurrenceRule) -> Role {
    match freq {
        Frequency::Weekly => Role::Expand,
        Frequency::Monthly if !rule.has_part(Part::ByMonthDay) => Role::Expand,
        Frequency::Yearly
            if !rule.has_part(Part::ByYearDay) && !rule.has_part(Part::ByMonthDay) =>
        {
            Role::Expand
        }
        _ => Role::Limit,
    }
}

fn expand_by_month(plan: &Plan, candidate: Candidate, out: &mut Vec<Candidate>) {
    let year = candidate.date.year;
    let months = plan.scale.months_in_year(year);
    for month in selectors::<u8>(plan, Part::ByMonth).filter(|month| *month <= months) {
        out.push(candidate.with_date(CivilDate::new(year, month, candidate.date.day)));
    }
}

/// Week starts when `BYDAY` expands inside the week, every day of the week
/// when another day-level part limits, and otherwise the first instance's
/// weekday.
fn expand_by_week_no(plan: &Plan, candidate: Candidate, out: &mut Vec<Candidate>) {
    let week_start = plan.rule.week_start();
    let (first, days) = if plan.role(Part::ByDay) == Some(Role::Expand) {
        (0, 1)
    } else if plan.rule.has_part(Part::ByYearDay) || plan.rule.has_part(Part::ByMonthDay) {
        (0, 7)
    } else {
        (i64::from(plan.anchor_weekday.offset_from(week_start)), 1)
    };
    for &week in plan.rule.numbers(Part::ByWeekNo) {
        let Some(start) = plan
            .scale
            .date_of_week(candidate.date.year, week, week_start)
        else {
            continue;
        };
        for offset in first..first + days {
            out.extend(plan.on_day(candidate, start + offset));
        }
    }
}

fn expand_by_year_day(plan: &Plan, candidate: Candidate, out: &mut Vec<Candidate>) {
    let year = candidate.date.year;
    let len = i32::from(plan.scale.days_in_year(year));
    for &selector in plan.rule.numbers(Part::ByYearDay) {
        let date = resolve(selector, len)
            .and_then(|day| u16::try_from(day).ok())
            .and_then(|day| plan.scale.date_of_year_day(year, day));
        out.extend(date.map(|date| candidate.with_date(date)));
    }
}

/// Positive days past the end of the month are kept for the skip policy;
/// negative days that fall before the 1st are dropped.
fn expand_by_month_day(plan: &Plan, candidate: Candidate, out: &mut Vec<Candidate>) {
    let year = candidate.date.year;
    let months = if plan.frequency() == Frequency::Yearly && !plan.rule.has_part(Part::ByMonth) {
        1..=plan.scale.months_in_year(year)
    } else {
        candidate.date.month..=candidate.date.month
    };
    for month in months {
        let len = i16::from(plan.scale.days_in_month(year, month));
        for &selector in plan.rule.numbers(Part::ByMonthDay) {
            let day = if selector > 0 { selector } else { len + selector + 1 };
            if let Ok(day @ 1..) = u8::try_from(day) {
                out.push(candidate.with_date(CivilDate::new(year, month, day)));
            }
        }
    }
}

/// The span a `BYDAY` selector is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DaySpan {
    Week,
    Month,
    Year,
}

fn day_span(plan: &Plan) -> DaySpan {
    match plan.frequency() {
        Frequency::Yearly if plan.rule.has_part(Part::ByWeekNo) => DaySpan::Week,
        Frequency::Yearly if !plan.rule.has_part(Part::ByMonth) => DaySpan::Year,
        Frequency::Monthly | Frequency::Yearly => DaySpan::Month,
        _ => DaySpan::Week,
    }
}

/// First day number and length of the span containing `date`.
fn span_of(plan: &Plan, span: DaySpan, date: CivilDate) -> Option<(i64, i32)> {
    match span {
        DaySpan::Week => {
            let start = plan
                .scale
                .start_of_week(plan.day_number(date)?, plan.rule.week_start());
            Some((start, 7))
        }
        DaySpan::Month => Some((
            plan.day_number(CivilDate::new(date.year, date.month, 1))?,
            i32::from(plan.scale.days_in_month(date.year, date.month)),
        )),
        DaySpan::Year => Some((
            plan.day_number(CivilDate::new(date.year, 1, 1))?,
            i32::from(plan.scale.days_in_year(date.year)),
        )),
    }
}

/// 1-based days within a span of `len` days starting on `first_weekday` that
/// match a `BYDAY` selector. Ordinals pick a single occurrence.
fn matching_days(selector: WeekdayNum, first_weekday: Weekday, len: i32) -> Vec<i32> {
    let offset = i32::from(selector.weekday.offset_from(first_weekday));
    if offset >= len {
        return Vec::new();
    }
    let occurrences = (len - 1 - offset) / 7 + 1;
    match selector.ordinal {
        None => (0..occurrences).map(|i| offset + 7 * i + 1).collect(),
        Some(ordinal) => resolve(i16::from(ordinal), occurrences)
            .map(|nth| vec![offset + 7 * (nth - 1) + 1])
            .unwrap_or_default(),
    }
}

fn expand_by_day(plan: &Plan, candidate: Candidate, out: &mut Vec<Candidate>) {
    let span = day_span(plan);
    let Some((first, len)) = span_of(plan, span, candidate.date) else {
        return;
    };
    let first_weekday = plan.scale.weekday_of(first);
    for &selector in plan.rule.by_day() {
        let selector = if span == DaySpan::Week {
            WeekdayNum::every(selector.weekday)
        } else {
            selector
        };
        for day in matching_days(selector, first_weekday, len) {
            out.extend(plan.on_day(candidate, first + i64::from(day) - 1));
        }
    }
}

fn limit_by_month(plan: &Plan, candidate: &Candidate) -> bool {
    plan.rule
        .numbers(Part::ByMonth)
        .contains(&i16::from(candidate.date.month))
}

fn limit_by_week_no(plan: &Plan, candidate: &Candidate) -> bool {
    let week_start = plan.rule.week_start();
    let Some((year, week)) = plan.scale.week_of_year(candidate.date, week_start) else {
        return false;
    };
    let Some(weeks) = plan.scale.weeks_in_year(year, week_start) else {
        return false;
    };
    plan.rule
        .numbers(Part::ByWeekNo)
        .iter()
        .any(|&selector| resolve(selector, i32::from(weeks)) == Some(i32::from(week)))
}

fn limit_by_year_day(plan: &Plan, candidate: &Candidate) -> bool {
    let date = candidate.date;
    let Some(day) = plan.scale.day_of_year(date) else {
        return false;
    };
    let len = i32::from(plan.scale.days_in_year(date.year));
    plan.rule
        .numbers(Part::ByYearDay)
        .iter()
        .any(|&selector| resolve(selector, len) == Some(i32::from(day)))
}

fn limit_by_month_day(plan: &Plan, candidate: &Candidate) -> bool {
    let date = candidate.date;
    let len = i32::from(plan.scale.days_in_month(date.year, date.month));
    plan.rule
        .numbers(Part::ByMonthDay)
        .iter()
        .any(|&selector| resolve(selector, len) == Some(i32::from(date.day)))
}

/// Lower bound, as a day number, on the next day after `date` that `part`
/// can accept once its limiter has rejected `date`. Parts without a
/// cheaper bound give the following day.
pub(super) fn next_accepted_day(plan: &Plan, part: Part, date: CivilDate) -> Option<i64> {
    let first_of_next_month = || -> Option<i64> {
        let (year, month) = plan.scale.add_months(date.year, date.month, 1)?;
        plan.day_number(CivilDate::new(year, month, 1))
    };
    match part {
        Part::ByMonth => {
            let months = plan.rule.numbers(Part::ByMonth);
            let later = months
                .iter()
                .filter(|&&month| month > i16::from(date.month))
                .min();
            let (year, month) = match later {
                Some(&month) => (date.year, month),
                None => (date.year.checked_add(1)?, *months.iter().min()?),
            };
            plan.day_number(CivilDate::new(year, u8::try_from(month).ok()?, 1))
        }
        Part::ByMonthDay => {
            let len = i32::from(plan.scale.days_in_month(date.year, date.month));
            let later = plan
                .rule
                .numbers(Part::ByMonthDay)
                .iter()
                .filter_map(|&selector| resolve(selector, len))
                .filter(|day| *day > i32::from(date.day))
                .min()
                .and_then(|day| u8::try_from(day).ok());
            match later {
                Some(day) => plan.day_number(CivilDate::new(date.year, date.month, day)),
                None => first_of_next_month(),
            }
        }
        Part::ByYearDay => {
            let len = i32::from(plan.scale.days_in_year(date.year));
            let today = i32::from(plan.scale.day_of_year(date)?);
            let later = plan
                .rule
                .numbers(Part::ByYearDay)
                .iter()
                .filter_map(|&selector| resolve(selector, len))
                .filter(|day| *day > today)
                .min()
                .and_then(|day| u16::try_from(day).ok());
            match later {
                Some(day) => plan
                    .scale
                    .date_of_year_day(date.year, day)
                    .and_then(|later| plan.day_number(later)),
                None => plan.day_number(CivilDate::new(date.year.checked_add(1)?, 1, 1)),
            }
        }
        _ => plan.day_number(date)?.checked_add(1),
    }
}

/// Ordinals only narrow the match at MONTHLY and YEARLY; elsewhere they were
/// removed or rejected by the compliance check.
fn limit_by_day(plan: &Plan, candidate: &Candidate) -> bool {
    let Some(day_number) = plan.day_number(candidate.date) else {
        return false;
    };
    let weekday = plan.scale.weekday_of(day_number);
    let span = match plan.frequency() {
        Frequency::Monthly => Some(DaySpan::Month),
        Frequency::Yearly => Some(day_span(plan)),
        _ => None,
    };
    plan.rule.by_day().iter().any(|selector| {
        if selector.weekday != weekday {
            return false;
        }
        let (Some(span), Some(_)) = (span, selector.ordinal) else {
            return true;
        };
        span_of(plan, span, candidate.date).is_some_and(|(first, len)| {
            let day = i32::try_from(day_number - first + 1).unwrap_or(0);
            matching_days(*selector, plan.scale.weekday_of(first), len).contains(&day)
        })
    })
}
