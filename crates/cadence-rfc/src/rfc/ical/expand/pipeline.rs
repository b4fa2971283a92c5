//! Per-step candidate generation.
//!
//! A [`Plan`] is built once per cursor from the corrected rule and the first
//! instance. Each step `n` starts from a single base candidate computed
//! directly from the first instance, runs the date expanders, resolves dates
//! that do not exist according to `SKIP`, runs the day and time expanders,
//! drops whatever a limiter rejects and finally applies `BYSETPOS`.

use chrono::{Datelike, NaiveDateTime, Timelike};

use super::table::{self, PART_TABLE, PartEntry, Role};
use crate::error::{RfcError, RfcResult};
use crate::rfc::ical::calendar::{CalendarScale, CivilDate};
use crate::rfc::ical::core::{
    Date, DateTime, DateTimeForm, Frequency, Instance, Part, RecurrenceRule, SkipPolicy, Weekday,
};

const SECONDS_PER_DAY: i64 = 86_400;

/// Shortest month of the Gregorian calendar. A first instance on or before
/// this day exists in every month.
const SHORTEST_MONTH: u8 = 28;

/// A civil date and time of day inside one cursor. The date may name a day
/// that does not exist until the skip policy has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Candidate {
    pub date: CivilDate,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Candidate {
    pub const fn midnight(date: CivilDate) -> Self {
        Self {
            date,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    pub const fn end_of_day(date: CivilDate) -> Self {
        Self {
            date,
            hour: 23,
            minute: 59,
            second: 59,
        }
    }

    /// Whether the time of day exists. `BYSECOND=60` names a leap second,
    /// which is never an instance.
    pub const fn has_valid_time(self) -> bool {
        self.hour < 24 && self.minute < 60 && self.second < 60
    }

    pub const fn with_date(self, date: CivilDate) -> Self {
        Self { date, ..self }
    }

    pub fn from_date(date: Date) -> Self {
        Self::midnight(CivilDate::new(i32::from(date.year), date.month, date.day))
    }

    /// Wall-clock fields of a DATE-TIME, regardless of its form.
    pub fn from_datetime(dt: &DateTime) -> Self {
        Self {
            date: CivilDate::new(i32::from(dt.year), dt.month, dt.day),
            hour: dt.hour,
            minute: dt.minute,
            second: dt.second,
        }
    }

    pub fn from_instance(instance: &Instance) -> Self {
        match instance {
            Instance::Date(date) => Self::from_date(*date),
            Instance::DateTime(dt) => Self::from_datetime(dt),
        }
    }

    pub fn from_naive(naive: NaiveDateTime) -> Option<Self> {
        Some(Self {
            date: CivilDate::new(
                naive.year(),
                u8::try_from(naive.month()).ok()?,
                u8::try_from(naive.day()).ok()?,
            ),
            hour: u8::try_from(naive.hour()).ok()?,
            minute: u8::try_from(naive.minute()).ok()?,
            second: u8::try_from(naive.second()).ok()?,
        })
    }

    fn seconds_of_day(self) -> i64 {
        i64::from(self.hour) * 3_600 + i64::from(self.minute) * 60 + i64::from(self.second)
    }
}

/// Result of computing one step.
#[derive(Debug)]
pub(crate) enum Step {
    /// The step lies past the end of the calendar scale.
    OutOfRange,
    /// Nothing in this step can match; the next useful step is `next`.
    Skip { floor: Candidate, next: u64 },
    /// Sorted, deduplicated candidates. Every candidate is at or after
    /// `floor`.
    Candidates {
        floor: Candidate,
        candidates: Vec<Candidate>,
    },
}

/// Everything a cursor needs to compute steps, fixed at cursor creation.
#[derive(Debug)]
pub(crate) struct Plan {
    pub(super) rule: RecurrenceRule,
    pub(super) scale: &'static dyn CalendarScale,
    pub(super) anchor: Candidate,
    pub(super) anchor_weekday: Weekday,
    anchor_day_number: i64,
    form: Option<DateTimeForm>,
    roles: Vec<(Part, Role)>,
    date_expanders: Vec<&'static PartEntry>,
    time_expanders: Vec<&'static PartEntry>,
    limiters: Vec<&'static PartEntry>,
    set_positions: Vec<i16>,
    resets_day: bool,
}

impl Plan {
    /// ## Summary
    /// Builds the plan for an already corrected rule.
    ///
    /// ## Errors
    /// `InvalidRule` if the first instance is not a real date and time.
    pub fn new(rule: RecurrenceRule, first: &Instance) -> RfcResult<Self> {
        let scale = rule.scale().scale();
        let anchor = Candidate::from_instance(first);
        let anchor_day_number = scale
            .day_number(anchor.date)
            .filter(|_| first.to_naive().is_some())
            .ok_or_else(|| {
                RfcError::invalid("DTSTART", format!("{first} is not a valid date or time"))
            })?;
        let freq = rule.frequency();

        let roles: Vec<(Part, Role)> = PART_TABLE
            .iter()
            .filter(|entry| rule.has_part(entry.part))
            .map(|entry| (entry.part, (entry.role)(freq, &rule)))
            .collect();
        let entries_with = |role: Role| -> Vec<&'static PartEntry> {
            PART_TABLE
                .iter()
                .filter(|entry| roles.contains(&(entry.part, role)))
                .collect()
        };

        let (date_expanders, time_expanders): (Vec<_>, Vec<_>) = entries_with(Role::Expand)
            .into_iter()
            .partition(|entry| entry.part <= Part::ByMonthDay);
        let limiters = entries_with(Role::Limit);
        let set_positions = if roles.contains(&(Part::BySetPos, Role::SetPos)) {
            rule.numbers(Part::BySetPos).to_vec()
        } else {
            Vec::new()
        };
        let resets_day = roles.iter().any(|(part, role)| {
            *role == Role::Expand
                && matches!(
                    part,
                    Part::ByWeekNo | Part::ByYearDay | Part::ByMonthDay | Part::ByDay
                )
        });

        Ok(Self {
            scale,
            anchor,
            anchor_weekday: scale.weekday_of(anchor_day_number),
            anchor_day_number,
            form: first.form().cloned(),
            roles,
            date_expanders,
            time_expanders,
            limiters,
            set_positions,
            resets_day,
            rule,
        })
    }

    pub fn frequency(&self) -> Frequency {
        self.rule.frequency()
    }

    pub fn role(&self, part: Part) -> Option<Role> {
        self.roles
            .iter()
            .find(|(p, _)| *p == part)
            .map(|(_, role)| *role)
    }

    pub fn day_number(&self, date: CivilDate) -> Option<i64> {
        self.scale.day_number(date)
    }

    /// The candidate on the given day, keeping the time of `template`.
    pub fn on_day(&self, template: Candidate, day_number: i64) -> Option<Candidate> {
        self.scale
            .from_day_number(day_number)
            .map(|date| template.with_date(date))
    }

    /// Whether every step yields exactly one instance, so that steps and
    /// instances can be counted interchangeably.
    pub fn is_regular(&self) -> bool {
        self.roles.is_empty()
            && (self.frequency() <= Frequency::Weekly
                || self.anchor.date.day <= SHORTEST_MONTH
                || self.rule.skip() != SkipPolicy::Omit)
    }

    /// Converts a candidate to an instance of the first instance's kind and
    /// form. `None` past year 9999.
    pub fn instance(&self, candidate: Candidate) -> Option<Instance> {
        let year = u16::try_from(candidate.date.year)
            .ok()
            .filter(|year| *year <= 9999)?;
        let date = Date::checked(year, candidate.date.month, candidate.date.day)?;
        Some(match &self.form {
            None => Instance::Date(date),
            Some(form) => Instance::DateTime(DateTime::new(
                date,
                candidate.hour,
                candidate.minute,
                candidate.second,
                form.clone(),
            )),
        })
    }

    fn anchor_seconds(&self) -> Option<i64> {
        self.anchor_day_number
            .checked_mul(SECONDS_PER_DAY)?
            .checked_add(self.anchor.seconds_of_day())
    }

    fn step_units(&self, n: u64) -> Option<i64> {
        i64::try_from(n)
            .ok()?
            .checked_mul(i64::from(self.rule.interval()))
    }

    /// Seconds since the scale's epoch of the base of a sub-daily step.
    fn base_seconds(&self, n: u64) -> Option<i64> {
        let unit = self.frequency().fixed_seconds()?;
        self.anchor_seconds()?
            .checked_add(self.step_units(n)?.checked_mul(unit)?)
    }

    /// The base candidate of step `n`, always computed from the first
    /// instance.
    pub fn base(&self, n: u64) -> Option<Candidate> {
        let units = self.step_units(n)?;
        let anchor = self.anchor;
        let day = if self.resets_day { 1 } else { anchor.date.day };
        match self.frequency() {
            Frequency::Yearly => {
                let year = i32::try_from(i64::from(anchor.date.year).checked_add(units)?).ok()?;
                Some(anchor.with_date(CivilDate::new(year, anchor.date.month, day)))
            }
            Frequency::Monthly => {
                let (year, month) =
                    self.scale
                        .add_months(anchor.date.year, anchor.date.month, units)?;
                Some(anchor.with_date(CivilDate::new(year, month, day)))
            }
            Frequency::Weekly => {
                self.on_day(anchor, self.anchor_day_number.checked_add(units.checked_mul(7)?)?)
            }
            Frequency::Daily => self.on_day(anchor, self.anchor_day_number.checked_add(units)?),
            Frequency::Hourly | Frequency::Minutely | Frequency::Secondly => {
                let total = self.base_seconds(n)?;
                let date = self
                    .scale
                    .from_day_number(total.div_euclid(SECONDS_PER_DAY))?;
                let time = total.rem_euclid(SECONDS_PER_DAY);
                Some(Candidate {
                    date,
                    hour: u8::try_from(time / 3_600).ok()?,
                    minute: u8::try_from(time % 3_600 / 60).ok()?,
                    second: u8::try_from(time % 60).ok()?,
                })
            }
        }
    }

    /// Lower bound of every candidate a step can produce.
    fn floor(&self, base: Candidate) -> Option<Candidate> {
        Some(match self.frequency() {
            // BYWEEKNO weeks may start up to three days before January 1.
            Frequency::Yearly => Candidate::midnight(CivilDate::new(base.date.year - 1, 12, 29)),
            Frequency::Monthly => {
                Candidate::midnight(CivilDate::new(base.date.year, base.date.month, 1))
            }
            Frequency::Weekly => {
                let start = self
                    .scale
                    .start_of_week(self.day_number(base.date)?, self.rule.week_start());
                Candidate::midnight(self.scale.from_day_number(start)?)
            }
            Frequency::Daily => Candidate::midnight(base.date),
            Frequency::Hourly => Candidate {
                minute: 0,
                second: 0,
                ..base
            },
            Frequency::Minutely => Candidate { second: 0, ..base },
            Frequency::Secondly => base,
        })
    }

    /// Lower bound, as a day number, on the next day the date-level
    /// limiters can accept. `None` when they all accept `candidate`.
    fn next_accepted_day(&self, candidate: Candidate) -> Option<i64> {
        self.limiters
            .iter()
            .filter(|entry| entry.part <= Part::ByDay && !(entry.limit)(self, &candidate))
            .map(|entry| table::next_accepted_day(self, entry.part, candidate.date))
            .max()
            .flatten()
    }

    /// For rules up to WEEKLY, the first step past a stretch of days (or
    /// hours and minutes for sub-daily rules) that a limiter already
    /// rejects at the base of step `n`.
    fn jump_past_rejected(&self, n: u64, base: Candidate) -> Option<u64> {
        let interval = i64::from(self.rule.interval());
        let next = match self.frequency() {
            Frequency::Yearly | Frequency::Monthly => return None,
            Frequency::Weekly => {
                // The step is empty only if every day of its week is rejected.
                let week = self
                    .scale
                    .start_of_week(self.day_number(base.date)?, self.rule.week_start());
                let mut target = None;
                for day in week..week + 7 {
                    target = Some(self.next_accepted_day(self.on_day(base, day)?)?);
                }
                let first_week = self
                    .scale
                    .start_of_week(self.anchor_day_number, self.rule.week_start());
                steps_to_reach(target? - 6 - first_week, 7 * interval)?
            }
            Frequency::Daily => {
                let target = self.next_accepted_day(base)?;
                steps_to_reach(target - self.anchor_day_number, interval)?
            }
            Frequency::Hourly | Frequency::Minutely | Frequency::Secondly => {
                let step_seconds = self.frequency().fixed_seconds()?;
                let total = self.base_seconds(n)?;
                let time_boundary = self
                    .limiters
                    .iter()
                    .filter_map(|entry| {
                        let unit = match entry.part {
                            Part::ByHour => 3_600,
                            Part::ByMinute => 60,
                            _ => return None,
                        };
                        (unit > step_seconds && !(entry.limit)(self, &base)).then_some(unit)
                    })
                    .max()
                    .and_then(|unit| total.div_euclid(unit).checked_add(1)?.checked_mul(unit));
                let day_boundary = self
                    .next_accepted_day(base)
                    .and_then(|day| day.checked_mul(SECONDS_PER_DAY));
                let boundary = time_boundary.max(day_boundary)?;
                steps_to_reach(
                    boundary.checked_sub(self.anchor_seconds()?)?,
                    step_seconds.checked_mul(interval)?,
                )?
            }
        };
        (next > n).then_some(next)
    }

    fn resolve_skip(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let skip = self.rule.skip();
        candidates
            .into_iter()
            .filter_map(|candidate| {
                let date = candidate.date;
                if self.scale.is_valid(date) {
                    return Some(candidate);
                }
                match skip {
                    SkipPolicy::Omit => None,
                    SkipPolicy::Backward => {
                        let last = self.scale.days_in_month(date.year, date.month);
                        (last > 0).then(|| {
                            candidate.with_date(CivilDate::new(date.year, date.month, last))
                        })
                    }
                    SkipPolicy::Forward => {
                        let (year, month) = self.scale.add_months(date.year, date.month, 1)?;
                        Some(candidate.with_date(CivilDate::new(year, month, 1)))
                    }
                }
            })
            .collect()
    }

    fn expand(&self, entries: &[&'static PartEntry], mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        for entry in entries {
            let mut expanded = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                (entry.expand)(self, candidate, &mut expanded);
            }
            candidates = expanded;
        }
        candidates
    }

    /// Computes step `n`.
    pub fn step(&self, n: u64) -> Step {
        let Some(base) = self.base(n) else {
            return Step::OutOfRange;
        };
        if base.date.year > *self.scale.year_range().end() {
            return Step::OutOfRange;
        }
        let Some(floor) = self.floor(base) else {
            return Step::OutOfRange;
        };
        if let Some(next) = self.jump_past_rejected(n, base) {
            tracing::trace!(step = n, next, "Skipping rejected days");
            return Step::Skip { floor, next };
        }

        let candidates = self.expand(&self.date_expanders, vec![base]);
        let candidates = self.resolve_skip(candidates);
        let mut candidates = self.expand(&self.time_expanders, candidates);
        candidates.retain(|candidate| {
            candidate.has_valid_time()
                && self.limiters.iter().all(|entry| (entry.limit)(self, candidate))
        });
        candidates.sort_unstable();
        candidates.dedup();
        if !self.set_positions.is_empty() {
            candidates = select_positions(&candidates, &self.set_positions);
        }

        tracing::trace!(step = n, candidates = candidates.len(), "Expanded step");
        Step::Candidates { floor, candidates }
    }

    /// Lower estimate of how many steps of a regular plan lie entirely
    /// before `target`.
    pub fn steps_before(&self, target: Candidate) -> u64 {
        let interval = i64::from(self.rule.interval());
        let anchor = self.anchor;
        let units = match self.frequency() {
            Frequency::Yearly => i64::from(target.date.year - anchor.date.year),
            Frequency::Monthly => {
                let per_year = i64::from(self.scale.max_months_in_year());
                i64::from(target.date.year - anchor.date.year) * per_year
                    + i64::from(target.date.month)
                    - i64::from(anchor.date.month)
            }
            Frequency::Weekly
            | Frequency::Daily
            | Frequency::Hourly
            | Frequency::Minutely
            | Frequency::Secondly => {
                let seconds = self.day_number(target.date).and_then(|day| {
                    day.checked_mul(SECONDS_PER_DAY)?
                        .checked_add(target.seconds_of_day())?
                        .checked_sub(self.anchor_seconds()?)
                });
                let unit = self.frequency().fixed_seconds().unwrap_or(SECONDS_PER_DAY);
                seconds.map_or(0, |seconds| seconds / unit)
            }
        };
        // One step of slack keeps the estimate below the target.
        u64::try_from(units / interval - 1).unwrap_or(0)
    }
}

/// Smallest number of strides that covers `offset`.
fn steps_to_reach(offset: i64, stride: i64) -> Option<u64> {
    u64::try_from(offset.checked_add(stride - 1)?.div_euclid(stride)).ok()
}

/// Keeps the 1-based (or negative, from the end) positions of a sorted set.
fn select_positions(candidates: &[Candidate], positions: &[i16]) -> Vec<Candidate> {
    let len = i64::try_from(candidates.len()).unwrap_or(i64::MAX);
    let mut picked: Vec<Candidate> = positions
        .iter()
        .filter_map(|&position| {
            let position = i64::from(position);
            let index = if position > 0 { position - 1 } else { len + position };
            usize::try_from(index)
                .ok()
                .and_then(|index| candidates.get(index))
                .copied()
        })
        .collect();
    picked.sort_unstable();
    picked.dedup();
    picked
}
