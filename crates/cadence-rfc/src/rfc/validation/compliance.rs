//! Mode-dependent acceptance of recurrence rules.
//!
//! Every rule shape that the four compliance modes treat differently is a
//! [`Condition`]. [`TABLE`] maps each condition to a [`Verdict`] per mode:
//! accept as is, accept with a fixed [`Correction`], or reject. Conditions
//! visible from the rule alone are checked when the rule is parsed or
//! re-moded; the rest need the first instance and are checked when a cursor
//! is created.

use std::fmt;

use cadence_core::types::ComplianceMode;

use crate::error::{RfcError, RfcResult};
use crate::rfc::ical::calendar::CalendarScaleId;
use crate::rfc::ical::core::{
    Frequency, Instance, Part, PartValues, RecurrenceRule, SkipPolicy, Until, WeekdayNum,
};

/// A rule shape whose treatment depends on the compliance mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// A selector outside the legal range of its part.
    SelectorOutOfRange,
    /// `BYWEEKNO` with a frequency other than YEARLY.
    WeekNoOnNonYearly,
    /// `BYYEARDAY` with DAILY, WEEKLY or MONTHLY.
    YearDayOnDailyWeeklyMonthly,
    /// `BYMONTHDAY` with WEEKLY.
    MonthDayOnWeekly,
    /// Numbered `BYDAY` outside MONTHLY/YEARLY, or YEARLY with `BYWEEKNO`.
    NumberedWeekdayOutOfScope,
    /// `BYSETPOS` as the only BY-part.
    SetPosWithoutOtherParts,
    /// `RSCALE` or `SKIP` present at all.
    ScaleKeys,
    /// `SKIP` without an explicit `RSCALE`.
    SkipWithoutScale,
    /// A non-default `SKIP` with a frequency that never produces missing dates.
    SkipOnIncompatibleFrequency,
    /// An `X-` part.
    ExperimentalPart,
    /// A DATE `UNTIL` with time-level BY-parts on a DATE-TIME start.
    DateUntilWithTimeParts,
    /// Time-level BY-parts on an all-day start.
    TimePartsOnDateStart,
    /// HOURLY or finer on an all-day start.
    SubDailyOnDateStart,
    /// A DATE-TIME `UNTIL` on an all-day start, or a floating `UNTIL` on a
    /// UTC or zoned start.
    UntilFormMismatch,
}

impl Condition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SelectorOutOfRange => "selector out of range",
            Self::WeekNoOnNonYearly => "BYWEEKNO requires FREQ=YEARLY",
            Self::YearDayOnDailyWeeklyMonthly => {
                "BYYEARDAY is not allowed with FREQ=DAILY, WEEKLY or MONTHLY"
            }
            Self::MonthDayOnWeekly => "BYMONTHDAY is not allowed with FREQ=WEEKLY",
            Self::NumberedWeekdayOutOfScope => {
                "numbered BYDAY requires FREQ=MONTHLY or FREQ=YEARLY without BYWEEKNO"
            }
            Self::SetPosWithoutOtherParts => "BYSETPOS requires another BY-part",
            Self::ScaleKeys => "RSCALE and SKIP are not part of RFC 2445",
            Self::SkipWithoutScale => "SKIP requires RSCALE",
            Self::SkipOnIncompatibleFrequency => {
                "SKIP only applies to FREQ=MONTHLY or FREQ=YEARLY"
            }
            Self::ExperimentalPart => "experimental parts are not allowed",
            Self::DateUntilWithTimeParts => {
                "a DATE UNTIL is ambiguous with BYHOUR, BYMINUTE or BYSECOND on a DATE-TIME start"
            }
            Self::TimePartsOnDateStart => "time parts require a DATE-TIME start",
            Self::SubDailyOnDateStart => "sub-daily frequencies require a DATE-TIME start",
            Self::UntilFormMismatch => "UNTIL does not match the value type of the start",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixed repair a lax mode applies instead of rejecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Correction {
    /// Ordinals are stripped from `BYDAY`.
    WeekdayOrdinalsIgnored,
    /// `SKIP` falls back to OMIT.
    SkipIgnored,
    /// A DATE `UNTIL` covers its whole day.
    UntilThroughEndOfDay,
    /// `BYHOUR`, `BYMINUTE` and `BYSECOND` are dropped.
    TimePartsIgnored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Correct(Correction),
    Reject,
}

/// Result of a successful check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accept,
    AcceptWithCorrection(Vec<Correction>),
}

impl Outcome {
    #[must_use]
    pub fn corrections(&self) -> &[Correction] {
        match self {
            Self::Accept => &[],
            Self::AcceptWithCorrection(corrections) => corrections,
        }
    }
}

/// One row of the compliance table.
#[derive(Debug)]
pub struct Row {
    pub condition: Condition,
    pub rfc2445_strict: Verdict,
    pub rfc2445_lax: Verdict,
    pub rfc5545_strict: Verdict,
    pub rfc5545_lax: Verdict,
}

impl Row {
    const fn verdict(&self, mode: ComplianceMode) -> Verdict {
        match mode {
            ComplianceMode::Rfc2445Strict => self.rfc2445_strict,
            ComplianceMode::Rfc2445Lax => self.rfc2445_lax,
            ComplianceMode::Rfc5545Strict => self.rfc5545_strict,
            ComplianceMode::Rfc5545Lax => self.rfc5545_lax,
        }
    }
}

const fn row(
    condition: Condition,
    rfc2445_strict: Verdict,
    rfc2445_lax: Verdict,
    rfc5545_strict: Verdict,
    rfc5545_lax: Verdict,
) -> Row {
    Row {
        condition,
        rfc2445_strict,
        rfc2445_lax,
        rfc5545_strict,
        rfc5545_lax,
    }
}

use Verdict::{Accept as A, Correct as C, Reject as R};

/// The compliance table, one row per condition.
pub static TABLE: [Row; 14] = [
    row(Condition::SelectorOutOfRange, R, R, R, R),
    row(Condition::WeekNoOnNonYearly, R, A, R, A),
    row(Condition::YearDayOnDailyWeeklyMonthly, R, A, R, A),
    row(Condition::MonthDayOnWeekly, R, A, R, A),
    row(
        Condition::NumberedWeekdayOutOfScope,
        R,
        C(Correction::WeekdayOrdinalsIgnored),
        R,
        C(Correction::WeekdayOrdinalsIgnored),
    ),
    row(Condition::SetPosWithoutOtherParts, R, A, R, A),
    row(Condition::ScaleKeys, R, A, A, A),
    row(Condition::SkipWithoutScale, A, A, R, A),
    row(
        Condition::SkipOnIncompatibleFrequency,
        R,
        C(Correction::SkipIgnored),
        R,
        C(Correction::SkipIgnored),
    ),
    row(Condition::ExperimentalPart, A, A, R, A),
    row(
        Condition::DateUntilWithTimeParts,
        R,
        C(Correction::UntilThroughEndOfDay),
        R,
        C(Correction::UntilThroughEndOfDay),
    ),
    row(
        Condition::TimePartsOnDateStart,
        R,
        C(Correction::TimePartsIgnored),
        R,
        C(Correction::TimePartsIgnored),
    ),
    row(Condition::SubDailyOnDateStart, R, R, R, R),
    row(Condition::UntilFormMismatch, A, A, R, A),
];

/// Looks up the verdict for a condition under a mode.
#[must_use]
pub fn verdict(condition: Condition, mode: ComplianceMode) -> Verdict {
    TABLE
        .iter()
        .find(|row| row.condition == condition)
        .map_or(Verdict::Reject, |row| row.verdict(mode))
}

/// A condition found in a rule, with the part that triggered it.
#[derive(Debug)]
struct Finding {
    condition: Condition,
    part: String,
}

impl Finding {
    fn new(condition: Condition, part: impl Into<String>) -> Self {
        Self {
            condition,
            part: part.into(),
        }
    }
}

fn static_findings(rule: &RecurrenceRule) -> Vec<Finding> {
    let mut findings = Vec::new();
    let freq = rule.frequency();

    for (part, values) in rule.parts() {
        let out_of_range = match values {
            PartValues::Numbers(numbers) => numbers.iter().any(|&v| part.check_value(v).is_err()),
            PartValues::Days(days) => days
                .iter()
                .filter_map(|day| day.ordinal)
                .any(|n| part.check_value(i16::from(n)).is_err()),
        };
        if out_of_range {
            findings.push(Finding::new(Condition::SelectorOutOfRange, part.as_str()));
        }
    }

    if rule.has_part(Part::ByWeekNo) && freq != Frequency::Yearly {
        findings.push(Finding::new(Condition::WeekNoOnNonYearly, "BYWEEKNO"));
    }
    if rule.has_part(Part::ByYearDay)
        && matches!(
            freq,
            Frequency::Daily | Frequency::Weekly | Frequency::Monthly
        )
    {
        findings.push(Finding::new(
            Condition::YearDayOnDailyWeeklyMonthly,
            "BYYEARDAY",
        ));
    }
    if rule.has_part(Part::ByMonthDay) && freq == Frequency::Weekly {
        findings.push(Finding::new(Condition::MonthDayOnWeekly, "BYMONTHDAY"));
    }
    let numbered = rule.by_day().iter().any(|day| day.ordinal.is_some());
    let ordinal_scope = match freq {
        Frequency::Monthly => true,
        Frequency::Yearly => !rule.has_part(Part::ByWeekNo),
        _ => false,
    };
    if numbered && !ordinal_scope {
        findings.push(Finding::new(Condition::NumberedWeekdayOutOfScope, "BYDAY"));
    }
    if rule.has_part(Part::BySetPos) && rule.parts().count() == 1 {
        findings.push(Finding::new(Condition::SetPosWithoutOtherParts, "BYSETPOS"));
    }

    let skipping = rule.skip() != SkipPolicy::Omit;
    if rule.explicit_scale().is_some() || skipping {
        let part = if rule.explicit_scale().is_some() {
            "RSCALE"
        } else {
            "SKIP"
        };
        findings.push(Finding::new(Condition::ScaleKeys, part));
    }
    if skipping && rule.explicit_scale().is_none() {
        findings.push(Finding::new(Condition::SkipWithoutScale, "SKIP"));
    }
    if skipping && freq < Frequency::Monthly {
        findings.push(Finding::new(Condition::SkipOnIncompatibleFrequency, "SKIP"));
    }
    if let Some((name, _)) = rule.experimental().first() {
        findings.push(Finding::new(Condition::ExperimentalPart, name.clone()));
    }

    findings
}

fn has_time_parts(rule: &RecurrenceRule) -> bool {
    rule.parts().any(|(part, _)| part.is_time_part())
}

fn anchor_findings(rule: &RecurrenceRule, first: &Instance) -> Vec<Finding> {
    let mut findings = Vec::new();
    match first {
        Instance::Date(_) => {
            if rule.frequency() < Frequency::Daily {
                findings.push(Finding::new(Condition::SubDailyOnDateStart, "FREQ"));
            }
            if has_time_parts(rule) {
                let part = rule
                    .parts()
                    .find(|(part, _)| part.is_time_part())
                    .map_or("BYHOUR", |(part, _)| part.as_str());
                findings.push(Finding::new(Condition::TimePartsOnDateStart, part));
            }
            if matches!(rule.until(), Some(Until::DateTime(_))) {
                findings.push(Finding::new(Condition::UntilFormMismatch, "UNTIL"));
            }
        }
        Instance::DateTime(start) => match rule.until() {
            Some(Until::Date(_)) if has_time_parts(rule) => {
                findings.push(Finding::new(Condition::DateUntilWithTimeParts, "UNTIL"));
            }
            Some(Until::DateTime(until)) if until.is_floating() && !start.is_floating() => {
                findings.push(Finding::new(Condition::UntilFormMismatch, "UNTIL"));
            }
            _ => {}
        },
    }
    findings
}

fn judge(findings: Vec<Finding>, mode: ComplianceMode) -> RfcResult<Outcome> {
    let mut corrections = Vec::new();
    for finding in findings {
        match verdict(finding.condition, mode) {
            Verdict::Accept => {}
            Verdict::Correct(correction) => {
                tracing::debug!(
                    condition = %finding.condition,
                    part = %finding.part,
                    ?correction,
                    %mode,
                    "Correcting recurrence rule"
                );
                if !corrections.contains(&correction) {
                    corrections.push(correction);
                }
            }
            Verdict::Reject => {
                return Err(RfcError::invalid(
                    finding.part,
                    format!("{} (rejected in {mode})", finding.condition),
                ));
            }
        }
    }
    Ok(if corrections.is_empty() {
        Outcome::Accept
    } else {
        Outcome::AcceptWithCorrection(corrections)
    })
}

/// ## Summary
/// Checks the conditions visible from the rule alone.
///
/// ## Errors
/// `InvalidRule` naming the offending part if `mode` rejects the rule.
pub fn check(rule: &RecurrenceRule, mode: ComplianceMode) -> RfcResult<Outcome> {
    judge(static_findings(rule), mode)
}

/// ## Summary
/// Checks the conditions that depend on the first instance.
///
/// ## Errors
/// `InvalidRule` naming the offending part if `mode` rejects the rule for
/// this first instance.
pub fn check_anchor(
    rule: &RecurrenceRule,
    mode: ComplianceMode,
    first: &Instance,
) -> RfcResult<Outcome> {
    judge(anchor_findings(rule, first), mode)
}

/// Applies a correction to a rule. `UntilThroughEndOfDay` only affects how
/// a cursor reads the bound and leaves the rule untouched.
pub(crate) fn apply(rule: &mut RecurrenceRule, correction: Correction) {
    match correction {
        Correction::WeekdayOrdinalsIgnored => {
            if let Some(PartValues::Days(days)) = rule.parts.get_mut(&Part::ByDay) {
                let mut plain: Vec<WeekdayNum> = Vec::with_capacity(days.len());
                for day in days.iter() {
                    let every = WeekdayNum::every(day.weekday);
                    if !plain.contains(&every) {
                        plain.push(every);
                    }
                }
                *days = plain;
            }
        }
        Correction::SkipIgnored => rule.skip = SkipPolicy::Omit,
        Correction::TimePartsIgnored => {
            rule.parts.retain(|part, _| !part.is_time_part());
        }
        Correction::UntilThroughEndOfDay => {}
    }
}

/// ## Summary
/// Runs the static check under the rule's own mode and returns the rule
/// with the mode's corrections applied. A `SKIP` left in place implies an
/// explicit `RSCALE`.
///
/// ## Errors
/// `InvalidRule` if the rule's mode rejects it.
pub(crate) fn enforce(mut rule: RecurrenceRule) -> RfcResult<RecurrenceRule> {
    let outcome = check(&rule, rule.mode())?;
    for &correction in outcome.corrections() {
        apply(&mut rule, correction);
    }
    if rule.skip != SkipPolicy::Omit && rule.scale.is_none() {
        rule.scale = Some(CalendarScaleId::default());
    }
    Ok(rule)
}
