//! `UNTIL` normalization against the first instance.
//!
//! Candidates are compared as wall-clock readings in the first instance's
//! frame, so the bound is brought into the same frame once per cursor.

use std::str::FromStr;

use chrono::TimeZone;
use chrono_tz::Tz;

use super::pipeline::Candidate;
use crate::rfc::ical::core::{DateTime, DateTimeForm, Instance, Until};

/// ## Summary
/// Converts an `UNTIL` value into an inclusive bound comparable with the
/// candidates of a cursor anchored at `first`.
///
/// A DATE bound on a DATE-TIME start means midnight of that day, or its last
/// second when `through_end_of_day` is set. A UTC bound on a zoned start is
/// converted into the start's zone.
pub(crate) fn normalize(until: &Until, first: &Instance, through_end_of_day: bool) -> Candidate {
    match (first, until) {
        (Instance::Date(_), Until::Date(date)) => Candidate::from_date(*date),
        (Instance::Date(_), Until::DateTime(bound)) => Candidate::from_date(bound.date()),
        (Instance::DateTime(_), Until::Date(date)) => {
            let midnight = Candidate::from_date(*date);
            if through_end_of_day {
                Candidate::end_of_day(midnight.date)
            } else {
                midnight
            }
        }
        (Instance::DateTime(start), Until::DateTime(bound)) => match (&start.form, &bound.form) {
            (DateTimeForm::Zoned { tzid }, DateTimeForm::Utc) => in_zone(bound, tzid),
            _ => Candidate::from_datetime(bound),
        },
    }
}

/// Strips prefixes some producers put in front of IANA names.
fn normalize_tzid(tzid: &str) -> &str {
    let tzid = tzid.trim().trim_start_matches('/');
    tzid.strip_prefix("mozilla.org/20050126_1/").unwrap_or(tzid)
}

fn in_zone(bound: &DateTime, tzid: &str) -> Candidate {
    let Some(naive) = bound.to_naive() else {
        return Candidate::from_datetime(bound);
    };
    match Tz::from_str(normalize_tzid(tzid)) {
        Ok(tz) => Candidate::from_naive(tz.from_utc_datetime(&naive).naive_local())
            .unwrap_or_else(|| Candidate::from_datetime(bound)),
        Err(_) => {
            tracing::warn!(
                tzid,
                until = %bound,
                "Unknown TZID, comparing UNTIL as wall-clock time"
            );
            Candidate::from_datetime(bound)
        }
    }
}
