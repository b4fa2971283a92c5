//! Canonical RECUR text writer.

use crate::rfc::ical::core::{RecurrenceRule, SkipPolicy, Termination, Weekday};

/// Serializes a rule to canonical RECUR text.
///
/// Order: `FREQ, INTERVAL, RSCALE, SKIP, WKST`, the BY-parts from `BYMONTH`
/// down to `BYSETPOS`, then `UNTIL` or `COUNT`, then experimental parts.
/// `INTERVAL=1`, `WKST=MO` and `SKIP=OMIT` are omitted. A rule does not
/// record whether these were spelled out, so `WKST=MO` in the input is
/// dropped: the rule it parses to is equal to one without it. `RSCALE` is
/// different. Its presence is kept, because RFC 5545 strict mode rejects
/// `SKIP` without it, and it is written when set explicitly or when a
/// non-default `SKIP` requires it.
#[must_use]
pub fn serialize(rule: &RecurrenceRule) -> String {
    let mut out = String::with_capacity(64);
    push(&mut out, "FREQ", rule.frequency());

    if rule.interval() != 1 {
        push(&mut out, "INTERVAL", rule.interval());
    }
    if rule.explicit_scale().is_some() || rule.skip() != SkipPolicy::Omit {
        push(&mut out, "RSCALE", rule.scale());
    }
    if rule.skip() != SkipPolicy::Omit {
        push(&mut out, "SKIP", rule.skip());
    }
    if rule.week_start() != Weekday::Monday {
        push(&mut out, "WKST", rule.week_start());
    }

    // BTreeMap iteration follows Part's declaration order
    for (part, values) in rule.parts() {
        push(&mut out, part.as_str(), values);
    }

    match rule.termination() {
        Termination::Unbounded => {}
        Termination::Until(until) => push(&mut out, "UNTIL", until),
        Termination::Count(count) => push(&mut out, "COUNT", count),
    }

    for (name, value) in rule.experimental() {
        push(&mut out, name, value);
    }

    out
}

fn push(out: &mut String, key: &str, value: impl std::fmt::Display) {
    if !out.is_empty() {
        out.push(';');
    }
    out.push_str(&format!("{key}={value}"));
}
