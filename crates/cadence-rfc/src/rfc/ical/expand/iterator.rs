//! Lazy cursor over the instances of a recurrence rule.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use cadence_core::config::RecurrenceConfig;
use cadence_core::constants::DEFAULT_MAX_EMPTY_STEPS;

use super::pipeline::{Candidate, Plan, Step};
use super::until;
use crate::error::{RfcError, RfcResult};
use crate::rfc::ical::core::{Instance, RecurrenceRule};
use crate::rfc::validation::compliance::{self, Correction};

/// Tunables of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterOptions {
    /// Consecutive steps without an instance after which the sequence is
    /// considered finished.
    pub max_empty_steps: u32,
}

impl IterOptions {
    #[must_use]
    pub const fn with_max_empty_steps(mut self, max_empty_steps: u32) -> Self {
        self.max_empty_steps = max_empty_steps;
        self
    }
}

impl Default for IterOptions {
    fn default() -> Self {
        Self {
            max_empty_steps: DEFAULT_MAX_EMPTY_STEPS,
        }
    }
}

impl From<&RecurrenceConfig> for IterOptions {
    fn from(config: &RecurrenceConfig) -> Self {
        Self {
            max_empty_steps: config.max_empty_steps,
        }
    }
}

#[derive(Debug)]
struct Pending {
    at: Candidate,
    instance: Instance,
}

/// Forward-only cursor over the instances of a rule.
///
/// Instances come out strictly increasing and never before the first
/// instance. The first instance itself is only produced if the rule
/// generates it. Once the sequence has ended the cursor stays ended.
#[derive(Debug)]
pub struct RecurrenceIterator {
    plan: Plan,
    until: Option<Candidate>,
    count: Option<u64>,
    max_empty_steps: u32,
    /// Next step to compute.
    step: u64,
    empty_steps: u32,
    /// Instances accepted so far, including the pending ones.
    accepted: u64,
    last: Option<Candidate>,
    pending: VecDeque<Pending>,
    finished: bool,
}

impl RecurrenceIterator {
    /// ## Summary
    /// Creates a cursor anchored at `first`, running the first-instance
    /// dependent compliance checks under the rule's mode.
    ///
    /// ## Errors
    /// `InvalidRule` if the mode rejects the rule for this first instance
    /// or `first` is not a real date and time.
    pub fn new(rule: &RecurrenceRule, first: Instance, options: IterOptions) -> RfcResult<Self> {
        let mode = rule.mode();
        let mut rule = compliance::enforce(rule.clone())?;
        let outcome = compliance::check_anchor(&rule, mode, &first)?;
        for &correction in outcome.corrections() {
            compliance::apply(&mut rule, correction);
        }
        let through_end_of_day = outcome
            .corrections()
            .contains(&Correction::UntilThroughEndOfDay);

        let until = rule
            .until()
            .map(|bound| until::normalize(bound, &first, through_end_of_day));
        let count = rule.count().map(u64::from);
        tracing::debug!(
            rule = %rule,
            first = %first,
            %mode,
            ?until,
            "Created recurrence cursor"
        );

        Ok(Self {
            plan: Plan::new(rule, &first)?,
            until,
            count,
            max_empty_steps: options.max_empty_steps,
            step: 0,
            empty_steps: 0,
            accepted: 0,
            last: None,
            pending: VecDeque::new(),
            finished: false,
        })
    }

    /// Instances returned so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        let pending = u64::try_from(self.pending.len()).unwrap_or(u64::MAX);
        self.accepted.saturating_sub(pending)
    }

    /// ## Summary
    /// Returns the next instance.
    ///
    /// ## Errors
    /// `NoSuchInstance` once the sequence has ended.
    pub fn next_instance(&mut self) -> RfcResult<Instance> {
        self.fill();
        self.pending
            .pop_front()
            .map(|pending| pending.instance)
            .ok_or(RfcError::NoSuchInstance)
    }

    /// The instance the next call to [`RecurrenceIterator::next_instance`]
    /// returns, without consuming it.
    pub fn peek(&mut self) -> Option<&Instance> {
        self.fill();
        self.pending.front().map(|pending| &pending.instance)
    }

    pub fn has_next(&mut self) -> bool {
        self.peek().is_some()
    }

    /// ## Summary
    /// Skips the next `n` instances.
    ///
    /// Rules without BY-parts whose every step yields one instance are
    /// advanced arithmetically; everything else steps through the skipped
    /// instances.
    pub fn skip_to(&mut self, n: u64) {
        let mut skipped = 0;
        while skipped < n {
            if self.pending.pop_front().is_some() {
                skipped += 1;
                continue;
            }
            if self.finished {
                break;
            }
            let jumped = if self.plan.is_regular() {
                self.skip_steps(n - skipped)
            } else {
                0
            };
            if jumped == 0 {
                self.advance();
            }
            skipped += jumped;
        }
        tracing::trace!(requested = n, skipped, "Skipped instances");
    }

    /// ## Summary
    /// Skips every instance before `target`, comparing wall-clock fields.
    pub fn fast_forward(&mut self, target: &Instance) {
        let target = Candidate::from_instance(target);
        self.drop_pending_before(target);
        if self.pending.is_empty() && !self.finished && self.plan.is_regular() {
            let steps = self.plan.steps_before(target);
            if steps > self.step {
                self.skip_steps(steps - self.step);
            }
        }
        loop {
            self.fill();
            if !self.drop_pending_before(target) {
                break;
            }
        }
    }

    /// Drops pending instances before `target`. Returns whether the buffer
    /// ran empty while the sequence continues.
    fn drop_pending_before(&mut self, target: Candidate) -> bool {
        while let Some(front) = self.pending.front() {
            if front.at >= target {
                return false;
            }
            self.pending.pop_front();
        }
        !self.finished
    }

    /// Skips whole steps of a regular plan without computing them. Returns
    /// the number of instances skipped, never more than lie before `UNTIL`.
    fn skip_steps(&mut self, n: u64) -> u64 {
        let mut n = match self.count {
            Some(count) => n.min(count.saturating_sub(self.accepted)),
            None => n,
        };
        if let Some(until) = self.until {
            n = n.min(self.plan.steps_before(until).saturating_sub(self.step));
        }
        if n == 0 {
            return 0;
        }
        self.step = self.step.saturating_add(n);
        self.accepted = self.accepted.saturating_add(n);
        if self.count.is_some_and(|count| self.accepted >= count) {
            self.finish("count reached");
            return n;
        }
        self.last = self
            .step
            .checked_sub(1)
            .and_then(|previous| match self.plan.step(previous) {
                Step::Candidates { candidates, .. } => candidates.last().copied(),
                Step::OutOfRange | Step::Skip { .. } => None,
            });
        n
    }

    fn fill(&mut self) {
        while self.pending.is_empty() && !self.finished {
            self.advance();
        }
    }

    fn finish(&mut self, reason: &'static str) {
        if !self.finished {
            tracing::trace!(reason, step = self.step, accepted = self.accepted, "Recurrence finished");
            self.finished = true;
        }
    }

    fn past_until(&self, candidate: Candidate) -> bool {
        self.until.is_some_and(|until| candidate > until)
    }

    /// Computes one step and queues its instances.
    fn advance(&mut self) {
        let step = self.step;
        let (floor, candidates) = match self.plan.step(step) {
            Step::OutOfRange => {
                self.finish("end of calendar range");
                return;
            }
            Step::Skip { floor, next } => {
                self.step = next;
                (floor, Vec::new())
            }
            Step::Candidates { floor, candidates } => {
                self.step = step + 1;
                (floor, candidates)
            }
        };
        if self.past_until(floor) {
            self.finish("past until");
            return;
        }

        let before = self.pending.len();
        for candidate in candidates {
            if candidate < self.plan.anchor || self.last.is_some_and(|last| candidate <= last) {
                continue;
            }
            if self.past_until(candidate) {
                self.finish("past until");
                break;
            }
            let Some(instance) = self.plan.instance(candidate) else {
                self.finish("end of calendar range");
                break;
            };
            self.pending.push_back(Pending {
                at: candidate,
                instance,
            });
            self.accepted += 1;
            self.last = Some(candidate);
            if self.count.is_some_and(|count| self.accepted >= count) {
                self.finish("count reached");
                break;
            }
        }

        if self.pending.len() > before {
            self.empty_steps = 0;
        } else if !self.finished {
            self.empty_steps += 1;
            if self.empty_steps >= self.max_empty_steps {
                tracing::warn!(
                    rule = %self.plan.rule,
                    steps = self.empty_steps,
                    "No instance within the empty step limit, ending recurrence"
                );
                self.finish("empty step limit");
            }
        }
    }
}

impl Iterator for RecurrenceIterator {
    type Item = Instance;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_instance().ok()
    }
}

impl FusedIterator for RecurrenceIterator {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::{Date, DateTime};
    use cadence_core::types::ComplianceMode;

    fn rule(text: &str) -> RecurrenceRule {
        RecurrenceRule::parse(text, ComplianceMode::Rfc5545Lax).unwrap()
    }

    #[test]
    fn count_bounds_the_sequence() {
        let mut cursor = rule("FREQ=DAILY;COUNT=3")
            .iterator(Date::new(2021, 1, 1))
            .unwrap();
        assert_eq!(cursor.by_ref().count(), 3);
        assert!(matches!(cursor.next_instance(), Err(RfcError::NoSuchInstance)));
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.emitted(), 3);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut cursor = rule("FREQ=WEEKLY").iterator(Date::new(2021, 1, 4)).unwrap();
        assert!(cursor.has_next());
        let peeked = cursor.peek().cloned();
        assert_eq!(peeked, Some(Instance::Date(Date::new(2021, 1, 4))));
        assert_eq!(cursor.next(), peeked);
        assert_eq!(cursor.next(), Some(Instance::Date(Date::new(2021, 1, 11))));
    }

    #[test]
    fn skip_to_matches_stepping() {
        for text in [
            "FREQ=DAILY",
            "FREQ=MONTHLY;BYDAY=1MO,-1FR",
            "FREQ=MONTHLY",
            "FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=29",
        ] {
            let rule = rule(text);
            let first = Date::new(2020, 1, 31);
            let expected: Vec<Instance> = rule.iterator(first).unwrap().take(8).collect();

            let mut cursor = rule.iterator(first).unwrap();
            cursor.skip_to(5);
            assert_eq!(cursor.next(), expected.get(5).cloned(), "{text}");
            assert_eq!(cursor.emitted(), 6, "{text}");
        }
    }

    #[test]
    fn skip_to_stops_at_count() {
        let mut cursor = rule("FREQ=HOURLY;COUNT=10")
            .iterator(DateTime::utc(2021, 1, 1, 0, 0, 0))
            .unwrap();
        cursor.skip_to(9);
        assert_eq!(
            cursor.next(),
            Some(Instance::DateTime(DateTime::utc(2021, 1, 1, 9, 0, 0)))
        );
        cursor.skip_to(100);
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn sparse_daily_and_weekly_rules_reach_distant_instances() {
        let options = IterOptions::default().with_max_empty_steps(500);
        for text in [
            "FREQ=DAILY;BYMONTH=2;BYMONTHDAY=29;BYDAY=MO",
            "FREQ=WEEKLY;BYMONTH=2;BYMONTHDAY=29;BYDAY=MO",
        ] {
            let instances: Vec<Instance> = rule(text)
                .iterator_with(Date::new(2016, 3, 1), options)
                .unwrap()
                .take(2)
                .collect();
            assert_eq!(
                instances,
                [
                    Instance::Date(Date::new(2044, 2, 29)),
                    Instance::Date(Date::new(2072, 2, 29)),
                ],
                "{text}"
            );
        }
    }

    #[test]
    fn leap_second_selectors_never_produce_instances() {
        let instances: Vec<String> = rule("FREQ=DAILY;BYSECOND=0,60;COUNT=2")
            .iterator(DateTime::floating(2000, 1, 1, 0, 0, 0))
            .unwrap()
            .map(|instance| instance.to_string())
            .collect();
        assert_eq!(instances, ["20000101T000000", "20000102T000000"]);
    }

    #[test]
    fn skip_to_stops_at_until() {
        let mut cursor = rule("FREQ=DAILY;UNTIL=20200105")
            .iterator(Date::new(2020, 1, 1))
            .unwrap();
        cursor.skip_to(3);
        assert_eq!(cursor.next(), Some(Instance::Date(Date::new(2020, 1, 4))));

        cursor.skip_to(100);
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.emitted(), 5);
    }

    #[test]
    fn fast_forward_past_until_ends_the_sequence() {
        let mut cursor = rule("FREQ=WEEKLY;UNTIL=20200201")
            .iterator(Date::new(2020, 1, 1))
            .unwrap();
        cursor.fast_forward(&Instance::Date(Date::new(2021, 1, 1)));
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.emitted(), 5);
    }

    #[test]
    fn fast_forward_skips_earlier_instances() {
        let mut cursor = rule("FREQ=DAILY;INTERVAL=3")
            .iterator(DateTime::floating(2021, 1, 1, 9, 0, 0))
            .unwrap();
        cursor.fast_forward(&Instance::DateTime(DateTime::floating(2021, 3, 1, 0, 0, 0)));
        // 2021-03-01 is day 59 after January 1, the next multiple of 3 is 60.
        assert_eq!(
            cursor.next(),
            Some(Instance::DateTime(DateTime::floating(2021, 3, 2, 9, 0, 0)))
        );

        let mut cursor = rule("FREQ=MONTHLY;BYMONTHDAY=15,-1")
            .iterator(Date::new(2021, 1, 1))
            .unwrap();
        cursor.fast_forward(&Instance::Date(Date::new(2021, 2, 16)));
        assert_eq!(cursor.next(), Some(Instance::Date(Date::new(2021, 2, 28))));
    }

    #[test_log::test]
    fn empty_step_limit_ends_impossible_rules() {
        let options = IterOptions::default().with_max_empty_steps(50);
        let mut cursor = rule("FREQ=MONTHLY;BYMONTHDAY=31;BYMONTH=2")
            .iterator_with(Date::new(2021, 1, 1), options)
            .unwrap();
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn strict_modes_check_the_first_instance() {
        let rule = RecurrenceRule::parse("FREQ=DAILY;BYHOUR=12;UNTIL=20230305", ComplianceMode::Rfc2445Strict)
            .unwrap();
        let err = rule
            .iterator(DateTime::floating(2023, 3, 1, 0, 0, 0))
            .unwrap_err();
        assert!(matches!(err, RfcError::InvalidRule(ref e) if e.part == "UNTIL"));
    }

    #[test]
    fn ends_at_year_9999() {
        let cursor = rule("FREQ=YEARLY;INTERVAL=1000")
            .iterator(Date::new(2000, 6, 1))
            .unwrap();
        assert_eq!(cursor.count(), 8);
    }
}
