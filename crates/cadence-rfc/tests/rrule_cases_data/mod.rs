use cadence_rfc::rfc::ical::parse::parse_instance;
use cadence_rfc::{ComplianceMode, Instance, RecurrenceRule};
use rrule::RRuleSet;

pub struct RRuleCase {
    pub name: &'static str,
    pub rule: &'static str,
    pub start: &'static str,
    pub tzid: Option<&'static str>,
    pub expected: Option<&'static [&'static str]>,
    pub expected_len: Option<usize>,
    pub limit: usize,
    pub after: Option<&'static str>,
    /// Also compared against the `rrule` crate.
    pub oracle: bool,
}

#[expect(clippy::too_many_lines)]
pub fn rrule_cases() -> Vec<RRuleCase> {
    vec![
        RRuleCase {
            name: "daily_basic",
            rule: "FREQ=DAILY;COUNT=3",
            start: "20120201T093000Z",
            tzid: None,
            expected: Some(&["20120201T093000Z", "20120202T093000Z", "20120203T093000Z"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "weekly_basic",
            rule: "FREQ=WEEKLY;COUNT=3;BYDAY=TU,TH",
            start: "19970902T090000Z",
            tzid: None,
            expected: Some(&["19970902T090000Z", "19970904T090000Z", "19970909T090000Z"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "monthly_basic",
            rule: "FREQ=MONTHLY;COUNT=3;BYMONTHDAY=1",
            start: "20120101T090000Z",
            tzid: None,
            expected: Some(&["20120101T090000Z", "20120201T090000Z", "20120301T090000Z"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "yearly_basic",
            rule: "FREQ=YEARLY;COUNT=3",
            start: "20120101T090000Z",
            tzid: None,
            expected: Some(&["20120101T090000Z", "20130101T090000Z", "20140101T090000Z"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "hourly_basic",
            rule: "FREQ=HOURLY;COUNT=3",
            start: "20120101T090000Z",
            tzid: None,
            expected: Some(&["20120101T090000Z", "20120101T100000Z", "20120101T110000Z"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "minutely_basic",
            rule: "FREQ=MINUTELY;COUNT=3",
            start: "20120101T090000Z",
            tzid: None,
            expected: Some(&["20120101T090000Z", "20120101T090100Z", "20120101T090200Z"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "secondly_basic",
            rule: "FREQ=SECONDLY;COUNT=3",
            start: "20120101T090000Z",
            tzid: None,
            expected: Some(&["20120101T090000Z", "20120101T090001Z", "20120101T090002Z"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "fast_forward_counts_skipped",
            rule: "FREQ=DAILY;COUNT=3",
            start: "20120201T093000Z",
            tzid: None,
            expected: Some(&["20120202T093000Z", "20120203T093000Z"]),
            expected_len: None,
            limit: 100,
            after: Some("20120201T100000Z"),
            oracle: false,
        },
        RRuleCase {
            name: "dst_new_york",
            rule: "FREQ=DAILY;COUNT=3",
            start: "20210313T090000",
            tzid: Some("America/New_York"),
            expected: Some(&["20210313T090000", "20210314T090000", "20210315T090000"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "regression_issue_61",
            rule: "FREQ=DAILY",
            start: "18930401T010000",
            tzid: Some("Europe/Berlin"),
            expected: None,
            expected_len: Some(10),
            limit: 10,
            after: None,
            oracle: false,
        },
        RRuleCase {
            name: "rfc_every_day_in_jan",
            rule: "FREQ=YEARLY;UNTIL=20000131T140000Z;BYMONTH=1;BYDAY=SU,MO,TU,WE,TH,FR,SA",
            start: "19980101T090000",
            tzid: Some("America/New_York"),
            expected: None,
            expected_len: Some(93),
            limit: 200,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "rfc_monday_of_week_20",
            rule: "FREQ=YEARLY;BYWEEKNO=20;BYDAY=MO;COUNT=3",
            start: "19970512T090000",
            tzid: Some("America/New_York"),
            expected: Some(&["19970512T090000", "19980511T090000", "19990517T090000"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "rfc_friday_13th",
            rule: "FREQ=MONTHLY;BYDAY=FR;BYMONTHDAY=13;COUNT=5",
            start: "19970902T090000",
            tzid: Some("America/New_York"),
            expected: Some(&[
                "19980213T090000",
                "19980313T090000",
                "19981113T090000",
                "19990813T090000",
                "20001013T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "rfc_third_tue_wed_thu",
            rule: "FREQ=MONTHLY;BYDAY=TU,WE,TH;BYSETPOS=3;COUNT=3",
            start: "19970904T090000",
            tzid: Some("America/New_York"),
            expected: Some(&["19970904T090000", "19971007T090000", "19971106T090000"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "rfc_second_to_last_weekday",
            rule: "FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-2;COUNT=4",
            start: "19970929T090000",
            tzid: Some("America/New_York"),
            expected: Some(&[
                "19970929T090000",
                "19971030T090000",
                "19971127T090000",
                "19971230T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "rfc_us_election_day",
            rule: "FREQ=YEARLY;INTERVAL=4;BYMONTH=11;BYDAY=TU;BYMONTHDAY=2,3,4,5,6,7,8;COUNT=3",
            start: "19961105T090000",
            tzid: Some("America/New_York"),
            expected: Some(&["19961105T090000", "20001107T090000", "20041102T090000"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "rfc_third_to_last_day",
            rule: "FREQ=MONTHLY;BYMONTHDAY=-3;COUNT=6",
            start: "19970928T090000",
            tzid: Some("America/New_York"),
            expected: Some(&[
                "19970928T090000",
                "19971029T090000",
                "19971128T090000",
                "19971229T090000",
                "19980129T090000",
                "19980226T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "rfc_year_days_every_third_year",
            rule: "FREQ=YEARLY;BYYEARDAY=1,100,200;INTERVAL=3;COUNT=10",
            start: "19970101T090000",
            tzid: Some("America/New_York"),
            expected: Some(&[
                "19970101T090000",
                "19970410T090000",
                "19970719T090000",
                "20000101T090000",
                "20000409T090000",
                "20000718T090000",
                "20030101T090000",
                "20030410T090000",
                "20030719T090000",
                "20060101T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "rfc_twentieth_monday",
            rule: "FREQ=YEARLY;BYDAY=20MO;COUNT=3",
            start: "19970519T090000",
            tzid: Some("America/New_York"),
            expected: Some(&["19970519T090000", "19980518T090000", "19990517T090000"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "rfc_week_start_sunday",
            rule: "FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=SU",
            start: "19970805T090000",
            tzid: Some("America/New_York"),
            expected: Some(&[
                "19970805T090000",
                "19970817T090000",
                "19970819T090000",
                "19970831T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "rfc_week_start_monday",
            rule: "FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=MO",
            start: "19970805T090000",
            tzid: Some("America/New_York"),
            expected: Some(&[
                "19970805T090000",
                "19970810T090000",
                "19970819T090000",
                "19970824T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "rfc_every_20_minutes_office_hours",
            rule: "FREQ=MINUTELY;INTERVAL=20;BYHOUR=9,10,11,12,13,14,15,16;COUNT=5",
            start: "19970902T090000",
            tzid: Some("America/New_York"),
            expected: Some(&[
                "19970902T090000",
                "19970902T092000",
                "19970902T094000",
                "19970902T100000",
                "19970902T102000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "hourly_on_saturday_mornings",
            rule: "FREQ=HOURLY;BYDAY=SA;BYHOUR=10,11;COUNT=3",
            start: "20210101T000000Z",
            tzid: None,
            expected: Some(&["20210102T100000Z", "20210102T110000Z", "20210109T100000Z"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "skip_backward_on_short_months",
            rule: "FREQ=MONTHLY;RSCALE=GREGORIAN;SKIP=BACKWARD;COUNT=4",
            start: "20150131",
            tzid: None,
            expected: Some(&["20150131", "20150228", "20150331", "20150430"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: false,
        },
        RRuleCase {
            name: "skip_forward_on_short_months",
            rule: "FREQ=MONTHLY;RSCALE=GREGORIAN;SKIP=FORWARD;COUNT=4",
            start: "20150131",
            tzid: None,
            expected: Some(&["20150131", "20150301", "20150331", "20150501"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: false,
        },
        RRuleCase {
            name: "omit_on_short_months",
            rule: "FREQ=MONTHLY;COUNT=4",
            start: "20150131",
            tzid: None,
            expected: Some(&["20150131", "20150331", "20150531", "20150731"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: false,
        },
        RRuleCase {
            name: "leap_day_skip_backward",
            rule: "FREQ=YEARLY;RSCALE=GREGORIAN;SKIP=BACKWARD;COUNT=3",
            start: "20160229",
            tzid: None,
            expected: Some(&["20160229", "20170228", "20180228"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: false,
        },
        RRuleCase {
            name: "leap_day_omit",
            rule: "FREQ=YEARLY;COUNT=3",
            start: "20160229",
            tzid: None,
            expected: Some(&["20160229", "20200229", "20240229"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: false,
        },
        RRuleCase {
            name: "zoned_start_with_utc_until",
            rule: "FREQ=DAILY;UNTIL=20230103T080000Z",
            start: "20230101T090000",
            tzid: Some("Europe/Berlin"),
            expected: Some(&["20230101T090000", "20230102T090000", "20230103T090000"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: true,
        },
        RRuleCase {
            name: "all_day_start_drops_time_parts",
            rule: "FREQ=DAILY;BYHOUR=9;COUNT=2",
            start: "20200101",
            tzid: None,
            expected: Some(&["20200101", "20200102"]),
            expected_len: None,
            limit: 100,
            after: None,
            oracle: false,
        },
    ]
}

fn expand(case: &RRuleCase) -> Vec<String> {
    let rule = RecurrenceRule::parse(case.rule, ComplianceMode::Rfc5545Lax)
        .unwrap_or_else(|err| panic!("Failed to parse {}: {}", case.name, err));
    let first = parse_instance(case.start, case.tzid)
        .unwrap_or_else(|err| panic!("Failed to parse start of {}: {}", case.name, err));
    let mut cursor = rule
        .iterator(first)
        .unwrap_or_else(|err| panic!("Failed to create cursor for {}: {}", case.name, err));

    if let Some(after) = case.after {
        let after: Instance = after
            .parse()
            .unwrap_or_else(|err| panic!("Failed to parse {after}: {err}"));
        cursor.fast_forward(&after);
    }

    cursor
        .take(case.limit)
        .map(|instance| instance.to_string())
        .collect()
}

pub fn assert_case(case: &RRuleCase) {
    let actual = expand(case);

    if let Some(expected) = case.expected {
        assert_eq!(actual, expected, "Case {} did not match", case.name);
    }

    if let Some(expected_len) = case.expected_len {
        assert_eq!(
            actual.len(),
            expected_len,
            "Case {} expected {} occurrences",
            case.name,
            expected_len
        );
    }
}

/// Expands the case with the `rrule` crate, rendered as wall-clock text in
/// the start's own frame.
fn expand_with_oracle(case: &RRuleCase) -> Vec<String> {
    let dtstart = match case.tzid {
        Some(tzid) => format!("DTSTART;TZID={tzid}:{}", case.start),
        None => format!("DTSTART:{}", case.start),
    };
    let rrule_set: RRuleSet = format!("{dtstart}\nRRULE:{}", case.rule)
        .parse()
        .unwrap_or_else(|err| panic!("rrule failed to parse {}: {}", case.name, err));
    let limit = u16::try_from(case.limit).unwrap_or(u16::MAX);
    let suffix = if case.start.ends_with('Z') { "Z" } else { "" };

    rrule_set
        .all(limit)
        .dates
        .iter()
        .map(|date| format!("{}{suffix}", date.format("%Y%m%dT%H%M%S")))
        .collect()
}

pub fn assert_matches_oracle(case: &RRuleCase) {
    assert_eq!(
        expand(case),
        expand_with_oracle(case),
        "Case {} disagrees with the rrule crate",
        case.name
    );
}
