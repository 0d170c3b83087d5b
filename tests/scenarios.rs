//! End-to-end scenarios against the public `analyze` entry point.
//!
//! Each scenario builds a small roster by hand and checks an
//! outcome-level property of the resulting `MonthlyAnalysis`, rather than
//! asserting on internal intermediate values — the kind of test that
//! should keep passing across refactors of the simulation internals.

use chrono::{Duration, TimeZone, Utc};

use wingwatch_core::airport::StaticAirportTable;
use wingwatch_core::cancel::CancellationToken;
use wingwatch_core::params::Parameters;
use wingwatch_core::roster::RosterSimulator;
use wingwatch_core::types::{Airport, Duty, FlightSegment, Roster};

fn airport(code: &str, tz: &str) -> Airport {
    Airport {
        code: code.to_string(),
        timezone: tz.to_string(),
        lat: 0.0,
        lon: 0.0,
    }
}

fn single_segment_duty(
    id: &str,
    report: chrono::DateTime<Utc>,
    block_hours: i64,
    turnaround_hours: i64,
    dep: Airport,
    arr: Airport,
) -> Duty {
    let seg = FlightSegment {
        flight_no: format!("WW{id}"),
        dep,
        arr,
        sched_dep_utc: report + Duration::hours(1),
        sched_arr_utc: report + Duration::hours(1 + block_hours),
        block_hours: block_hours as f64,
    };
    Duty::new(
        id.to_string(),
        report.date_naive(),
        report,
        report + Duration::hours(1 + block_hours + turnaround_hours),
        vec![seg],
        "Asia/Qatar".to_string(),
    )
    .expect("scenario duty is well-formed")
}

fn roster(duties: Vec<Duty>, home_code: &str, home_tz: &str) -> Roster {
    Roster {
        roster_id: "SCENARIO".to_string(),
        pilot_id: "P-SCENARIO".to_string(),
        month_year: 2026,
        month: 3,
        duties,
        home_base_tz: home_tz.to_string(),
        home_base_code: home_code.to_string(),
    }
}

fn airports() -> StaticAirportTable {
    StaticAirportTable::from_iter([
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
        airport("SYD", "Australia/Sydney"),
    ])
}

/// S1: a well-rested, daytime, short-haul duty produces a low-risk,
/// non-degraded performance timeline with no compliance violations.
#[test]
fn s1_normal_daytime_duty_is_low_risk() {
    let report = Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap(); // 09:00 local Qatar
    let duty = single_segment_duty(
        "D1",
        report,
        4,
        0,
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
    );
    let r = roster(vec![duty], "DOH", "Asia/Qatar");
    let sim = RosterSimulator::new(Parameters::default());
    let analysis = sim
        .analyze(&r, &airports(), 10, &CancellationToken::new())
        .unwrap();

    assert_eq!(analysis.duty_timelines.len(), 1);
    let dt = &analysis.duty_timelines[0];
    assert!(dt.min_performance > 50.0);
    assert!(analysis.extreme_count == 0);
}

/// S2: a report time in the middle of the night compresses the preceding
/// sleep opportunity and should leave a diagnostic trail and a lower
/// landing performance than the well-rested case.
#[test]
fn s2_night_departure_degrades_relative_to_normal_duty() {
    let normal_report = Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap();
    let night_report = Utc.with_ymd_and_hms(2026, 3, 2, 21, 0, 0).unwrap(); // 00:00 local Qatar

    let normal_duty = single_segment_duty(
        "D1",
        normal_report,
        4,
        0,
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
    );
    let night_duty = single_segment_duty(
        "D1",
        night_report,
        4,
        0,
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
    );

    let sim = RosterSimulator::new(Parameters::default());
    let normal_analysis = sim
        .analyze(
            &roster(vec![normal_duty], "DOH", "Asia/Qatar"),
            &airports(),
            10,
            &CancellationToken::new(),
        )
        .unwrap();
    let night_analysis = sim
        .analyze(
            &roster(vec![night_duty], "DOH", "Asia/Qatar"),
            &airports(),
            10,
            &CancellationToken::new(),
        )
        .unwrap();

    let normal_landing = normal_analysis.duty_timelines[0].landing_performance.unwrap();
    let night_landing = night_analysis.duty_timelines[0].landing_performance.unwrap();
    assert!(night_landing <= normal_landing);
}

/// S3: a report time inside the WOCL produces a duty whose release still
/// overlaps the circadian low, and the wocl encroachment metric reflects it.
#[test]
fn s3_wocl_anchored_report_shows_wocl_encroachment() {
    let report = Utc.with_ymd_and_hms(2026, 3, 2, 0, 30, 0).unwrap(); // 03:30 local Qatar, inside WOCL
    let duty = single_segment_duty(
        "D1",
        report,
        3,
        0,
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
    );
    let r = roster(vec![duty], "DOH", "Asia/Qatar");
    let sim = RosterSimulator::new(Parameters::default());
    let analysis = sim
        .analyze(&r, &airports(), 10, &CancellationToken::new())
        .unwrap();

    assert!(analysis.duty_timelines[0].wocl_encroachment_h > 0.0);
}

/// S4: a long layover (well beyond twice the baseline sleep need) is long
/// enough to trigger the Recovery sleep strategy and pay down debt rather
/// than accumulate it.
#[test]
fn s4_long_layover_reduces_sleep_debt_relative_to_short_layover() {
    let sim = RosterSimulator::new(Parameters::default());

    let report1 = Utc.with_ymd_and_hms(2026, 3, 1, 3, 0, 0).unwrap();
    let short_duty1 = single_segment_duty(
        "D1",
        report1,
        7,
        2,
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
    );
    let short_report2 = short_duty1.release_utc + Duration::hours(14);
    let short_duty2 = single_segment_duty(
        "D2",
        short_report2,
        7,
        2,
        airport("LHR", "Europe/London"),
        airport("DOH", "Asia/Qatar"),
    );
    let short_layover = sim
        .analyze(
            &roster(vec![short_duty1, short_duty2], "DOH", "Asia/Qatar"),
            &airports(),
            10,
            &CancellationToken::new(),
        )
        .unwrap();

    let long_duty1 = single_segment_duty(
        "D1",
        report1,
        7,
        2,
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
    );
    let long_report2 = long_duty1.release_utc + Duration::hours(40);
    let long_duty2 = single_segment_duty(
        "D2",
        long_report2,
        7,
        2,
        airport("LHR", "Europe/London"),
        airport("DOH", "Asia/Qatar"),
    );
    let long_layover = sim
        .analyze(
            &roster(vec![long_duty1, long_duty2], "DOH", "Asia/Qatar"),
            &airports(),
            10,
            &CancellationToken::new(),
        )
        .unwrap();

    let short_debt = short_layover.duty_timelines[1].cumulative_sleep_debt_at_release;
    let long_debt = long_layover.duty_timelines[1].cumulative_sleep_debt_at_release;
    assert!(long_debt <= short_debt);
}

/// S5: a rest period shorter than the regulatory minimum is flagged
/// non-compliant with an explicit violation string.
#[test]
fn s5_short_turnaround_is_flagged_non_compliant() {
    let report1 = Utc.with_ymd_and_hms(2026, 3, 1, 3, 0, 0).unwrap();
    let duty1 = single_segment_duty(
        "D1",
        report1,
        8,
        0,
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
    );
    let report2 = duty1.release_utc + Duration::hours(6); // far short of 12h/10h minimum
    let duty2 = single_segment_duty(
        "D2",
        report2,
        8,
        0,
        airport("LHR", "Europe/London"),
        airport("DOH", "Asia/Qatar"),
    );
    let r = roster(vec![duty1, duty2], "DOH", "Asia/Qatar");
    let sim = RosterSimulator::new(Parameters::default());
    let analysis = sim
        .analyze(&r, &airports(), 10, &CancellationToken::new())
        .unwrap();

    let finding = &analysis.rest_compliance_findings[0];
    assert!(!finding.is_compliant);
    assert!(finding.violations.contains(&"below_minimum_rest".to_string()));
}

/// S6: a roster with one qualifying extended rest (36h+, spanning two
/// local nights) early on satisfies the recurrent-rest requirement for the
/// rest of the month, so no later rest period is flagged overdue.
#[test]
fn s6_qualifying_extended_rest_satisfies_recurrent_requirement() {
    let report1 = Utc.with_ymd_and_hms(2026, 3, 1, 3, 0, 0).unwrap();
    let duty1 = single_segment_duty(
        "D1",
        report1,
        6,
        0,
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
    );
    // 40h extended rest spanning two home-base local nights.
    let report2 = duty1.release_utc + Duration::hours(40);
    let duty2 = single_segment_duty(
        "D2",
        report2,
        6,
        0,
        airport("LHR", "Europe/London"),
        airport("DOH", "Asia/Qatar"),
    );
    // Short rest a couple of days later, still within the 168h window.
    let report3 = duty2.release_utc + Duration::hours(14);
    let duty3 = single_segment_duty(
        "D3",
        report3,
        6,
        0,
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
    );

    let r = roster(vec![duty1, duty2, duty3], "DOH", "Asia/Qatar");
    let sim = RosterSimulator::new(Parameters::default());
    let analysis = sim
        .analyze(&r, &airports(), 10, &CancellationToken::new())
        .unwrap();

    assert_eq!(analysis.rest_compliance_findings.len(), 2);
    for finding in &analysis.rest_compliance_findings {
        assert!(!finding
            .violations
            .contains(&"recurrent_rest_overdue".to_string()));
    }
}

/// Running the same roster through `analyze` twice, with no parallel
/// reduction and no nondeterministic ordering anywhere in the loop,
/// produces byte-for-byte identical results.
#[test]
fn analysis_is_deterministic_across_repeated_runs() {
    let report1 = Utc.with_ymd_and_hms(2026, 3, 1, 3, 0, 0).unwrap();
    let duty1 = single_segment_duty(
        "D1",
        report1,
        6,
        0,
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
    );
    let report2 = duty1.release_utc + Duration::hours(18);
    let duty2 = single_segment_duty(
        "D2",
        report2,
        6,
        0,
        airport("LHR", "Europe/London"),
        airport("DOH", "Asia/Qatar"),
    );
    let r = roster(vec![duty1, duty2], "DOH", "Asia/Qatar");
    let sim = RosterSimulator::new(Parameters::default());

    let first = sim
        .analyze(&r, &airports(), 10, &CancellationToken::new())
        .unwrap();
    let second = sim
        .analyze(&r, &airports(), 10, &CancellationToken::new())
        .unwrap();

    assert_eq!(first, second);
}
