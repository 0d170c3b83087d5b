//! EASA ORO.FTL.235 rest-period compliance checker (component H)
//!
//! Checked independently of the fatigue simulation: these are regulatory
//! rest-period rules, not predictions of performance. A non-compliant rest
//! period is recorded as a finding, never surfaced as an `AnalysisError` —
//! see [`crate::error::AnalysisError`].

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::params::Parameters;
use crate::types::{Duty, RestComplianceFinding, RestPeriod, RestPeriodType};

/// EASA ORO.FTL.235's "local night" window, distinct from the WOCL used by
/// the fatigue model: 00:00-05:00 home-base local time.
const LOCAL_NIGHT_START_HOUR: u32 = 0;
const LOCAL_NIGHT_END_HOUR: u32 = 5;

/// An extended rest period must be at least this long to qualify as the
/// recurrent-rest requirement's satisfying rest.
const RECURRENT_REST_MIN_HOURS: f64 = 36.0;

/// The recurrent-rest requirement is checked over a rolling window this
/// wide.
pub const RECURRENT_REST_WINDOW_HOURS: i64 = 168;

fn minimum_rest_hours(previous_duty: &Duty, is_away_from_base: bool) -> f64 {
    let duty_hours = previous_duty.duty_hours();
    if is_away_from_base {
        duty_hours.max(10.0)
    } else {
        duty_hours.max(12.0)
    }
}

/// Number of home-base-local 00:00-05:00 windows entirely contained in
/// `[start, end]`.
fn count_local_nights_covered(start: DateTime<Utc>, end: DateTime<Utc>, home_tz: Tz) -> i32 {
    if end <= start {
        return 0;
    }
    let start_local = start.with_timezone(&home_tz);
    let end_local = end.with_timezone(&home_tz);

    let mut count = 0;
    let mut date = start_local.date_naive() - chrono::Duration::days(1);
    let last_date = end_local.date_naive() + chrono::Duration::days(1);
    while date <= last_date {
        let window_start_naive = date.and_time(NaiveTime::from_hms_opt(LOCAL_NIGHT_START_HOUR, 0, 0).unwrap());
        let window_end_naive = date.and_time(NaiveTime::from_hms_opt(LOCAL_NIGHT_END_HOUR, 0, 0).unwrap());
        let window_start = resolve_local(home_tz, window_start_naive);
        let window_end = resolve_local(home_tz, window_end_naive);
        if start <= window_start && end >= window_end {
            count += 1;
        }
        date += chrono::Duration::days(1);
    }
    count
}

fn resolve_local(tz: Tz, naive: chrono::NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        chrono::LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        chrono::LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

fn classify_rest_type(actual_hours: f64, local_nights_covered: i32, min_required: f64) -> RestPeriodType {
    if actual_hours + 1e-9 < min_required {
        RestPeriodType::Illegal
    } else if actual_hours >= RECURRENT_REST_MIN_HOURS && local_nights_covered >= 2 {
        RestPeriodType::Extended
    } else if actual_hours >= min_required * 1.5 {
        RestPeriodType::Adequate
    } else {
        RestPeriodType::Minimum
    }
}

/// Whether a rest period, on its own, satisfies the recurrent-rest
/// requirement (36h+ spanning two local nights). Roster-level rolling
/// tracking of *when* the requirement was last satisfied lives in
/// `roster.rs`.
pub fn satisfies_recurrent_rest(rest: &RestPeriod, home_tz: Tz) -> bool {
    rest.actual_rest_hours() >= RECURRENT_REST_MIN_HOURS
        && count_local_nights_covered(rest.start_utc, rest.end_utc, home_tz) >= 2
}

/// Check one rest period against the minimum-rest, local-night-coverage,
/// and away-from-base sleep-opportunity rules. Does not resolve the
/// recurrent-rest rolling window — call `satisfies_recurrent_rest` and
/// track overdue state at the roster level instead.
pub fn check_rest_period(
    rest: &RestPeriod,
    previous_duty: &Duty,
    home_tz: Tz,
    params: &Parameters,
) -> RestComplianceFinding {
    let actual = rest.actual_rest_hours();
    let min_required = minimum_rest_hours(previous_duty, rest.is_away_from_base);
    let mut violations = Vec::new();

    if actual + 1e-9 < min_required {
        violations.push("below_minimum_rest".to_string());
    }

    let local_nights_covered = count_local_nights_covered(rest.start_utc, rest.end_utc, home_tz);
    if !rest.is_away_from_base && local_nights_covered < 1 {
        violations.push("insufficient_local_night_coverage".to_string());
    }

    if rest.is_away_from_base {
        let sleep_opportunity_hours = params.baseline_sleep_need_hours + 3.0;
        if actual + 1e-9 < sleep_opportunity_hours {
            violations.push("insufficient_sleep_opportunity_away".to_string());
        }
    }

    let rest_type = classify_rest_type(actual, local_nights_covered, min_required);

    RestComplianceFinding {
        previous_duty_id: rest.previous_duty_id.clone(),
        next_duty_id: rest.next_duty_id.clone(),
        rest_type,
        is_compliant: violations.is_empty(),
        violations,
        local_nights_covered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlightSegment;
    use chrono::TimeZone as _;

    fn airport(code: &str, tz: &str) -> crate::types::Airport {
        crate::types::Airport {
            code: code.to_string(),
            timezone: tz.to_string(),
            lat: 0.0,
            lon: 0.0,
        }
    }

    fn sample_duty(report: DateTime<Utc>, release: DateTime<Utc>) -> Duty {
        let dep = airport("DOH", "Asia/Qatar");
        let arr = airport("LHR", "Europe/London");
        let seg = FlightSegment {
            flight_no: "QR001".to_string(),
            dep,
            arr,
            sched_dep_utc: report + chrono::Duration::hours(1),
            sched_arr_utc: release - chrono::Duration::hours(1),
            block_hours: 6.0,
        };
        Duty::new(
            "D1".to_string(),
            report.date_naive(),
            report,
            release,
            vec![seg],
            "Asia/Qatar".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn short_rest_is_illegal() {
        let home_tz: Tz = "Asia/Qatar".parse().unwrap();
        let params = Parameters::default();
        let duty_report = Utc.with_ymd_and_hms(2026, 3, 1, 4, 0, 0).unwrap();
        let duty_release = duty_report + chrono::Duration::hours(8);
        let duty = sample_duty(duty_report, duty_release);

        let rest = RestPeriod {
            previous_duty_id: "D1".to_string(),
            next_duty_id: "D2".to_string(),
            start_utc: duty_release,
            end_utc: duty_release + chrono::Duration::hours(6),
            is_away_from_base: false,
        };
        let finding = check_rest_period(&rest, &duty, home_tz, &params);
        assert_eq!(finding.rest_type, RestPeriodType::Illegal);
        assert!(!finding.is_compliant);
        assert!(finding.violations.contains(&"below_minimum_rest".to_string()));
    }

    #[test]
    fn long_rest_spanning_two_nights_is_extended() {
        let home_tz: Tz = "Asia/Qatar".parse().unwrap();
        let params = Parameters::default();
        let duty_report = Utc.with_ymd_and_hms(2026, 3, 1, 4, 0, 0).unwrap();
        let duty_release = duty_report + chrono::Duration::hours(8);
        let duty = sample_duty(duty_report, duty_release);

        let rest = RestPeriod {
            previous_duty_id: "D1".to_string(),
            next_duty_id: "D2".to_string(),
            start_utc: duty_release,
            end_utc: duty_release + chrono::Duration::hours(40),
            is_away_from_base: false,
        };
        let finding = check_rest_period(&rest, &duty, home_tz, &params);
        assert_eq!(finding.rest_type, RestPeriodType::Extended);
        assert!(finding.is_compliant);
        assert!(satisfies_recurrent_rest(&rest, home_tz));
    }

    #[test]
    fn away_from_base_short_rest_flags_insufficient_opportunity() {
        let home_tz: Tz = "Asia/Qatar".parse().unwrap();
        let params = Parameters::default();
        let duty_report = Utc.with_ymd_and_hms(2026, 3, 1, 4, 0, 0).unwrap();
        let duty_release = duty_report + chrono::Duration::hours(8);
        let duty = sample_duty(duty_report, duty_release);

        let rest = RestPeriod {
            previous_duty_id: "D1".to_string(),
            next_duty_id: "D2".to_string(),
            start_utc: duty_release,
            end_utc: duty_release + chrono::Duration::hours(10),
            is_away_from_base: true,
        };
        let finding = check_rest_period(&rest, &duty, home_tz, &params);
        assert!(finding
            .violations
            .contains(&"insufficient_sleep_opportunity_away".to_string()));
    }
}
