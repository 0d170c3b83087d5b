//! Time & WOCL utilities (component B)
//!
//! UTC <-> local conversion and Window-of-Circadian-Low arithmetic. All
//! local-time projection goes through `chrono-tz`'s IANA tz database so DST
//! transitions are handled by the library rather than hand-rolled offset
//! math.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::AnalysisError;
use crate::params::Parameters;

/// Parse an IANA timezone name, surfacing an unresolved zone as a
/// structured error rather than panicking.
pub fn parse_tz(tz_name: &str) -> Result<Tz, AnalysisError> {
    tz_name
        .parse::<Tz>()
        .map_err(|_| AnalysisError::UnknownAirport(tz_name.to_string()))
}

/// Convert a UTC instant to its local calendar date and time-of-day.
pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> (NaiveDate, NaiveTime) {
    let local = instant.with_timezone(&tz);
    (local.date_naive(), local.time())
}

/// Resolve a local naive date + time in `tz` back to a UTC instant.
///
/// Ambiguous or non-existent local times (DST transitions) resolve to the
/// earliest valid mapping rather than erroring — WOCL windows must never be
/// silently dropped because a transition fell inside one.
pub fn local_to_utc(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        chrono::LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        chrono::LocalResult::None => {
            // Spring-forward gap: nudge forward an hour and retry once.
            let bumped = naive + chrono::Duration::hours(1);
            match tz.from_local_datetime(&bumped) {
                chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
                chrono::LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
                chrono::LocalResult::None => {
                    // Should not happen twice in a row; fall back to naive-as-UTC.
                    Utc.from_utc_datetime(&naive)
                }
            }
        }
    }
}

/// Resolve a fractional local hour (e.g. `23.5` for 23:30) on `date` in
/// `tz` back to a UTC instant. Used by the sleep-strategy dispatcher to
/// anchor fixed local bedtimes (`23:00-07:00`, "ending 1.5h before
/// report", etc).
pub fn local_hour_to_utc(tz: Tz, date: NaiveDate, hour: f64) -> DateTime<Utc> {
    let hour = hour.rem_euclid(24.0);
    let whole_hour = hour.floor() as u32;
    let minute = ((hour - whole_hour as f64) * 60.0).round() as u32;
    let time = NaiveTime::from_hms_opt(whole_hour.min(23), minute.min(59), 0).unwrap();
    local_to_utc(tz, date, time)
}

/// The WOCL window (`params.wocl_start_hour` inclusive .. `wocl_end_hour`
/// exclusive) for a given local calendar date, expressed as UTC instants.
fn wocl_window_utc(tz: Tz, date: NaiveDate, params: &Parameters) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_time = NaiveTime::from_hms_opt(params.wocl_start_hour as u32, 0, 0).unwrap();
    let end_time = NaiveTime::from_hms_opt(params.wocl_end_hour as u32, 0, 0).unwrap();
    let start = local_to_utc(tz, date, start_time);
    let end = local_to_utc(tz, date, end_time);
    (start, end)
}

/// Overlap between two UTC intervals, in hours (0 if disjoint or inverted).
pub fn interval_overlap_hours(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> f64 {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    if end <= start {
        0.0
    } else {
        (end - start).num_seconds() as f64 / 3600.0
    }
}

/// Sum of hours of `[start, end]` (UTC) falling within the home-base-local
/// WOCL window, across every calendar day the interval touches.
pub fn wocl_overlap_hours(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    home_tz: Tz,
    params: &Parameters,
) -> f64 {
    if end <= start {
        return 0.0;
    }
    let (start_date, _) = to_local(start, home_tz);
    let (end_date, _) = to_local(end, home_tz);

    let mut total = 0.0;
    let mut date = start_date - chrono::Duration::days(1);
    let last = end_date + chrono::Duration::days(1);
    while date <= last {
        let (wocl_start, wocl_end) = wocl_window_utc(home_tz, date, params);
        total += interval_overlap_hours(start, end, wocl_start, wocl_end);
        date += chrono::Duration::days(1);
    }
    total
}

/// Whether a duty's report-to-release interval touches the home-base WOCL.
pub fn duty_crosses_wocl(
    report_utc: DateTime<Utc>,
    release_utc: DateTime<Utc>,
    home_tz: Tz,
    params: &Parameters,
) -> bool {
    wocl_overlap_hours(report_utc, release_utc, home_tz, params) > 0.0
}
