//! Build a small sample roster and run a full analysis against it.

use chrono::{Duration, TimeZone, Utc};

use wingwatch_core::airport::StaticAirportTable;
use wingwatch_core::cancel::CancellationToken;
use wingwatch_core::params::Parameters;
use wingwatch_core::roster::RosterSimulator;
use wingwatch_core::types::{Airport, Duty, FlightSegment, Roster};

fn airport(code: &str, tz: &str, lat: f64, lon: f64) -> Airport {
    Airport {
        code: code.to_string(),
        timezone: tz.to_string(),
        lat,
        lon,
    }
}

fn main() {
    let doh = airport("DOH", "Asia/Qatar", 25.27, 51.61);
    let lhr = airport("LHR", "Europe/London", 51.47, -0.45);

    let report1 = Utc.with_ymd_and_hms(2026, 3, 1, 3, 0, 0).unwrap();
    let seg1 = FlightSegment {
        flight_no: "QR001".to_string(),
        dep: doh.clone(),
        arr: lhr.clone(),
        sched_dep_utc: report1 + Duration::hours(1),
        sched_arr_utc: report1 + Duration::hours(8),
        block_hours: 7.0,
    };
    let duty1 = Duty::new(
        "D1".to_string(),
        report1.date_naive(),
        report1,
        report1 + Duration::hours(9),
        vec![seg1],
        "Asia/Qatar".to_string(),
    )
    .expect("duty1 is well-formed");

    let report2 = duty1.release_utc + Duration::hours(30);
    let seg2 = FlightSegment {
        flight_no: "QR002".to_string(),
        dep: lhr.clone(),
        arr: doh.clone(),
        sched_dep_utc: report2 + Duration::hours(1),
        sched_arr_utc: report2 + Duration::hours(8),
        block_hours: 7.0,
    };
    let duty2 = Duty::new(
        "D2".to_string(),
        report2.date_naive(),
        report2,
        report2 + Duration::hours(9),
        vec![seg2],
        "Asia/Qatar".to_string(),
    )
    .expect("duty2 is well-formed");

    let roster = Roster {
        roster_id: "DEMO-2026-03".to_string(),
        pilot_id: "P-DEMO".to_string(),
        month_year: 2026,
        month: 3,
        duties: vec![duty1, duty2],
        home_base_tz: "Asia/Qatar".to_string(),
        home_base_code: "DOH".to_string(),
    };

    let airports = StaticAirportTable::from_iter([doh, lhr]);
    let simulator = RosterSimulator::new(Parameters::default());
    let cancel = CancellationToken::new();

    match simulator.analyze(&roster, &airports, 10, &cancel) {
        Ok(analysis) => {
            println!("{}", serde_json::to_string_pretty(&analysis).unwrap());
        }
        Err(e) => eprintln!("analysis failed: {e}"),
    }
}
