//! Core data model for the WingWatch fatigue core
//!
//! These types flow through every stage of the pipeline: roster ingestion
//! (external, out of scope) hands the core an already-normalized `Roster`;
//! the core emits a `MonthlyAnalysis`.

use crate::error::AnalysisError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// IATA airport reference data. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub code: String,
    /// IANA timezone name, e.g. "Asia/Qatar"
    pub timezone: String,
    pub lat: f64,
    pub lon: f64,
}

/// One flight segment within a duty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSegment {
    pub flight_no: String,
    pub dep: Airport,
    pub arr: Airport,
    pub sched_dep_utc: DateTime<Utc>,
    pub sched_arr_utc: DateTime<Utc>,
    pub block_hours: f64,
}

impl FlightSegment {
    /// Validate that this segment's own interval is well-formed.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.sched_arr_utc <= self.sched_dep_utc {
            return Err(AnalysisError::RosterValidation(format!(
                "segment {} has arr <= dep",
                self.flight_no
            )));
        }
        Ok(())
    }
}

/// A single duty period: report to release, spanning one or more segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duty {
    pub duty_id: String,
    pub date: NaiveDate,
    pub report_utc: DateTime<Utc>,
    pub release_utc: DateTime<Utc>,
    pub segments: Vec<FlightSegment>,
    pub home_base_tz: String,
}

impl Duty {
    /// Construct a duty, enforcing its structural invariants.
    ///
    /// If the source data has `report_utc` after the first segment's
    /// scheduled departure, `report_utc` is shifted back one day rather
    /// than rejected — this matches overnight duties reported against the
    /// wrong calendar date by upstream schedule exports.
    pub fn new(
        duty_id: String,
        date: NaiveDate,
        mut report_utc: DateTime<Utc>,
        release_utc: DateTime<Utc>,
        segments: Vec<FlightSegment>,
        home_base_tz: String,
    ) -> Result<Self, AnalysisError> {
        if segments.is_empty() {
            return Err(AnalysisError::RosterValidation(format!(
                "duty {duty_id} has no segments"
            )));
        }
        for seg in &segments {
            seg.validate()?;
        }
        for pair in segments.windows(2) {
            if pair[0].arr != pair[1].dep.clone() && pair[0].sched_arr_utc > pair[1].sched_dep_utc {
                return Err(AnalysisError::RosterValidation(format!(
                    "duty {duty_id} has overlapping segments"
                )));
            }
        }

        if report_utc > segments[0].sched_dep_utc {
            report_utc -= chrono::Duration::days(1);
        }

        if report_utc >= release_utc {
            return Err(AnalysisError::RosterValidation(format!(
                "duty {duty_id} has report_utc >= release_utc"
            )));
        }

        let last_arr = segments.last().unwrap().sched_arr_utc;
        if release_utc < last_arr {
            return Err(AnalysisError::RosterValidation(format!(
                "duty {duty_id} releases before last segment arrival"
            )));
        }

        Ok(Self {
            duty_id,
            date,
            report_utc,
            release_utc,
            segments,
            home_base_tz,
        })
    }

    /// Flight Duty Period: report to last landing + 30 minutes.
    pub fn fdp_hours(&self) -> f64 {
        let last_arr = self.segments.last().expect("validated non-empty").sched_arr_utc;
        let fdp_end = last_arr + chrono::Duration::minutes(30);
        (fdp_end - self.report_utc).num_seconds() as f64 / 3600.0
    }

    /// Total duty hours: report to release.
    pub fn duty_hours(&self) -> f64 {
        (self.release_utc - self.report_utc).num_seconds() as f64 / 3600.0
    }

    pub fn first_departure(&self) -> &Airport {
        &self.segments.first().expect("validated non-empty").dep
    }

    pub fn last_arrival(&self) -> &Airport {
        &self.segments.last().expect("validated non-empty").arr
    }
}

/// A normalized monthly roster for one pilot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub roster_id: String,
    pub pilot_id: String,
    pub month_year: i32,
    pub month: u32,
    pub duties: Vec<Duty>,
    pub home_base_tz: String,
    pub home_base_code: String,
}

impl Roster {
    /// Validate ordering and non-overlap across the whole roster.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.duties.is_empty() {
            return Err(AnalysisError::RosterValidation(format!(
                "roster {} has no duties",
                self.roster_id
            )));
        }
        for pair in self.duties.windows(2) {
            if pair[0].report_utc > pair[1].report_utc {
                return Err(AnalysisError::RosterValidation(format!(
                    "roster {} duties not ordered by report_utc",
                    self.roster_id
                )));
            }
            if pair[0].release_utc > pair[1].report_utc {
                return Err(AnalysisError::RosterValidation(format!(
                    "duties {} and {} overlap",
                    pair[0].duty_id, pair[1].duty_id
                )));
            }
        }
        Ok(())
    }
}

/// Sleep location environment, affecting the base sleep-quality factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Home,
    Hotel,
    AirportHotel,
    CrewRest,
    CrewHouse,
    Inflight,
}

/// Classification of a sleep block by how it was generated / used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepType {
    Main,
    Nap,
    Anchor,
    Inflight,
    Recovery,
}

/// A synthesized sleep interval. Immutable once emitted by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepBlock {
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub location_tz: String,
    pub environment: Environment,
    pub sleep_type: SleepType,
    pub confidence: f64,
    pub effective_hours: f64,
}

impl SleepBlock {
    pub fn duration_hours(&self) -> f64 {
        (self.end_utc - self.start_utc).num_seconds() as f64 / 3600.0
    }
}

/// Flight phase at a given instant within a duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightPhase {
    Preflight,
    TaxiOut,
    Takeoff,
    Climb,
    Cruise,
    Descent,
    Approach,
    Landing,
    TaxiIn,
}

/// One minute-or-stride-resolution sample of the fatigue timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub t_utc: DateTime<Utc>,
    pub t_local: NaiveTime,
    pub t_local_date: NaiveDate,
    pub s: f64,
    pub c: f64,
    pub w: f64,
    pub performance: f64,
    pub cumulative_sleep_debt_h: f64,
    pub flight_phase: FlightPhase,
    pub is_wocl: bool,
    pub is_critical: bool,
}

/// A coincident high-pressure / circadian-trough event during a
/// safety-critical flight phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinchEvent {
    pub t_utc: DateTime<Utc>,
    pub phase: FlightPhase,
    pub s: f64,
    pub c: f64,
}

/// Risk classification bucket, derived from `landing_performance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
    Extreme,
}

/// Per-duty performance timeline and summary metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyTimeline {
    pub duty_id: String,
    pub timeline: Vec<PerformancePoint>,
    pub min_performance: f64,
    pub avg_performance: f64,
    pub landing_performance: Option<f64>,
    pub pinch_events: Vec<PinchEvent>,
    pub wocl_encroachment_h: f64,
    pub cumulative_sleep_debt_at_release: f64,
    pub sleep_blocks_generated_before: usize,
}

impl DutyTimeline {
    pub fn risk_level(&self, params: &crate::params::Parameters) -> Option<RiskLevel> {
        self.landing_performance.map(|p| params.risk_level(p))
    }
}

/// A non-fatal note about sleep-block generation (truncation or drop).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepDiagnostic {
    pub duty_id: String,
    pub message: String,
    pub confidence: f64,
}

/// The gap between one duty's release and the next duty's report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestPeriod {
    pub previous_duty_id: String,
    pub next_duty_id: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub is_away_from_base: bool,
}

impl RestPeriod {
    pub fn actual_rest_hours(&self) -> f64 {
        (self.end_utc - self.start_utc).num_seconds() as f64 / 3600.0
    }
}

/// EASA ORO.FTL.235 rest-period classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestPeriodType {
    Illegal,
    Minimum,
    Adequate,
    Recurrent,
    Extended,
}

/// Outcome of the EASA compliance check for one rest period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestComplianceFinding {
    pub previous_duty_id: String,
    pub next_duty_id: String,
    pub rest_type: RestPeriodType,
    pub is_compliant: bool,
    pub violations: Vec<String>,
    pub local_nights_covered: i32,
}

/// Full monthly analysis output: the sole result of `analyze(...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAnalysis {
    pub roster_id: String,
    pub pilot_id: String,
    pub duty_timelines: Vec<DutyTimeline>,
    pub rest_periods: Vec<RestPeriod>,
    pub rest_compliance_findings: Vec<RestComplianceFinding>,
    pub diagnostics: Vec<SleepDiagnostic>,
    pub avg_sleep_per_night_h: f64,
    pub max_sleep_debt_h: f64,
    pub low_count: u32,
    pub moderate_count: u32,
    pub high_count: u32,
    pub critical_count: u32,
    pub extreme_count: u32,
    pub worst_duty_id: Option<String>,
    pub total_pinch_events: usize,
}
