//! Roster simulator (component G)
//!
//! The sole public entry point for a full monthly analysis. Threads sleep
//! history, cumulative sleep debt, and Process-S state across the whole
//! roster; everything upstream (per-duty simulation, sleep-block
//! generation, quality scoring, compliance checking) is a pure function
//! this orchestrator calls in sequence.

use chrono::{DateTime, Duration, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::airport::AirportLookup;
use crate::cancel::CancellationToken;
use crate::compliance::{check_rest_period, satisfies_recurrent_rest, RECURRENT_REST_WINDOW_HOURS};
use crate::duty::{simulate_duty, DutySimContext};
use crate::error::AnalysisError;
use crate::params::Parameters;
use crate::process::{process_s_during_sleep, WakeAnchor};
use crate::quality::{SleepQualityCalculator, SleepQualityContext};
use crate::sleep::{select_strategy, SleepContext};
use crate::time_utils::{duty_crosses_wocl, parse_tz};
use crate::types::{
    Environment, MonthlyAnalysis, Roster, SleepBlock, SleepType,
};

/// Orchestrates a full roster analysis. Stateless beyond the parameter
/// bundle it was built with — all per-roster state lives on the stack of
/// `analyze`.
pub struct RosterSimulator {
    params: Parameters,
}

/// The circadian-adaptation target (§4.7d): the hour offset between
/// `location_tz` and `home_tz` at `at`, expressed in home-local-projected
/// hours. `phase_shift_hours` chases this target day by day; zero target
/// means "fully re-entrained to home", which is what pulls phase_shift
/// back down during a layover at home base.
fn phase_shift_target_hours(location_tz: Tz, home_tz: Tz, at: DateTime<Utc>) -> f64 {
    let naive = at.naive_utc();
    let location_offset = location_tz.offset_from_utc_datetime(&naive).fix().local_minus_utc() as f64;
    let home_offset = home_tz.offset_from_utc_datetime(&naive).fix().local_minus_utc() as f64;
    (location_offset - home_offset) / 3600.0
}

/// Advance `phase_shift_hours` toward `target_hours` by at most one day's
/// adaptation rate (§4.1: 1.5 h/day westward, 1.0 h/day eastward), never
/// overshooting. Full adaptation is declared once within 0.5 h of target.
fn step_phase_shift(current: f64, target: f64, elapsed_days: f64, params: &Parameters) -> f64 {
    let diff = target - current;
    if diff.abs() < 0.5 {
        return target;
    }
    let rate = if diff > 0.0 {
        params.eastward_adaptation_h_per_day
    } else {
        params.westward_adaptation_h_per_day
    };
    let max_step = rate * elapsed_days.max(0.0);
    if diff.abs() <= max_step {
        target
    } else {
        current + diff.signum() * max_step
    }
}

impl RosterSimulator {
    pub fn new(params: Parameters) -> Self {
        Self { params }
    }

    /// Run the full monthly analysis.
    pub fn analyze(
        &self,
        roster: &Roster,
        airports: &dyn AirportLookup,
        stride_minutes: i64,
        cancel: &CancellationToken,
    ) -> Result<MonthlyAnalysis, AnalysisError> {
        roster.validate()?;
        let home_tz = parse_tz(&roster.home_base_tz)?;

        let mut duty_timelines = Vec::new();
        let mut rest_periods = Vec::new();
        let mut rest_compliance_findings = Vec::new();
        let mut diagnostics = Vec::new();
        let mut sleep_blocks_generated = 0usize;
        let mut cumulative_debt = 0.0f64;
        let mut max_sleep_debt = 0.0f64;
        let mut total_effective_sleep_hours = 0.0f64;
        let mut recurrent_rest_history: Vec<chrono::DateTime<chrono::Utc>> = Vec::new();
        let mut last_completed_duty_id: Option<String> = None;

        let first_duty = roster
            .duties
            .first()
            .ok_or_else(|| AnalysisError::RosterValidation("roster has no duties".to_string()))?;

        // Baseline pre-first-duty sleep block: an 8h-ago-to-1h-ago home-base
        // rest, treated as fully rested ground truth for the simulation's
        // starting Process-S state.
        let baseline_block = SleepBlock {
            start_utc: first_duty.report_utc - Duration::hours(8),
            end_utc: first_duty.report_utc - Duration::hours(1),
            location_tz: roster.home_base_tz.clone(),
            environment: Environment::Home,
            sleep_type: SleepType::Recovery,
            confidence: 1.0,
            effective_hours: 0.0,
        };
        let baseline_ctx = SleepQualityContext {
            time_since_previous_release_h: 24.0,
            time_until_next_report_h: 1.0,
            is_recovery: true,
            wake_anchor_phase: 0.0,
        };
        let (baseline_effective, _) = SleepQualityCalculator::effective_hours(
            &baseline_block,
            home_tz,
            &baseline_ctx,
            &self.params,
        );
        sleep_blocks_generated += 1;
        total_effective_sleep_hours += baseline_effective;
        cumulative_debt = (self.params.baseline_sleep_need_hours - baseline_effective).max(0.0);
        max_sleep_debt = max_sleep_debt.max(cumulative_debt);

        let mut wake_utc = baseline_block.end_utc;
        let mut wake_anchor = WakeAnchor {
            s_at_wake: self.params.s_min,
        };
        let mut pending_s_at_duty_end = self.params.s_min;
        let mut phase_shift_hours = 0.0f64;

        for (i, duty) in roster.duties.iter().enumerate() {
            if cancel.is_cancelled() {
                let partial = MonthlyAnalysis {
                    roster_id: roster.roster_id.clone(),
                    pilot_id: roster.pilot_id.clone(),
                    duty_timelines,
                    rest_periods,
                    rest_compliance_findings,
                    diagnostics,
                    avg_sleep_per_night_h: 0.0,
                    max_sleep_debt_h: max_sleep_debt,
                    low_count: 0,
                    moderate_count: 0,
                    high_count: 0,
                    critical_count: 0,
                    extreme_count: 0,
                    worst_duty_id: None,
                    total_pinch_events: 0,
                };
                return Err(AnalysisError::Cancelled {
                    partial: Box::new(partial),
                    last_completed_duty_id,
                });
            }

            if i > 0 {
                let prev = &roster.duties[i - 1];
                let rest_start = prev.release_utc;
                let rest_end = duty.report_utc;
                let is_away = prev.last_arrival().code != roster.home_base_code;

                let location_tz = if is_away {
                    parse_tz(&airports.lookup(&prev.last_arrival().code)?.timezone)?
                } else {
                    home_tz
                };
                let environment = if is_away {
                    Environment::Hotel
                } else {
                    Environment::Home
                };

                let duty_hours = duty.duty_hours();
                let crosses_wocl =
                    duty_crosses_wocl(duty.report_utc, duty.release_utc, home_tz, &self.params);

                let ctx = SleepContext {
                    duty_id: duty.duty_id.clone(),
                    rest_start_utc: rest_start,
                    rest_end_utc: rest_end,
                    home_tz,
                    location_tz,
                    environment,
                    duty_crosses_wocl: crosses_wocl,
                    duty_hours,
                };
                let strategy = select_strategy(&ctx, &self.params);
                let mut dispatch = strategy.generate(&ctx, &self.params);
                sleep_blocks_generated += dispatch.blocks.len();
                diagnostics.append(&mut dispatch.diagnostics);

                let mut total_effective = 0.0;
                for block in &mut dispatch.blocks {
                    let time_since_previous_release_h =
                        (block.start_utc - rest_start).num_seconds() as f64 / 3600.0;
                    let time_until_next_report_h =
                        (rest_end - block.end_utc).num_seconds() as f64 / 3600.0;
                    let quality_ctx = SleepQualityContext {
                        time_since_previous_release_h,
                        time_until_next_report_h,
                        is_recovery: block.sleep_type == SleepType::Recovery,
                        wake_anchor_phase: phase_shift_hours,
                    };
                    let (effective, _) = SleepQualityCalculator::effective_hours(
                        block,
                        home_tz,
                        &quality_ctx,
                        &self.params,
                    );
                    block.effective_hours = effective;
                    total_effective += effective;
                }
                total_effective_sleep_hours += total_effective;

                if let (Some(first), Some(last)) = (dispatch.blocks.first(), dispatch.blocks.last()) {
                    let hours_asleep = (last.end_utc - first.start_utc).num_seconds() as f64 / 3600.0;
                    let s_at_wake =
                        process_s_during_sleep(hours_asleep, pending_s_at_duty_end, &self.params);
                    wake_anchor = WakeAnchor { s_at_wake };
                    wake_utc = last.end_utc;
                }

                let elapsed_days = (rest_end - rest_start).num_seconds() as f64 / 86400.0;

                // Sleep debt (§4.7c): accumulation uses raw duration, not
                // effective hours; decay is exponential in elapsed days.
                let period_need = self.params.baseline_sleep_need_hours * elapsed_days;
                let period_sleep_raw: f64 =
                    dispatch.blocks.iter().map(|b| b.duration_hours()).sum();
                let balance = period_sleep_raw - period_need;
                if balance < 0.0 {
                    cumulative_debt += -balance;
                } else if balance > 0.0 && cumulative_debt > 0.0 {
                    cumulative_debt = (cumulative_debt - balance).max(0.0);
                }
                cumulative_debt *=
                    (-self.params.debt_decay_rate_per_day * elapsed_days.max(0.0)).exp();
                max_sleep_debt = max_sleep_debt.max(cumulative_debt);

                // Jet-lag adaptation (§4.7d): chase the tz-offset target of
                // wherever the pilot now is, at the configured per-day rate.
                let target = phase_shift_target_hours(location_tz, home_tz, rest_end);
                phase_shift_hours =
                    step_phase_shift(phase_shift_hours, target, elapsed_days, &self.params);

                let rest = crate::types::RestPeriod {
                    previous_duty_id: prev.duty_id.clone(),
                    next_duty_id: duty.duty_id.clone(),
                    start_utc: rest_start,
                    end_utc: rest_end,
                    is_away_from_base: is_away,
                };

                if satisfies_recurrent_rest(&rest, home_tz) {
                    recurrent_rest_history.push(rest.end_utc);
                }
                recurrent_rest_history.retain(|t| {
                    (rest.end_utc - *t).num_hours() <= RECURRENT_REST_WINDOW_HOURS
                });

                let mut finding = check_rest_period(&rest, prev, home_tz, &self.params);
                if recurrent_rest_history.is_empty() {
                    finding.violations.push("recurrent_rest_overdue".to_string());
                    finding.is_compliant = false;
                }

                rest_periods.push(rest);
                rest_compliance_findings.push(finding);
            }

            let duty_ctx = DutySimContext {
                wake_utc,
                wake_anchor,
                home_tz,
                cumulative_sleep_debt_h: cumulative_debt,
                sleep_blocks_generated_before: sleep_blocks_generated,
                phase_shift_hours,
            };
            let timeline = simulate_duty(duty, &duty_ctx, &self.params, stride_minutes, cancel)?;
            pending_s_at_duty_end = timeline
                .timeline
                .last()
                .map(|p| p.s)
                .unwrap_or(wake_anchor.s_at_wake);

            duty_timelines.push(timeline);
            last_completed_duty_id = Some(duty.duty_id.clone());
        }

        Ok(self.summarize(roster, duty_timelines, rest_periods, rest_compliance_findings, diagnostics, total_effective_sleep_hours, sleep_blocks_generated, max_sleep_debt))
    }

    #[allow(clippy::too_many_arguments)]
    fn summarize(
        &self,
        roster: &Roster,
        duty_timelines: Vec<crate::types::DutyTimeline>,
        rest_periods: Vec<crate::types::RestPeriod>,
        rest_compliance_findings: Vec<crate::types::RestComplianceFinding>,
        diagnostics: Vec<crate::types::SleepDiagnostic>,
        total_effective_sleep_hours: f64,
        sleep_blocks_generated: usize,
        max_sleep_debt: f64,
    ) -> MonthlyAnalysis {
        let mut low_count = 0u32;
        let mut moderate_count = 0u32;
        let mut high_count = 0u32;
        let mut critical_count = 0u32;
        let mut extreme_count = 0u32;
        let mut worst_duty_id = None;
        let mut worst_performance = f64::INFINITY;
        let mut total_pinch_events = 0usize;

        for dt in &duty_timelines {
            total_pinch_events += dt.pinch_events.len();
            if let Some(risk) = dt.risk_level(&self.params) {
                match risk {
                    crate::types::RiskLevel::Low => low_count += 1,
                    crate::types::RiskLevel::Moderate => moderate_count += 1,
                    crate::types::RiskLevel::High => high_count += 1,
                    crate::types::RiskLevel::Critical => critical_count += 1,
                    crate::types::RiskLevel::Extreme => extreme_count += 1,
                }
            }
            if let Some(landing) = dt.landing_performance {
                if landing < worst_performance {
                    worst_performance = landing;
                    worst_duty_id = Some(dt.duty_id.clone());
                }
            }
        }

        let avg_sleep_per_night_h = if sleep_blocks_generated > 0 {
            total_effective_sleep_hours / sleep_blocks_generated as f64
        } else {
            0.0
        };

        MonthlyAnalysis {
            roster_id: roster.roster_id.clone(),
            pilot_id: roster.pilot_id.clone(),
            duty_timelines,
            rest_periods,
            rest_compliance_findings,
            diagnostics,
            avg_sleep_per_night_h,
            max_sleep_debt_h: max_sleep_debt,
            low_count,
            moderate_count,
            high_count,
            critical_count,
            extreme_count,
            worst_duty_id,
            total_pinch_events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airport::StaticAirportTable;
    use crate::types::{Airport, Duty, FlightSegment};
    use chrono::TimeZone;

    fn airport(code: &str, tz: &str) -> Airport {
        Airport {
            code: code.to_string(),
            timezone: tz.to_string(),
            lat: 0.0,
            lon: 0.0,
        }
    }

    fn sample_roster() -> Roster {
        let doh = airport("DOH", "Asia/Qatar");
        let lhr = airport("LHR", "Europe/London");

        let report1 = chrono::Utc.with_ymd_and_hms(2026, 3, 1, 4, 0, 0).unwrap();
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
        .unwrap();

        let report2 = duty1.release_utc + Duration::hours(24);
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
        .unwrap();

        Roster {
            roster_id: "R1".to_string(),
            pilot_id: "P1".to_string(),
            month_year: 2026,
            month: 3,
            duties: vec![duty1, duty2],
            home_base_tz: "Asia/Qatar".to_string(),
            home_base_code: "DOH".to_string(),
        }
    }

    #[test]
    fn analyze_produces_one_timeline_per_duty() {
        let roster = sample_roster();
        let airports = StaticAirportTable::from_iter([
            airport("DOH", "Asia/Qatar"),
            airport("LHR", "Europe/London"),
        ]);
        let sim = RosterSimulator::new(Parameters::default());
        let cancel = CancellationToken::new();
        let analysis = sim.analyze(&roster, &airports, 15, &cancel).unwrap();
        assert_eq!(analysis.duty_timelines.len(), 2);
        assert_eq!(analysis.rest_periods.len(), 1);
        assert_eq!(analysis.rest_compliance_findings.len(), 1);
    }

    #[test]
    fn cancellation_returns_partial_analysis() {
        let roster = sample_roster();
        let airports = StaticAirportTable::from_iter([
            airport("DOH", "Asia/Qatar"),
            airport("LHR", "Europe/London"),
        ]);
        let sim = RosterSimulator::new(Parameters::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = sim.analyze(&roster, &airports, 15, &cancel);
        match result {
            Err(AnalysisError::Cancelled { partial, .. }) => {
                assert!(partial.duty_timelines.is_empty());
            }
            _ => panic!("expected Cancelled error"),
        }
    }

    #[test]
    fn unknown_airport_surfaces_as_error() {
        let roster = sample_roster();
        let airports = StaticAirportTable::new(); // empty: LHR unresolvable
        let sim = RosterSimulator::new(Parameters::default());
        let cancel = CancellationToken::new();
        let result = sim.analyze(&roster, &airports, 15, &cancel);
        assert!(matches!(result, Err(AnalysisError::UnknownAirport(_))));
    }
}
