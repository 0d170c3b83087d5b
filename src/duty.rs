//! Duty simulator (component F)
//!
//! Walks one duty period from report to release at a fixed time stride,
//! evaluating the three processes at each sample and folding the result
//! into a per-duty timeline plus derived summary metrics.

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;

use crate::cancel::CancellationToken;
use crate::error::AnalysisError;
use crate::params::Parameters;
use crate::process::{
    circadian_inertia_factor, integrate_performance, process_c, process_s, process_w, WakeAnchor,
};
use crate::time_utils::{to_local, wocl_overlap_hours};
use crate::types::{Duty, DutyTimeline, FlightPhase, PerformancePoint, PinchEvent};

/// The carry-over state a duty simulation needs from whatever sleep
/// preceded it. Everything else (phase placement, pinch detection) is
/// derived purely from the duty itself.
pub struct DutySimContext {
    pub wake_utc: DateTime<Utc>,
    pub wake_anchor: WakeAnchor,
    pub home_tz: Tz,
    pub cumulative_sleep_debt_h: f64,
    pub sleep_blocks_generated_before: usize,
    /// Cumulative circadian phase shift accrued from jet-lag adaptation
    /// across prior layovers (§4.5, §4.7); zero for a pilot still entrained
    /// to home base.
    pub phase_shift_hours: f64,
}

/// Phases during which coincident high pressure and circadian trough
/// count as a pinch event (§4.6 step 5). Climb is deliberately excluded —
/// the spec names only the three instants bracketing ground contact.
const PINCH_PHASES: [FlightPhase; 3] = [FlightPhase::Takeoff, FlightPhase::Approach, FlightPhase::Landing];

/// Simulate one duty at `stride_minutes` resolution.
///
/// Returns whatever timeline was completed if `cancel` is observed set
/// partway through — cancellation itself is not an error here; the caller
/// (the roster simulator, which owns the accumulated `MonthlyAnalysis`)
/// decides whether to surface it as `AnalysisError::Cancelled`.
pub fn simulate_duty(
    duty: &Duty,
    ctx: &DutySimContext,
    params: &Parameters,
    stride_minutes: i64,
    cancel: &CancellationToken,
) -> Result<DutyTimeline, AnalysisError> {
    let mut timeline = Vec::new();
    let mut pinch_events = Vec::new();
    let mut pinch_phases_seen: Vec<FlightPhase> = Vec::new();

    // Sleep inertia's magnitude is fixed at the moment of waking (§4.1): the
    // circadian phase at wake time, not at each sample, scales the W decay.
    let (_, wake_local) = to_local(ctx.wake_utc, ctx.home_tz);
    let wake_local_hour = wake_local.hour() as f64 + wake_local.minute() as f64 / 60.0;
    let c_at_wake = process_c(wake_local_hour, ctx.phase_shift_hours, params);
    let inertia_factor = circadian_inertia_factor(c_at_wake, params);

    let mut t = duty.report_utc;
    while t <= duty.release_utc {
        if cancel.is_cancelled() {
            break;
        }

        let hours_awake = (t - ctx.wake_utc).num_seconds() as f64 / 3600.0;
        let minutes_since_wake = (t - ctx.wake_utc).num_seconds() as f64 / 60.0;
        let hours_on_task = (t - duty.report_utc).num_seconds() as f64 / 3600.0;

        let s = process_s(hours_awake, ctx.wake_anchor, params);
        let w = process_w(minutes_since_wake, inertia_factor, params);
        let (t_local_date, t_local) = to_local(t, ctx.home_tz);
        let local_hour = t_local.hour() as f64 + t_local.minute() as f64 / 60.0;
        let c = process_c(local_hour, ctx.phase_shift_hours, params);
        let performance = integrate_performance(s, c, w, hours_on_task, params);

        if !performance.is_finite() || !s.is_finite() || !c.is_finite() {
            return Err(AnalysisError::NumericInstability(format!(
                "non-finite value in duty {} at {t}",
                duty.duty_id
            )));
        }

        let flight_phase = flight_phase_at(t, duty);
        let is_critical = performance < params.risk_high_min;
        let is_wocl =
            local_hour >= params.wocl_start_hour && local_hour < params.wocl_end_hour;

        // Pinch event (§4.6 step 5): high sleep pressure coincident with
        // circadian trough during a safety-critical ground-contact phase.
        // Deduplicated by phase within this duty — a sustained pinch
        // during Landing, say, is one event, not one per sample.
        if s > 0.7 && c < 0.4 && PINCH_PHASES.contains(&flight_phase) {
            if !pinch_phases_seen.contains(&flight_phase) {
                pinch_events.push(PinchEvent {
                    t_utc: t,
                    phase: flight_phase,
                    s,
                    c,
                });
                pinch_phases_seen.push(flight_phase);
            }
        }

        timeline.push(PerformancePoint {
            t_utc: t,
            t_local,
            t_local_date,
            s,
            c,
            w,
            performance,
            cumulative_sleep_debt_h: ctx.cumulative_sleep_debt_h,
            flight_phase,
            is_wocl,
            is_critical,
        });

        t += Duration::minutes(stride_minutes);
    }

    Ok(summarize(duty, timeline, pinch_events, ctx, params))
}

/// Flight-phase placement against a segment's scheduled times (§4.6 step
/// 4): Takeoff is the first 5 minutes after departure, Climb the 15
/// minutes after that, Approach the final 10 minutes before arrival,
/// Landing the final 3 of those, Descent whatever of the last 20 minutes
/// Approach and Landing don't claim, and Cruise everything airborne in
/// between. Ground time 10 minutes either side of a segment is
/// TaxiOut/TaxiIn; everything from report to the first TaxiOut is
/// Preflight, and ground time between segments (multi-sector duties)
/// falls back to TaxiIn/TaxiOut as the nearer segment boundary dictates.
fn flight_phase_at(t: DateTime<Utc>, duty: &Duty) -> FlightPhase {
    const TAXI_MINUTES: i64 = 10;
    const TAKEOFF_MINUTES: i64 = 5;
    const CLIMB_MINUTES: i64 = 15;
    const DESCENT_WINDOW_MINUTES: i64 = 20;
    const APPROACH_MINUTES: i64 = 10;
    const LANDING_MINUTES: i64 = 3;

    let first_dep = duty.segments.first().expect("validated non-empty").sched_dep_utc;
    let last_arr = duty.segments.last().expect("validated non-empty").sched_arr_utc;

    if t < first_dep - Duration::minutes(TAXI_MINUTES) {
        return FlightPhase::Preflight;
    }
    if t < first_dep {
        return FlightPhase::TaxiOut;
    }
    if t > last_arr + Duration::minutes(TAXI_MINUTES) {
        return FlightPhase::TaxiIn;
    }

    for (i, seg) in duty.segments.iter().enumerate() {
        if t >= seg.sched_dep_utc && t <= seg.sched_arr_utc {
            if t < seg.sched_dep_utc + Duration::minutes(TAKEOFF_MINUTES) {
                return FlightPhase::Takeoff;
            }
            if t < seg.sched_dep_utc + Duration::minutes(TAKEOFF_MINUTES + CLIMB_MINUTES) {
                return FlightPhase::Climb;
            }
            if t >= seg.sched_arr_utc - Duration::minutes(LANDING_MINUTES) {
                return FlightPhase::Landing;
            }
            if t >= seg.sched_arr_utc - Duration::minutes(APPROACH_MINUTES) {
                return FlightPhase::Approach;
            }
            if t >= seg.sched_arr_utc - Duration::minutes(DESCENT_WINDOW_MINUTES) {
                return FlightPhase::Descent;
            }
            return FlightPhase::Cruise;
        }
        if t > seg.sched_arr_utc {
            if let Some(next) = duty.segments.get(i + 1) {
                if t < next.sched_dep_utc {
                    let since_arr = (t - seg.sched_arr_utc).num_minutes();
                    let until_dep = (next.sched_dep_utc - t).num_minutes();
                    return if since_arr <= TAXI_MINUTES && since_arr <= until_dep {
                        FlightPhase::TaxiIn
                    } else {
                        FlightPhase::TaxiOut
                    };
                }
            }
        }
    }
    // Ground time before first departure / after last arrival, outside the
    // taxi windows already handled above.
    if t < first_dep {
        FlightPhase::Preflight
    } else {
        FlightPhase::TaxiIn
    }
}

fn summarize(
    duty: &Duty,
    timeline: Vec<PerformancePoint>,
    pinch_events: Vec<PinchEvent>,
    ctx: &DutySimContext,
    params: &Parameters,
) -> DutyTimeline {
    let min_performance = timeline
        .iter()
        .map(|p| p.performance)
        .fold(f64::INFINITY, f64::min);
    let min_performance = if min_performance.is_finite() { min_performance } else { 0.0 };

    let avg_performance = if timeline.is_empty() {
        0.0
    } else {
        timeline.iter().map(|p| p.performance).sum::<f64>() / timeline.len() as f64
    };

    // Testable property 3: landing_performance is the performance at the
    // latest Landing-phase point, or None if the stride never sampled one.
    let landing_performance = timeline
        .iter()
        .filter(|p| p.flight_phase == FlightPhase::Landing)
        .max_by_key(|p| p.t_utc)
        .map(|p| p.performance);

    let wocl_encroachment_h =
        wocl_overlap_hours(duty.report_utc, duty.release_utc, ctx.home_tz, params);

    DutyTimeline {
        duty_id: duty.duty_id.clone(),
        timeline,
        min_performance,
        avg_performance,
        landing_performance,
        pinch_events,
        wocl_encroachment_h,
        cumulative_sleep_debt_at_release: ctx.cumulative_sleep_debt_h,
        sleep_blocks_generated_before: ctx.sleep_blocks_generated_before,
    }
}
