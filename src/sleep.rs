//! Sleep-strategy dispatcher (component D)
//!
//! Selects one of five sleep-placement strategies for a rest opportunity
//! based on report time-of-day, duty length, and WOCL crossing, then
//! generates the sleep block(s) for it. Deliberately a closed enum
//! dispatched with an exhaustive `match` rather than a trait-object
//! hierarchy: there are exactly five strategies, they share no mutable
//! state, and a `match` keeps every branch's recipe visible in one place.

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;

use crate::params::Parameters;
use crate::time_utils::{local_hour_to_utc, to_local, wocl_overlap_hours};
use crate::types::{Environment, SleepBlock, SleepDiagnostic, SleepType};

/// Buffer reserved before report time for commute/briefing, not available
/// for sleep.
const PRE_REPORT_BUFFER_HOURS: f64 = 1.0;

/// One candidate sleep placement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepStrategyKind {
    Normal,
    NightDeparture,
    EarlyMorning,
    WoclAnchor,
    Recovery,
}

/// Everything the dispatcher needs to place sleep within one rest
/// opportunity (the gap between the previous duty's release, or the
/// simulation's baseline anchor, and the next duty's report).
pub struct SleepContext {
    pub duty_id: String,
    pub rest_start_utc: DateTime<Utc>,
    pub rest_end_utc: DateTime<Utc>,
    pub home_tz: Tz,
    pub location_tz: Tz,
    pub environment: Environment,
    /// Whether the duty this rest opportunity precedes crosses the
    /// home-base WOCL (§4.4 WOCL-Anchor trigger).
    pub duty_crosses_wocl: bool,
    /// Total duty hours of the duty this rest opportunity precedes.
    pub duty_hours: f64,
}

/// Output of one dispatch: the blocks placed (zero if the opportunity was
/// too short to place anything) and any non-fatal diagnostics.
pub struct SleepDispatchResult {
    pub blocks: Vec<SleepBlock>,
    pub diagnostics: Vec<SleepDiagnostic>,
}

/// Choose a strategy for a rest opportunity (§4.4's trigger table).
pub fn select_strategy(ctx: &SleepContext, params: &Parameters) -> SleepStrategyKind {
    let available_hours = (ctx.rest_end_utc - ctx.rest_start_utc).num_seconds() as f64 / 3600.0;
    if available_hours >= 2.0 * params.baseline_sleep_need_hours {
        return SleepStrategyKind::Recovery;
    }

    let (_, report_local) = to_local(ctx.rest_end_utc, ctx.home_tz);
    let report_hour = report_local.hour() as f64 + report_local.minute() as f64 / 60.0;

    if report_hour >= 20.0 || report_hour < 4.0 {
        SleepStrategyKind::NightDeparture
    } else if report_hour < 7.0 {
        // 04:00 <= report < 07:00
        SleepStrategyKind::EarlyMorning
    } else if report_hour < 20.0 && ctx.duty_crosses_wocl && ctx.duty_hours > 6.0 {
        // 07:00 <= report < 20:00
        SleepStrategyKind::WoclAnchor
    } else {
        SleepStrategyKind::Normal
    }
}

impl SleepStrategyKind {
    /// Generate the sleep block(s) for this strategy within `ctx`.
    pub fn generate(self, ctx: &SleepContext, params: &Parameters) -> SleepDispatchResult {
        match self {
            SleepStrategyKind::Normal => {
                // 23:00-07:00 home-local, the textbook 8h main sleep.
                let (report_date, _) = to_local(ctx.rest_end_utc, ctx.home_tz);
                let start = local_hour_to_utc(ctx.home_tz, report_date - Duration::days(1), 23.0);
                let end = local_hour_to_utc(ctx.home_tz, report_date, 7.0);
                place_fixed_block(ctx, params, start, end, SleepType::Main, 1.0, true)
            }

            SleepStrategyKind::NightDeparture => {
                // Split sleep ahead of an overnight report: a long morning
                // block the day of report, then a short pre-duty nap.
                let (report_date, _) = to_local(ctx.rest_end_utc, ctx.home_tz);
                let main_start = local_hour_to_utc(ctx.home_tz, report_date, 7.0);
                let main_end = local_hour_to_utc(ctx.home_tz, report_date, 14.0);
                let mut result =
                    place_fixed_block(ctx, params, main_start, main_end, SleepType::Main, 0.8, true);

                let nap_end = ctx.rest_end_utc - Duration::hours(2);
                let nap_start = nap_end - Duration::hours(2);
                let mut nap_result =
                    place_fixed_block(ctx, params, nap_start, nap_end, SleepType::Nap, 0.6, true);

                result.blocks.append(&mut nap_result.blocks);
                result.diagnostics.append(&mut nap_result.diagnostics);
                result
            }

            SleepStrategyKind::EarlyMorning => {
                // Roach (2012) regression: longer sleep the earlier report
                // time permits, never below 4.0h, never starting before
                // 21:30 the prior evening.
                let (_, report_local) = to_local(ctx.rest_end_utc, ctx.home_tz);
                let report_hour = report_local.hour() as f64 + report_local.minute() as f64 / 60.0;
                let target_hours = (6.6 - 0.25 * (9.0 - report_hour).max(0.0)).max(4.0);

                let end = ctx.rest_end_utc - Duration::hours(1);
                let mut start = end - Duration::minutes((target_hours * 60.0).round() as i64);

                let (end_date, _) = to_local(end, ctx.home_tz);
                let earliest_bedtime = local_hour_to_utc(ctx.home_tz, end_date - Duration::days(1), 21.5);
                if start < earliest_bedtime {
                    start = earliest_bedtime;
                }

                place_fixed_block_with_confidence(ctx, start, end, SleepType::Main, 0.55)
            }

            SleepStrategyKind::WoclAnchor => {
                // 4.5h anchor sleep (Minors & Waterhouse 1981), ending
                // 1.5h before report to preserve some circadian
                // entrainment when a full night isn't possible.
                let end = ctx.rest_end_utc - Duration::minutes(90);
                let start = end - Duration::minutes((4.5 * 60.0) as i64);
                place_fixed_block(ctx, params, start, end, SleepType::Anchor, 0.85, true)
            }

            SleepStrategyKind::Recovery => {
                // Main sleep 23:00-07:00 in wherever the pilot currently
                // is, subject to the post-duty timing guard: must start
                // at least 2h after release and end at least 1h before
                // the next obligation. When the rest gap is too tight for
                // that nominal window to fit at all (a same-day turn
                // where the next report falls in the evening), fall back
                // to a daytime block anchored right after the guard's
                // earliest start.
                let earliest_start = ctx.rest_start_utc + Duration::hours(2);
                let latest_end = ctx.rest_end_utc - Duration::hours(1);

                let anchor_instant = ctx.rest_start_utc + Duration::hours(12);
                let (anchor_date, _) = to_local(anchor_instant, ctx.location_tz);
                let anchor_start = local_hour_to_utc(ctx.location_tz, anchor_date - Duration::days(1), 23.0);
                let anchor_end = local_hour_to_utc(ctx.location_tz, anchor_date, 7.0);

                let (start, end) = if anchor_start < latest_end && anchor_end > earliest_start {
                    (anchor_start.max(earliest_start), anchor_end.min(latest_end))
                } else {
                    let fallback_end =
                        (earliest_start + Duration::hours(params.baseline_sleep_need_hours as i64))
                            .min(latest_end);
                    (earliest_start, fallback_end)
                };

                place_fixed_block(ctx, params, start, end, SleepType::Recovery, 0.95, true)
            }
        }
    }
}

/// Place a block anchored to a fixed local window, clipping it into the
/// rest opportunity and enforcing the no-overlap invariant (§4.4): the
/// result never extends before `rest_start`, and — when `respect_report_buffer`
/// is set — never later than `rest_end - PRE_REPORT_BUFFER_HOURS`.
fn place_fixed_block(
    ctx: &SleepContext,
    _params: &Parameters,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    sleep_type: SleepType,
    base_confidence: f64,
    respect_report_buffer: bool,
) -> SleepDispatchResult {
    let usable_end = if respect_report_buffer {
        ctx.rest_end_utc - Duration::minutes((PRE_REPORT_BUFFER_HOURS * 60.0) as i64)
    } else {
        ctx.rest_end_utc
    };

    let mut clipped_start = start.max(ctx.rest_start_utc);
    let mut clipped_end = end.min(usable_end);
    let mut confidence = base_confidence;

    if clipped_start > start || clipped_end < end {
        confidence = (confidence * 0.7).max(0.0).min(0.70);
    }

    build_block(
        ctx,
        &mut clipped_start,
        &mut clipped_end,
        sleep_type,
        confidence,
    )
}

fn place_fixed_block_with_confidence(
    ctx: &SleepContext,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    sleep_type: SleepType,
    confidence: f64,
) -> SleepDispatchResult {
    let usable_end = ctx.rest_end_utc - Duration::minutes((PRE_REPORT_BUFFER_HOURS * 60.0) as i64);
    let mut clipped_start = start.max(ctx.rest_start_utc);
    let mut clipped_end = end.min(usable_end);
    let mut confidence = confidence;
    if clipped_start > start || clipped_end < end {
        confidence = confidence.min(0.70);
    }
    build_block(ctx, &mut clipped_start, &mut clipped_end, sleep_type, confidence)
}

fn build_block(
    ctx: &SleepContext,
    start: &mut DateTime<Utc>,
    end: &mut DateTime<Utc>,
    sleep_type: SleepType,
    confidence: f64,
) -> SleepDispatchResult {
    let mut diagnostics = Vec::new();

    if *end <= *start {
        diagnostics.push(SleepDiagnostic {
            duty_id: ctx.duty_id.clone(),
            message: "rest opportunity too short for any sleep placement".to_string(),
            confidence: 0.0,
        });
        return SleepDispatchResult {
            blocks: Vec::new(),
            diagnostics,
        };
    }

    let duration_hours = (*end - *start).num_seconds() as f64 / 3600.0;
    if duration_hours < 1.5 {
        diagnostics.push(SleepDiagnostic {
            duty_id: ctx.duty_id.clone(),
            message: format!(
                "sleep opportunity of {duration_hours:.2}h below the 1.5h placement floor; dropped"
            ),
            confidence: 0.0,
        });
        return SleepDispatchResult {
            blocks: Vec::new(),
            diagnostics,
        };
    }

    if confidence < 1.0 {
        diagnostics.push(SleepDiagnostic {
            duty_id: ctx.duty_id.clone(),
            message: format!(
                "sleep block truncated against duty boundaries to {duration_hours:.2}h"
            ),
            confidence,
        });
    }

    let block = SleepBlock {
        start_utc: *start,
        end_utc: *end,
        location_tz: ctx.location_tz.to_string(),
        environment: ctx.environment,
        sleep_type,
        confidence,
        effective_hours: 0.0,
    };

    SleepDispatchResult {
        blocks: vec![block],
        diagnostics,
    }
}

/// Convenience used by callers that only need the WOCL overlap fraction of
/// a rest opportunity, e.g. for compliance checks.
pub fn rest_wocl_overlap_hours(ctx: &SleepContext, params: &Parameters) -> f64 {
    wocl_overlap_hours(ctx.rest_start_utc, ctx.rest_end_utc, ctx.home_tz, params)
}
