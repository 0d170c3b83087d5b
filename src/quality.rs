//! Sleep-quality calculator (component C)
//!
//! Converts a raw sleep-block duration into an *effective* (fatigue-relevant)
//! duration by composing a handful of independent multiplicative factors.
//! Each factor is bounded to [0, ~1.1] individually; the combined product is
//! additionally clamped before being applied, and the result can never
//! exceed the raw duration it was derived from.

use chrono::Timelike;
use chrono_tz::Tz;

use crate::params::Parameters;
use crate::time_utils::{to_local, wocl_overlap_hours};
use crate::types::{SleepBlock, SleepType};

/// The rest-period context a quality assessment needs beyond the sleep
/// block itself: what the surrounding duty schedule did and does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepQualityContext {
    /// Hours between the prior duty's release and this block's onset.
    pub time_since_previous_release_h: f64,
    /// Hours between this block's end and the next duty's report.
    pub time_until_next_report_h: f64,
    /// Whether this block is the dispatcher's `Recovery` strategy.
    pub is_recovery: bool,
    /// Circadian phase shift in effect when this block was placed (§4.5,
    /// §4.7); carried for callers that want to correlate quality against
    /// jet-lag adaptation state, not currently consumed by a factor.
    pub wake_anchor_phase: f64,
}

/// The individual multiplicative factors that make up one quality
/// assessment. Kept around on the result so callers (and tests) can see
/// which factor drove a given penalty rather than only the combined number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepQualityFactors {
    pub base_efficiency: f64,
    pub wocl_misalignment: f64,
    pub late_onset: f64,
    pub recovery_boost: f64,
    pub time_pressure: f64,
    pub insufficient_duration: f64,
}

impl SleepQualityFactors {
    /// Product of all factors, clamped to the configured bounds.
    pub fn combine(&self, params: &Parameters) -> f64 {
        let product = self.base_efficiency
            * self.wocl_misalignment
            * self.late_onset
            * self.recovery_boost
            * self.time_pressure
            * self.insufficient_duration;
        product.clamp(params.factor_product_min, params.factor_product_max)
    }
}

/// Sleep onset drifting this many hours past 01:00 local reaches the full
/// `late_onset_min_factor` penalty; the grade is linear over the window.
const LATE_ONSET_DRIFT_WINDOW_HOURS: f64 = 4.0;

/// Stateless entry point for sleep-quality scoring.
pub struct SleepQualityCalculator;

impl SleepQualityCalculator {
    /// Score a sleep block, returning its effective (fatigue-relevant) hours
    /// alongside the individual factors that produced it.
    pub fn effective_hours(
        block: &SleepBlock,
        home_tz: Tz,
        ctx: &SleepQualityContext,
        params: &Parameters,
    ) -> (f64, SleepQualityFactors) {
        let raw_duration = block.duration_hours();
        let factors = Self::factors(block, raw_duration, home_tz, ctx, params);
        let combined = factors.combine(params);
        let effective = (raw_duration * combined).min(raw_duration).max(0.0);
        (effective, factors)
    }

    fn factors(
        block: &SleepBlock,
        raw_duration: f64,
        home_tz: Tz,
        ctx: &SleepQualityContext,
        params: &Parameters,
    ) -> SleepQualityFactors {
        let base_efficiency = params.base_efficiency(block.environment);
        let wocl_misalignment = Self::wocl_misalignment(block, raw_duration, home_tz, params);
        let late_onset = Self::late_onset(block, home_tz, params);
        let recovery_boost = Self::recovery_boost(ctx, params);
        let time_pressure = Self::time_pressure(ctx, params);
        let insufficient_duration = Self::insufficient_duration(raw_duration, params);

        SleepQualityFactors {
            base_efficiency,
            wocl_misalignment,
            late_onset,
            recovery_boost,
            time_pressure,
            insufficient_duration,
        }
    }

    /// Sleep that overlaps the home-base WOCL is circadian-aligned and
    /// incurs no penalty; sleep placed entirely outside it loses up to
    /// `wocl_misalignment_max_penalty`. Naps and inflight rest are not
    /// expected to align with the WOCL and are exempt.
    fn wocl_misalignment(
        block: &SleepBlock,
        raw_duration: f64,
        home_tz: Tz,
        params: &Parameters,
    ) -> f64 {
        if raw_duration <= 0.0 {
            return 1.0;
        }
        match block.sleep_type {
            SleepType::Nap | SleepType::Inflight => 1.0,
            SleepType::Main | SleepType::Anchor | SleepType::Recovery => {
                let overlap = wocl_overlap_hours(block.start_utc, block.end_utc, home_tz, params);
                let overlap_fraction = (overlap / raw_duration).clamp(0.0, 1.0);
                1.0 - (1.0 - overlap_fraction) * params.wocl_misalignment_max_penalty
            }
        }
    }

    /// Sleep onset drifting past 01:00 local is harder to initiate and of
    /// lower quality the further it drifts into the morning, graded linearly
    /// down to `late_onset_min_factor` over `LATE_ONSET_DRIFT_WINDOW_HOURS`.
    /// Onset in the afternoon/evening (before 01:00, after 13:00) carries no
    /// penalty from this factor.
    fn late_onset(block: &SleepBlock, home_tz: Tz, params: &Parameters) -> f64 {
        let (_, start_time) = to_local(block.start_utc, home_tz);
        let start_hour = start_time.hour() as f64 + start_time.minute() as f64 / 60.0;
        let drift = if (1.0..13.0).contains(&start_hour) {
            start_hour - 1.0
        } else {
            0.0
        };
        let graded = (drift / LATE_ONSET_DRIFT_WINDOW_HOURS).clamp(0.0, 1.0);
        1.0 - (1.0 - params.late_onset_min_factor) * graded
    }

    /// A recovery block taken soon after the prior duty's release earns a
    /// quality bonus, largest when release was very recent.
    fn recovery_boost(ctx: &SleepQualityContext, params: &Parameters) -> f64 {
        if !ctx.is_recovery {
            return 1.0;
        }
        if ctx.time_since_previous_release_h < 2.0 {
            params.recovery_boost_2h
        } else if ctx.time_since_previous_release_h < 4.0 {
            params.recovery_boost_4h
        } else {
            1.0
        }
    }

    /// Sleep taken under time pressure from an imminent next report loses
    /// quality, down to `time_pressure_min_factor` as the gap to the next
    /// report shrinks toward zero. No penalty once
    /// `time_pressure_full_hours` or more remain.
    fn time_pressure(ctx: &SleepQualityContext, params: &Parameters) -> f64 {
        if ctx.time_until_next_report_h >= params.time_pressure_full_hours {
            return 1.0;
        }
        let floor = params.time_pressure_min_factor;
        let t = (ctx.time_until_next_report_h / params.time_pressure_full_hours).clamp(0.0, 1.0);
        floor + (1.0 - floor) * t
    }

    /// A block shorter than `insufficient_duration_threshold_hours` loses
    /// quality proportionally to the shortfall, down to
    /// `insufficient_min_factor`.
    fn insufficient_duration(raw_duration: f64, params: &Parameters) -> f64 {
        let threshold = params.insufficient_duration_threshold_hours;
        if threshold <= 0.0 || raw_duration >= threshold {
            return 1.0;
        }
        let ratio = (raw_duration / threshold).clamp(0.0, 1.0);
        let min_factor = params.insufficient_min_factor;
        min_factor + (1.0 - min_factor) * ratio
    }
}
