//! Homeostatic / circadian / inertia process evaluator (component E)
//!
//! Closed-form evaluation of the three processes that drive the fatigue
//! model: Process S (homeostatic sleep pressure), Process C (circadian
//! alertness), and Process W (post-wake sleep inertia). Each is a pure
//! function of elapsed time plus a boundary condition — no internal state,
//! no stepping loop. The stride loop that walks these forward across a duty
//! lives in `duty.rs`.

use std::f64::consts::PI;

use crate::params::Parameters;

/// The boundary condition Process S decays from after a sleep block ends:
/// the instant of waking and the S value at that instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WakeAnchor {
    pub s_at_wake: f64,
}

/// Process S while awake: exponential relaxation from `s_at_wake` up toward
/// `s_max` with time constant `tau_wake_hours`.
pub fn process_s(hours_awake: f64, anchor: WakeAnchor, params: &Parameters) -> f64 {
    let hours_awake = hours_awake.max(0.0);
    let s = params.s_max - (params.s_max - anchor.s_at_wake) * (-hours_awake / params.tau_wake_hours).exp();
    s.clamp(params.s_min, params.s_max)
}

/// Process S while asleep: exponential relaxation from `s_at_onset` down
/// toward `s_min` with time constant `tau_sleep_hours`.
pub fn process_s_during_sleep(hours_asleep: f64, s_at_onset: f64, params: &Parameters) -> f64 {
    let hours_asleep = hours_asleep.max(0.0);
    let s = params.s_min + (s_at_onset - params.s_min) * (-hours_asleep / params.tau_sleep_hours).exp();
    s.clamp(params.s_min, params.s_max)
}

/// Process C: circadian alertness as a cosine of local time-of-day,
/// peaking at `circadian_acrophase_effective_hours + phase_shift_hours`.
/// Returned in `[-amplitude, amplitude]`.
///
/// `phase_shift_hours` is the cumulative jet-lag adaptation accrued since
/// the roster began (§4.5/§4.7): zero for a pilot who has not left home
/// base, non-zero once the roster simulator has advanced it across a
/// layover away from the acrophase's home timing.
pub fn process_c(local_hour: f64, phase_shift_hours: f64, params: &Parameters) -> f64 {
    let phase = 2.0
        * PI
        * (local_hour - params.circadian_acrophase_effective_hours - phase_shift_hours)
        / params.circadian_period_hours;
    params.circadian_amplitude * phase.cos()
}

/// Scale sleep inertia's magnitude by the circadian phase at the moment of
/// waking (§4.1, §4.5): waking during the circadian trough (low or negative
/// `c_at_wake`) produces markedly worse inertia than waking near the
/// acrophase. Ranges `[0.7, 1.3]` around the unscaled `process_w` value.
pub fn circadian_inertia_factor(c_at_wake: f64, params: &Parameters) -> f64 {
    let amplitude = params.circadian_amplitude.max(1e-9);
    (1.0 - 0.3 * (c_at_wake / amplitude)).clamp(0.7, 1.3)
}

/// Process W: sleep inertia, a linear decay from `inertia_w_max` to zero
/// over `inertia_duration_minutes` following a wake event, scaled by
/// `inertia_factor` (§4.1: "larger values when waking during circadian
/// trough", computed via [`circadian_inertia_factor`]). Zero once the
/// window has elapsed regardless of the scaling factor.
pub fn process_w(minutes_since_wake: f64, inertia_factor: f64, params: &Parameters) -> f64 {
    if minutes_since_wake >= params.inertia_duration_minutes {
        return 0.0;
    }
    let unscaled = if minutes_since_wake <= 0.0 {
        params.inertia_w_max
    } else {
        params.inertia_w_max * (1.0 - minutes_since_wake / params.inertia_duration_minutes)
    };
    unscaled * inertia_factor
}

/// Combine S, C, W and cumulative time-on-task into a single performance
/// score on `[20, 100]` — never zero, per the model's floor (a pilot is
/// never modeled as having literally zero capacity).
///
/// `s` is converted from "pressure" (1 = saturated) to "alertness"
/// (`1 - S`); `c`, which already lives in `[-amplitude, +amplitude]`, is
/// rescaled to `[0, 1]`. Inertia and time-on-task are subtracted as direct
/// penalties on the weighted 60/40 homeostatic/circadian base before the
/// final `20 + 80 * clamp(base, 0, 1)` projection.
pub fn integrate_performance(s: f64, c: f64, w: f64, hours_on_task: f64, params: &Parameters) -> f64 {
    let s_alertness = (1.0 - s).clamp(0.0, 1.0);
    let c_alertness = ((c / params.circadian_amplitude.max(1e-9)) + 1.0) / 2.0;

    let mut base = params.w_homeostatic * s_alertness + params.w_circadian * c_alertness;
    let time_on_task_penalty = params.time_on_task_rate_per_hour * hours_on_task.max(0.0);
    base -= time_on_task_penalty;
    base -= w;

    20.0 + 80.0 * base.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_s_approaches_s_max_while_awake() {
        let params = Parameters::default();
        let anchor = WakeAnchor { s_at_wake: params.s_min };
        let early = process_s(1.0, anchor, &params);
        let late = process_s(48.0, anchor, &params);
        assert!(late > early);
        assert!(late <= params.s_max + 1e-9);
    }

    #[test]
    fn process_s_decays_toward_s_min_while_asleep() {
        let params = Parameters::default();
        let early = process_s_during_sleep(0.5, params.s_max, &params);
        let late = process_s_during_sleep(8.0, params.s_max, &params);
        assert!(late < early);
        assert!(late >= params.s_min - 1e-9);
    }

    #[test]
    fn process_c_peaks_at_acrophase() {
        let params = Parameters::default();
        let at_peak = process_c(params.circadian_acrophase_effective_hours, 0.0, &params);
        let off_peak = process_c(params.circadian_acrophase_effective_hours + 12.0, 0.0, &params);
        assert!((at_peak - params.circadian_amplitude).abs() < 1e-9);
        assert!(off_peak < at_peak);
    }

    #[test]
    fn process_c_peak_tracks_phase_shift() {
        let params = Parameters::default();
        let unshifted_peak = process_c(params.circadian_acrophase_effective_hours, 0.0, &params);
        let shifted_peak = process_c(params.circadian_acrophase_effective_hours + 3.0, 3.0, &params);
        assert!((unshifted_peak - shifted_peak).abs() < 1e-9);
    }

    #[test]
    fn process_w_decays_to_zero_and_stays_there() {
        let params = Parameters::default();
        assert_eq!(process_w(0.0, 1.0, &params), params.inertia_w_max);
        assert_eq!(process_w(params.inertia_duration_minutes, 1.0, &params), 0.0);
        assert_eq!(
            process_w(params.inertia_duration_minutes + 100.0, 1.0, &params),
            0.0
        );
        let mid = process_w(params.inertia_duration_minutes / 2.0, 1.0, &params);
        assert!(mid > 0.0 && mid < params.inertia_w_max);
    }

    #[test]
    fn circadian_inertia_factor_is_larger_at_trough_than_peak() {
        let params = Parameters::default();
        let at_peak = circadian_inertia_factor(params.circadian_amplitude, &params);
        let at_trough = circadian_inertia_factor(-params.circadian_amplitude, &params);
        assert!(at_trough > at_peak);
        assert_eq!(at_peak, 0.7);
        assert_eq!(at_trough, 1.3);
    }

    #[test]
    fn process_w_zero_past_window_regardless_of_inertia_factor() {
        let params = Parameters::default();
        assert_eq!(process_w(params.inertia_duration_minutes, 1.3, &params), 0.0);
    }

    #[test]
    fn integrate_performance_is_bounded_and_penalized_by_inertia() {
        let params = Parameters::default();
        let anchor = WakeAnchor { s_at_wake: params.s_min };
        let s = process_s(2.0, anchor, &params);
        let c = process_c(params.circadian_acrophase_effective_hours, 0.0, &params);
        let without_inertia = integrate_performance(s, c, 0.0, 0.0, &params);
        let with_inertia = integrate_performance(s, c, params.inertia_w_max, 0.0, &params);
        assert!(with_inertia < without_inertia);
        assert!((20.0..=100.0).contains(&without_inertia));
        assert!((20.0..=100.0).contains(&with_inertia));
    }

    #[test]
    fn integrate_performance_never_drops_below_the_floor() {
        let params = Parameters::default();
        let worst = integrate_performance(params.s_max, -params.circadian_amplitude, params.inertia_w_max, 100.0, &params);
        assert!((worst - 20.0).abs() < 1e-9);
    }

    #[test]
    fn time_on_task_reduces_performance_monotonically() {
        let params = Parameters::default();
        let anchor = WakeAnchor { s_at_wake: params.s_min };
        let s = process_s(4.0, anchor, &params);
        let c = process_c(10.0, 0.0, &params);
        let early = integrate_performance(s, c, 0.0, 0.0, &params);
        let later = integrate_performance(s, c, 0.0, 6.0, &params);
        assert!(later <= early);
    }
}
