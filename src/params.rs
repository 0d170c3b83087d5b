//! Parameter bundle (component A)
//!
//! Every tunable constant in the biomathematical model lives here, as a
//! flat record rather than a nested configuration tree, so each field can
//! be documented and tested independently (the fatigue literature cites
//! each of these in isolation). Four factory presets are provided; the
//! bundle itself carries no behavior beyond construction and lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::RiskLevel;

/// All tunable constants for the fatigue model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    // --- Homeostatic (Process S) ---
    pub s_max: f64,
    pub s_min: f64,
    /// Time constant for the wake-decay exponential (Jewett & Kronauer 1999)
    pub tau_wake_hours: f64,
    /// Time constant for the sleep-decay exponential
    pub tau_sleep_hours: f64,
    pub baseline_sleep_need_hours: f64,

    // --- Circadian (Process C) ---
    /// Configured (documented) acrophase, in local hours
    pub circadian_acrophase_hours: f64,
    /// Effective acrophase actually used in `process_c`; may diverge from
    /// `circadian_acrophase_hours` when a preset tunes the model against
    /// field data without relabeling the documented constant.
    pub circadian_acrophase_effective_hours: f64,
    pub circadian_amplitude: f64,
    pub circadian_period_hours: f64,
    pub wocl_start_hour: f64,
    pub wocl_end_hour: f64,

    // --- Sleep inertia (Process W) ---
    pub inertia_duration_minutes: f64,
    pub inertia_w_max: f64,

    // --- Integration weights ---
    pub w_homeostatic: f64,
    pub w_circadian: f64,
    pub time_on_task_rate_per_hour: f64,

    // --- Sleep debt ---
    pub debt_decay_rate_per_day: f64,

    // --- Jet-lag adaptation ---
    pub westward_adaptation_h_per_day: f64,
    pub eastward_adaptation_h_per_day: f64,

    // --- Sleep quality base efficiency by environment ---
    pub base_efficiency_home: f64,
    pub base_efficiency_hotel: f64,
    pub base_efficiency_crew_house: f64,
    pub base_efficiency_airport_hotel: f64,
    pub base_efficiency_crew_rest: f64,
    pub base_efficiency_inflight: f64,

    // --- Sleep quality factor bounds ---
    pub wocl_misalignment_max_penalty: f64,
    pub late_onset_min_factor: f64,
    pub recovery_boost_2h: f64,
    pub recovery_boost_4h: f64,
    pub insufficient_min_factor: f64,
    /// Below this raw duration, the insufficient-duration factor applies
    /// (§4.1: "Insufficient: 0.75-1.00 for durations <6 h").
    pub insufficient_duration_threshold_hours: f64,
    /// Floor applied when the next duty's report is imminent; scales
    /// linearly up to 1.0 once `time_pressure_full_hours` or more remain.
    pub time_pressure_min_factor: f64,
    /// Hours until next report at or beyond which time pressure is fully
    /// relieved (§4.1: "1.00 if >=6h until next duty").
    pub time_pressure_full_hours: f64,
    pub factor_product_min: f64,
    pub factor_product_max: f64,

    // --- Risk thresholds (on 0-100 performance scale) ---
    pub risk_low_min: f64,
    pub risk_moderate_min: f64,
    pub risk_high_min: f64,
    pub risk_critical_min: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            s_max: 1.0,
            s_min: 0.0,
            tau_wake_hours: 18.2,
            tau_sleep_hours: 4.2,
            baseline_sleep_need_hours: 8.0,

            circadian_acrophase_hours: 17.0,
            circadian_acrophase_effective_hours: 16.0,
            circadian_amplitude: 0.55,
            circadian_period_hours: 24.0,
            wocl_start_hour: 2.0,
            wocl_end_hour: 6.0,

            inertia_duration_minutes: 30.0,
            inertia_w_max: 0.3,

            w_homeostatic: 0.6,
            w_circadian: 0.4,
            time_on_task_rate_per_hour: 0.008,

            debt_decay_rate_per_day: 0.5,

            westward_adaptation_h_per_day: 1.5,
            eastward_adaptation_h_per_day: 1.0,

            base_efficiency_home: 0.95,
            base_efficiency_hotel: 0.88,
            base_efficiency_crew_house: 0.90,
            base_efficiency_airport_hotel: 0.85,
            base_efficiency_crew_rest: 0.70,
            base_efficiency_inflight: 0.70,

            wocl_misalignment_max_penalty: 0.15,
            late_onset_min_factor: 0.93,
            recovery_boost_2h: 1.05,
            recovery_boost_4h: 1.03,
            insufficient_min_factor: 0.75,
            insufficient_duration_threshold_hours: 6.0,
            time_pressure_min_factor: 0.88,
            time_pressure_full_hours: 6.0,
            factor_product_min: 0.65,
            factor_product_max: 1.10,

            risk_low_min: 75.0,
            risk_moderate_min: 65.0,
            risk_high_min: 55.0,
            risk_critical_min: 45.0,
        }
    }
}

impl Parameters {
    /// More conservative: wider WOCL penalty, slower debt decay, higher thresholds.
    pub fn conservative() -> Self {
        let mut p = Self::default();
        p.wocl_misalignment_max_penalty = 0.20;
        p.debt_decay_rate_per_day = 0.35;
        p.risk_low_min = 80.0;
        p.risk_moderate_min = 70.0;
        p.risk_high_min = 60.0;
        p.risk_critical_min = 50.0;
        p
    }

    /// More permissive: narrower WOCL penalty, faster debt decay, lower thresholds.
    pub fn liberal() -> Self {
        let mut p = Self::default();
        p.wocl_misalignment_max_penalty = 0.10;
        p.debt_decay_rate_per_day = 0.65;
        p.risk_low_min = 70.0;
        p.risk_moderate_min = 60.0;
        p.risk_high_min = 50.0;
        p.risk_critical_min = 40.0;
        p
    }

    /// Research preset: widest inertia window and most literature-faithful tau values,
    /// intended for offline sensitivity analysis rather than day-to-day risk flagging.
    pub fn research() -> Self {
        let mut p = Self::default();
        p.tau_wake_hours = 18.2;
        p.tau_sleep_hours = 4.2;
        p.inertia_duration_minutes = 45.0;
        p.inertia_w_max = 0.35;
        p
    }

    pub fn from_preset(preset: PresetName) -> Self {
        match preset {
            PresetName::Default => Self::default(),
            PresetName::Conservative => Self::conservative(),
            PresetName::Liberal => Self::liberal(),
            PresetName::Research => Self::research(),
        }
    }

    /// Base sleep-quality efficiency for a given environment.
    pub fn base_efficiency(&self, env: crate::types::Environment) -> f64 {
        use crate::types::Environment::*;
        match env {
            Home => self.base_efficiency_home,
            Hotel => self.base_efficiency_hotel,
            CrewHouse => self.base_efficiency_crew_house,
            AirportHotel => self.base_efficiency_airport_hotel,
            CrewRest => self.base_efficiency_crew_rest,
            Inflight => self.base_efficiency_inflight,
        }
    }

    /// Classify a landing performance value into a risk bucket.
    pub fn risk_level(&self, performance: f64) -> RiskLevel {
        if performance >= self.risk_low_min {
            RiskLevel::Low
        } else if performance >= self.risk_moderate_min {
            RiskLevel::Moderate
        } else if performance >= self.risk_high_min {
            RiskLevel::High
        } else if performance >= self.risk_critical_min {
            RiskLevel::Critical
        } else {
            RiskLevel::Extreme
        }
    }
}

/// Named preset identifier, for external callers selecting a bundle by name:
/// one of `default`, `conservative`, `liberal`, `research`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetName {
    Default,
    Conservative,
    Liberal,
    Research,
}

impl PresetName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Default => "default",
            PresetName::Conservative => "conservative",
            PresetName::Liberal => "liberal",
            PresetName::Research => "research",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(PresetName::Default),
            "conservative" => Ok(PresetName::Conservative),
            "liberal" => Ok(PresetName::Liberal),
            "research" => Ok(PresetName::Research),
            other => Err(format!("unknown preset: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_matches_documented_constants() {
        let p = Parameters::default();
        assert_eq!(p.tau_wake_hours, 18.2);
        assert_eq!(p.tau_sleep_hours, 4.2);
        assert_eq!(p.baseline_sleep_need_hours, 8.0);
        assert_eq!(p.w_homeostatic, 0.6);
        assert_eq!(p.w_circadian, 0.4);
    }

    #[test]
    fn risk_level_boundaries() {
        let p = Parameters::default();
        assert_eq!(p.risk_level(90.0), RiskLevel::Low);
        assert_eq!(p.risk_level(75.0), RiskLevel::Low);
        assert_eq!(p.risk_level(70.0), RiskLevel::Moderate);
        assert_eq!(p.risk_level(60.0), RiskLevel::High);
        assert_eq!(p.risk_level(50.0), RiskLevel::Critical);
        assert_eq!(p.risk_level(30.0), RiskLevel::Extreme);
    }

    #[test]
    fn preset_from_str_roundtrip() {
        for preset in [
            PresetName::Default,
            PresetName::Conservative,
            PresetName::Liberal,
            PresetName::Research,
        ] {
            let parsed: PresetName = preset.to_string().parse().unwrap();
            assert_eq!(parsed, preset);
        }
    }

    #[test]
    fn conservative_is_stricter_than_liberal() {
        let conservative = Parameters::conservative();
        let liberal = Parameters::liberal();
        assert!(conservative.risk_low_min > liberal.risk_low_min);
        assert!(conservative.debt_decay_rate_per_day < liberal.debt_decay_rate_per_day);
    }
}
