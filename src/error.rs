//! Error types for the WingWatch fatigue core

use crate::types::MonthlyAnalysis;
use thiserror::Error;

/// Errors that can occur during fatigue analysis.
///
/// Only conditions that make continuing the analysis meaningless become an
/// `Err`. Sleep-block truncation and EASA compliance violations are not
/// fatal — they are recorded as data in the returned `MonthlyAnalysis`
/// (see [`crate::types::SleepDiagnostic`] and
/// [`crate::types::RestComplianceFinding`]).
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("roster validation failed: {0}")]
    RosterValidation(String),

    #[error("missing timezone for airport: {0}")]
    UnknownAirport(String),

    #[error("numeric instability in performance integration: {0}")]
    NumericInstability(String),

    #[error("analysis cancelled after duty {last_completed_duty_id:?}")]
    Cancelled {
        partial: Box<MonthlyAnalysis>,
        last_completed_duty_id: Option<String>,
    },
}
