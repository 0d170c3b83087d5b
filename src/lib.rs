//! WingWatch fatigue core — a biomathematical fatigue simulator for airline
//! pilot rosters.
//!
//! Given a validated monthly roster (duties plus flight segments) and an
//! airport timezone lookup, [`roster::RosterSimulator::analyze`] produces a
//! per-duty performance timeline, sleep-quality diagnostics, and EASA
//! ORO.FTL.235 rest-period compliance findings. The simulation is
//! synchronous, single-threaded and deterministic: the same roster and
//! parameters always produce the same analysis.
//!
//! ```text
//! roster.rs    -- orchestrates the whole month, threads sleep/debt state
//!   duty.rs    -- per-duty stride simulation (Processes S/C/W -> performance)
//!   sleep.rs   -- picks and generates sleep blocks within rest opportunities
//!   quality.rs -- scores a sleep block's effective (fatigue-relevant) hours
//!   compliance.rs -- EASA rest-period rule checking
//! params.rs, time_utils.rs, process.rs, airport.rs, cancel.rs -- shared support
//! ```

pub mod airport;
pub mod cancel;
pub mod compliance;
pub mod duty;
pub mod error;
pub mod params;
pub mod process;
pub mod quality;
pub mod roster;
pub mod sleep;
pub mod time_utils;
pub mod types;

pub use error::AnalysisError;
pub use params::{Parameters, PresetName};
pub use roster::RosterSimulator;
pub use types::{MonthlyAnalysis, Roster};

/// WingWatch core version, embedded in CLI output for reproducibility.
pub const WINGWATCH_VERSION: &str = env!("CARGO_PKG_VERSION");
