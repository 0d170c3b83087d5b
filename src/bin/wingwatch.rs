//! WingWatch CLI - Command-line interface for the fatigue simulation core
//!
//! Commands:
//! - analyze: Run a full monthly fatigue analysis against a roster
//! - validate: Validate a roster file without running the simulation
//! - doctor: Diagnose environment/configuration health
//! - schema: Print the roster or analysis JSON schema

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use wingwatch_core::airport::StaticAirportTable;
use wingwatch_core::cancel::CancellationToken;
use wingwatch_core::params::{Parameters, PresetName};
use wingwatch_core::roster::RosterSimulator;
use wingwatch_core::types::{Airport, Roster};
use wingwatch_core::{AnalysisError, WINGWATCH_VERSION};

/// WingWatch - biomathematical fatigue simulation for airline pilot rosters
#[derive(Parser)]
#[command(name = "wingwatch")]
#[command(author = "WingWatch Aviation Safety")]
#[command(version = WINGWATCH_VERSION)]
#[command(about = "Simulate pilot fatigue and EASA rest compliance for a roster", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full monthly fatigue analysis
    Analyze {
        /// Roster file path (use - for stdin)
        #[arg(short, long)]
        roster: PathBuf,

        /// Airport reference table (JSON array of airports)
        #[arg(short, long)]
        airports: PathBuf,

        /// Parameter preset
        #[arg(long, default_value = "default")]
        preset: String,

        /// Simulation stride, in minutes
        #[arg(long, default_value = "10")]
        stride_minutes: i64,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a roster file without running the simulation
    Validate {
        /// Roster file path (use - for stdin)
        #[arg(short, long)]
        roster: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose environment/configuration health
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Roster input schema
    Roster,
    /// Monthly analysis output schema
    Analysis,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let cli_error = CliError::from(e);
            eprintln!(
                "{}",
                serde_json::to_string(&cli_error).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), WingwatchCliError> {
    match cli.command {
        Commands::Analyze {
            roster,
            airports,
            preset,
            stride_minutes,
            output,
            pretty,
        } => cmd_analyze(&roster, &airports, &preset, stride_minutes, &output, pretty),

        Commands::Validate { roster, json } => cmd_validate(&roster, json),

        Commands::Doctor { json } => cmd_doctor(json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn read_input(path: &PathBuf) -> Result<String, io::Error> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read_to_string(path)
    }
}

fn cmd_analyze(
    roster_path: &PathBuf,
    airports_path: &PathBuf,
    preset: &str,
    stride_minutes: i64,
    output: &PathBuf,
    pretty: bool,
) -> Result<(), WingwatchCliError> {
    let roster_json = read_input(roster_path)?;
    let roster: Roster = serde_json::from_str(&roster_json)?;

    let airports_json = fs::read_to_string(airports_path)?;
    let airport_list: Vec<Airport> = serde_json::from_str(&airports_json)?;
    let airport_table = StaticAirportTable::from_iter(airport_list);

    let preset_name = PresetName::from_str(preset)
        .map_err(|_| WingwatchCliError::InvalidPreset(preset.to_string()))?;
    let params = Parameters::from_preset(preset_name);
    let simulator = RosterSimulator::new(params);
    let cancel = CancellationToken::new();

    let analysis = simulator.analyze(&roster, &airport_table, stride_minutes, &cancel)?;

    let output_data = if pretty {
        serde_json::to_string_pretty(&analysis)?
    } else {
        serde_json::to_string(&analysis)?
    };

    if output.to_string_lossy() == "-" {
        println!("{output_data}");
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(roster_path: &PathBuf, json: bool) -> Result<(), WingwatchCliError> {
    let roster_json = read_input(roster_path)?;
    let roster: Result<Roster, serde_json::Error> = serde_json::from_str(&roster_json);

    let (ok, message) = match roster.as_ref().map(|r| r.validate()) {
        Ok(Ok(())) => (true, "roster is well-formed".to_string()),
        Ok(Err(e)) => (false, e.to_string()),
        Err(e) => (false, format!("invalid JSON: {e}")),
    };

    let report = ValidationReport {
        valid: ok,
        duty_count: roster.as_ref().map(|r| r.duties.len()).unwrap_or(0),
        message: message.clone(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Roster Validation Report");
        println!("========================");
        println!("Valid:  {}", report.valid);
        println!("Duties: {}", report.duty_count);
        println!("Detail: {}", report.message);
    }

    if ok {
        Ok(())
    } else {
        Err(WingwatchCliError::ValidationFailed(message))
    }
}

fn cmd_doctor(json: bool) -> Result<(), WingwatchCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "wingwatch_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("WingWatch core version {WINGWATCH_VERSION}"),
    });

    checks.push(DoctorCheck {
        name: "default_parameters".to_string(),
        status: CheckStatus::Ok,
        message: "default parameter preset loads without error".to_string(),
    });

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --roster <file> rather than -)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (roster - will read from it)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: "wingwatch-core".to_string(),
        version: WINGWATCH_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("WingWatch Doctor Report");
        println!("=======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(WingwatchCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), WingwatchCliError> {
    match schema_type {
        SchemaType::Roster => {
            println!("Roster input schema");
            println!();
            println!("A Roster is a JSON object:");
            println!("  roster_id, pilot_id, month_year, month,");
            println!("  home_base_tz (IANA), home_base_code (IATA),");
            println!("  duties: [ Duty, ... ]");
            println!();
            println!("A Duty is:");
            println!("  duty_id, date, report_utc, release_utc, home_base_tz,");
            println!("  segments: [ FlightSegment, ... ]");
            println!();
            println!("A FlightSegment is:");
            println!("  flight_no, dep, arr (Airport), sched_dep_utc, sched_arr_utc, block_hours");
        }
        SchemaType::Analysis => {
            println!("Monthly analysis output schema");
            println!();
            println!("A MonthlyAnalysis is a JSON object:");
            println!("  roster_id, pilot_id,");
            println!("  duty_timelines: [ DutyTimeline, ... ],");
            println!("  rest_periods: [ RestPeriod, ... ],");
            println!("  rest_compliance_findings: [ RestComplianceFinding, ... ],");
            println!("  diagnostics: [ SleepDiagnostic, ... ],");
            println!("  avg_sleep_per_night_h, max_sleep_debt_h,");
            println!("  low_count, moderate_count, high_count, critical_count, extreme_count,");
            println!("  worst_duty_id, total_pinch_events");
        }
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum WingwatchCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Analysis(AnalysisError),
    InvalidPreset(String),
    ValidationFailed(String),
    DoctorFailed,
}

impl From<io::Error> for WingwatchCliError {
    fn from(e: io::Error) -> Self {
        WingwatchCliError::Io(e)
    }
}

impl From<serde_json::Error> for WingwatchCliError {
    fn from(e: serde_json::Error) -> Self {
        WingwatchCliError::Json(e)
    }
}

impl From<AnalysisError> for WingwatchCliError {
    fn from(e: AnalysisError) -> Self {
        WingwatchCliError::Analysis(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<WingwatchCliError> for CliError {
    fn from(e: WingwatchCliError) -> Self {
        match e {
            WingwatchCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            WingwatchCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax against `wingwatch schema roster`".to_string()),
            },
            WingwatchCliError::Analysis(e) => CliError {
                code: "ANALYSIS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run `wingwatch validate` for a detailed roster report".to_string()),
            },
            WingwatchCliError::InvalidPreset(name) => CliError {
                code: "INVALID_PRESET".to_string(),
                message: format!("unknown preset: {name}"),
                hint: Some("Use one of: default, conservative, liberal, research".to_string()),
            },
            WingwatchCliError::ValidationFailed(msg) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: msg,
                hint: Some("Fix the roster and retry".to_string()),
            },
            WingwatchCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    valid: bool,
    duty_count: usize,
    message: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
