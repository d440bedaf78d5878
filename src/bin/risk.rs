//! Risk CLI - Command-line interface for Synheart Risk
//!
//! Commands:
//! - evaluate: Evaluate one member's samples and print the risk event
//! - validate: Validate sample records
//! - demo: Generate synthetic samples for a health pattern
//! - doctor: Diagnose engine configuration
//! - schema: Describe the input and output records

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use synheart_risk::synthetic::{self, HealthPattern};
use synheart_risk::types::{RiskEvent, Sample};
use synheart_risk::{EngineConfig, InMemorySampleSource, RiskEngine, RiskError};
use synheart_risk::{PRODUCER_NAME, RISK_VERSION};

/// Risk - Rule-based wellness risk detection over wearable signals
#[derive(Parser)]
#[command(name = "risk")]
#[command(author = "Synheart AI Inc")]
#[command(version = RISK_VERSION)]
#[command(about = "Detect wellness risk from wearable samples", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a member and print the risk event
    Evaluate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Member to evaluate
        #[arg(short, long)]
        member: String,

        /// Organization the member belongs to
        #[arg(short, long)]
        org: String,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,

        /// Evaluation time (RFC 3339), defaults to now
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override lookback window in days
        #[arg(long)]
        lookback_days: Option<i64>,

        /// Override recent window size in samples
        #[arg(long)]
        recent_window: Option<usize>,
    },

    /// Validate sample records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate synthetic samples (NDJSON on stdout)
    Demo {
        /// Health pattern to simulate
        #[arg(short, long, value_enum)]
        pattern: PatternArg,

        /// Member identifier stamped on samples
        #[arg(short, long, default_value = "demo-member")]
        member: String,

        /// Number of days to generate
        #[arg(long, default_value = "30")]
        days: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// End of the generated range (RFC 3339), defaults to now
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },

    /// Diagnose engine configuration
    Doctor {
        /// Check configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one sample per line)
    Ndjson,
    /// JSON array of samples
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum PatternArg {
    Healthy,
    DecliningVariability,
    PoorSleep,
    LowActivity,
    MixedConcerns,
}

impl From<PatternArg> for HealthPattern {
    fn from(p: PatternArg) -> Self {
        match p {
            PatternArg::Healthy => HealthPattern::Healthy,
            PatternArg::DecliningVariability => HealthPattern::DecliningVariability,
            PatternArg::PoorSleep => HealthPattern::PoorSleep,
            PatternArg::LowActivity => HealthPattern::LowActivity,
            PatternArg::MixedConcerns => HealthPattern::MixedConcerns,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (sample record)
    Input,
    /// Output schema (risk event)
    Output,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), RiskCliError> {
    match cli.command {
        Commands::Evaluate {
            input,
            member,
            org,
            input_format,
            output_format,
            now,
            config,
            lookback_days,
            recent_window,
        } => {
            let config = load_config(config.as_deref(), lookback_days, recent_window)?;
            cmd_evaluate(
                &input,
                &member,
                &org,
                input_format,
                output_format,
                now.unwrap_or_else(Utc::now),
                config,
            )
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Demo {
            pattern,
            member,
            days,
            seed,
            end,
        } => cmd_demo(pattern.into(), &member, days, seed, end.unwrap_or_else(Utc::now)),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_evaluate(
    input: &Path,
    member: &str,
    org: &str,
    input_format: InputFormat,
    output_format: OutputFormat,
    now: DateTime<Utc>,
    config: EngineConfig,
) -> Result<(), RiskCliError> {
    let samples = read_samples(input, &input_format)?;
    if samples.is_empty() {
        return Err(RiskCliError::NoSamples);
    }

    let store = InMemorySampleSource::from_samples(samples)
        .with_limit(config.max_samples_per_fetch);
    let engine = RiskEngine::with_config(store, config)?;
    let event = engine.evaluate_at(member, org, now)?;

    println!("{}", format_output(member, event.as_ref(), &output_format)?);
    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), RiskCliError> {
    let samples = read_samples(input, &input_format)?;

    let errors: Vec<ValidationErrorDetail> = samples
        .iter()
        .enumerate()
        .filter_map(|(index, sample)| {
            sample.validate().err().map(|error| ValidationErrorDetail {
                index,
                sample_id: sample.id.clone(),
                error: error.to_string(),
            })
        })
        .collect();

    let report = ValidationReport {
        total_samples: samples.len(),
        valid_samples: samples.len() - errors.len(),
        invalid_samples: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total samples:   {}", report.total_samples);
        println!("Valid samples:   {}", report.valid_samples);
        println!("Invalid samples: {}", report.invalid_samples);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Sample {} (index {}): {}", err.sample_id, err.index, err.error);
            }
        }
    }

    if report.invalid_samples > 0 {
        Err(RiskCliError::ValidationFailed(report.invalid_samples))
    } else {
        Ok(())
    }
}

fn cmd_demo(
    pattern: HealthPattern,
    member: &str,
    days: usize,
    seed: u64,
    end: DateTime<Utc>,
) -> Result<(), RiskCliError> {
    let samples = synthetic::generate(member, pattern, end, days, seed);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for sample in &samples {
        writeln!(out, "{}", serde_json::to_string(sample)?)?;
    }
    out.flush()?;

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), RiskCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "risk_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Risk version {}", RISK_VERSION),
    });

    match config {
        Some(path) if !path.exists() => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Config file does not exist".to_string(),
        }),
        Some(path) => match load_config(Some(path), None, None) {
            Ok(config) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Config valid (lookback {} days, recent window {} samples)",
                    config.lookback_days, config.recent_window_samples
                ),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: CliError::from(e).message,
            }),
        },
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using default policy".to_string(),
        }),
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: RISK_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Risk Doctor Report");
        println!("==================");
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
        Err(RiskCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), RiskCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input: sample record (one per line for NDJSON)");
                println!();
                println!("- id: Sample identifier");
                println!("- member_id: Member the reading belongs to");
                println!("- type: Signal type (hrv, sleep_efficiency, steps, heart_rate, ...)");
                println!("- value_num: Numeric reading (optional)");
                println!("- value_json: Structured reading (optional)");
                println!("- unit, source, device_account_id: Provenance (optional)");
                println!("- timestamp: Measurement time (RFC 3339)");
                println!("- ingested_at: Recording time (RFC 3339, optional)");
                println!();
                println!("Analyzed signals: hrv, sleep_efficiency, steps");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output: risk event");
                println!();
                println!("- id, member_id, org_id");
                println!("- tier: normal | elevated | critical");
                println!("- score: Composite score (0-100)");
                println!("- factors: Array of {{ type, window_days, delta, threshold, actual_value, baseline_value, severity }}");
                println!("- explanation_text: Human-readable summary");
                println!("- suggested_actions: Ordered caregiver actions");
                println!("- status: new | acknowledged | in_progress | resolved | dismissed");
                println!("- detected_at, acknowledged_at, resolved_at");
                println!("- metadata: {{ engine_version, lookback_days }}");
                println!();
                println!("When no factor is detected: {{ \"member_id\": ..., \"risk\": null }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, RiskCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_samples(input: &Path, format: &InputFormat) -> Result<Vec<Sample>, RiskCliError> {
    let data = read_input(input)?;
    let samples = match format {
        InputFormat::Ndjson => InMemorySampleSource::parse_ndjson(&data)?,
        InputFormat::Json => InMemorySampleSource::parse_array(&data)?,
    };
    Ok(samples)
}

fn load_config(
    path: Option<&Path>,
    lookback_days: Option<i64>,
    recent_window: Option<usize>,
) -> Result<EngineConfig, RiskCliError> {
    let mut config = match path {
        Some(path) => EngineConfig::from_json(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };

    if let Some(days) = lookback_days {
        config.lookback_days = days;
    }
    if let Some(window) = recent_window {
        config.recent_window_samples = window;
    }

    config.validate()?;
    Ok(config)
}

fn format_output(
    member: &str,
    event: Option<&RiskEvent>,
    format: &OutputFormat,
) -> Result<String, RiskCliError> {
    let value = match event {
        Some(event) => serde_json::to_value(event)?,
        None => serde_json::json!({ "member_id": member, "risk": null }),
    };

    match format {
        OutputFormat::Json => Ok(serde_json::to_string(&value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(&value)?),
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/risk.sample.v1.json",
        "title": "risk.sample.v1",
        "description": "Synheart Risk wearable sample",
        "type": "object",
        "required": ["member_id", "type", "timestamp"],
        "properties": {
            "id": { "type": "string" },
            "member_id": { "type": "string" },
            "type": { "type": "string" },
            "value_num": { "type": ["number", "null"] },
            "value_json": {},
            "unit": { "type": ["string", "null"] },
            "source": { "type": "string" },
            "device_account_id": { "type": ["string", "null"] },
            "timestamp": { "type": "string", "format": "date-time" },
            "ingested_at": { "type": "string", "format": "date-time" }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/risk.event.v1.json",
        "title": "risk.event.v1",
        "description": "Synheart Risk event",
        "type": "object",
        "required": [
            "id", "member_id", "org_id", "tier", "score", "factors",
            "explanation_text", "suggested_actions", "status", "detected_at"
        ],
        "properties": {
            "id": { "type": "string" },
            "member_id": { "type": "string" },
            "org_id": { "type": "string" },
            "tier": { "type": "string", "enum": ["normal", "elevated", "critical"] },
            "score": { "type": "number", "minimum": 0, "maximum": 100 },
            "factors": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["type"],
                    "properties": {
                        "type": { "type": "string" },
                        "window_days": { "type": "integer" },
                        "delta": { "type": "number" },
                        "threshold": { "type": "number" },
                        "actual_value": { "type": "number" },
                        "baseline_value": { "type": "number" },
                        "severity": { "type": "number", "minimum": 0, "maximum": 1 }
                    }
                }
            },
            "explanation_text": { "type": "string" },
            "suggested_actions": { "type": "array", "items": { "type": "string" } },
            "status": {
                "type": "string",
                "enum": ["new", "acknowledged", "in_progress", "resolved", "dismissed"]
            },
            "assignee_id": { "type": "string" },
            "caregiver_notes": { "type": "string" },
            "detected_at": { "type": "string", "format": "date-time" },
            "acknowledged_at": { "type": "string", "format": "date-time" },
            "resolved_at": { "type": "string", "format": "date-time" },
            "metadata": { "type": "object" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum RiskCliError {
    Io(io::Error),
    Engine(RiskError),
    Json(serde_json::Error),
    NoSamples,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for RiskCliError {
    fn from(e: io::Error) -> Self {
        RiskCliError::Io(e)
    }
}

impl From<RiskError> for RiskCliError {
    fn from(e: RiskError) -> Self {
        RiskCliError::Engine(e)
    }
}

impl From<serde_json::Error> for RiskCliError {
    fn from(e: serde_json::Error) -> Self {
        RiskCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RiskCliError> for CliError {
    fn from(e: RiskCliError) -> Self {
        match e {
            RiskCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RiskCliError::Engine(e) => {
                let (code, hint) = match &e {
                    RiskError::Config(_) => ("CONFIG_ERROR", "Run 'risk doctor --config <file>'"),
                    RiskError::Fetch { .. } => ("FETCH_ERROR", "Check the sample source"),
                    RiskError::Json(_) | RiskError::Parse(_) => {
                        ("PARSE_ERROR", "Run 'risk schema input' for the expected format")
                    }
                    RiskError::InvalidSample(_) => {
                        ("VALIDATION_ERROR", "Run 'risk validate' for details")
                    }
                    RiskError::InvalidTransition { .. } => {
                        ("WORKFLOW_ERROR", "Check the event's current status")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            RiskCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            RiskCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "No samples found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            RiskCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} samples failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            RiskCliError::DoctorFailed => CliError {
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
    total_samples: usize,
    valid_samples: usize,
    invalid_samples: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    sample_id: String,
    error: String,
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
