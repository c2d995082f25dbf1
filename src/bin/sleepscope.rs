//! Sleepscope CLI - Command-line interface for sleep assessments
//!
//! Commands:
//! - assess: Assess a single request record
//! - batch: Assess many records (JSON array or NDJSON)
//! - report: Print the advisory report for one record
//! - bmi: Compute BMI without a model
//! - validate: Validate request records without a model
//! - doctor: Diagnose model and environment
//! - schema: Print the request/response layout

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sleepscope::encoder::BMI_DECIMALS;
use sleepscope::features::FEATURE_NAMES;
use sleepscope::schema::{parse_metrics, RequestAdapter, FORM_RANGES, REQUIRED_FIELDS};
use sleepscope::types::{AssessmentResponse, ErrorResponse, Gender, Occupation};
use sleepscope::units::round_to;
use sleepscope::{
    ComputeError, RiskLevel, ScaledModel, SleepPipeline, UnitConverter, PRODUCER_NAME,
    SLEEPSCOPE_VERSION,
};

/// Sleepscope - Sleep-quality scoring and advisory reports
#[derive(Parser)]
#[command(name = "sleepscope")]
#[command(author = "Synheart AI Inc")]
#[command(version = SLEEPSCOPE_VERSION)]
#[command(about = "Score sleep quality and sleep-disorder risk from health metrics", long_about = None)]
struct Cli {
    /// Log filter (e.g. "debug", "sleepscope=trace"); falls back to RUST_LOG
    #[arg(long, global = true, env = "SLEEPSCOPE_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a single request record
    Assess {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Model artifact path
        #[arg(short, long, env = "SLEEPSCOPE_MODEL")]
        model: PathBuf,

        /// Include the advisory report
        #[arg(long)]
        report: bool,

        /// Pretty-print the response
        #[arg(long)]
        pretty: bool,
    },

    /// Assess many request records
    Batch {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Model artifact path
        #[arg(short, long, env = "SLEEPSCOPE_MODEL")]
        model: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Include the advisory report in each response
        #[arg(long)]
        report: bool,
    },

    /// Print the advisory report for one record as markdown
    Report {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Model artifact path
        #[arg(short, long, env = "SLEEPSCOPE_MODEL")]
        model: PathBuf,
    },

    /// Compute BMI and its category
    Bmi {
        /// Weight in kilograms
        #[arg(long)]
        weight: f64,

        /// Height in centimeters
        #[arg(long)]
        height: f64,
    },

    /// Validate request records without a model
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose model and environment
    Doctor {
        /// Model artifact to check
        #[arg(short, long, env = "SLEEPSCOPE_MODEL")]
        model: Option<PathBuf>,

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
    /// Newline-delimited JSON (one request per line)
    Ndjson,
    /// JSON array of requests
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Request record
    Input,
    /// Response record
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run(cli: Cli) -> Result<(), SleepscopeCliError> {
    match cli.command {
        Commands::Assess {
            input,
            model,
            report,
            pretty,
        } => cmd_assess(&input, &model, report, pretty),

        Commands::Batch {
            input,
            output,
            model,
            input_format,
            output_format,
            report,
        } => cmd_batch(&input, &output, &model, input_format, output_format, report),

        Commands::Report { input, model } => cmd_report(&input, &model),

        Commands::Bmi { weight, height } => cmd_bmi(weight, height),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { model, json } => cmd_doctor(model.as_deref(), json),

        Commands::Schema { schema_type, json_schema } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_assess(input: &Path, model: &Path, report: bool, pretty: bool) -> Result<(), SleepscopeCliError> {
    let pipeline = SleepPipeline::load(model)?;
    let request: Value = serde_json::from_str(&read_input(input)?)?;

    let response = pipeline.assess_request(&request, report)?;

    if pretty {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", serde_json::to_string(&response)?);
    }

    Ok(())
}

fn cmd_batch(
    input: &Path,
    output: &Path,
    model: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    report: bool,
) -> Result<(), SleepscopeCliError> {
    let pipeline = SleepPipeline::load(model)?;
    let requests = read_requests(&read_input(input)?, &input_format)?;

    if requests.is_empty() {
        return Err(SleepscopeCliError::NoRecords);
    }

    let records: Vec<BatchRecord> = pipeline
        .assess_batch(requests, report)
        .into_iter()
        .map(|result| match result {
            Ok(response) => BatchRecord::Response(Box::new(response)),
            Err(e) => BatchRecord::Error(ErrorResponse::from(&e)),
        })
        .collect();

    let failed = records
        .iter()
        .filter(|r| matches!(r, BatchRecord::Error(_)))
        .count();
    info!(total = records.len(), failed, "batch complete");

    let output_data = format_output(&records, &output_format)?;

    if output.to_string_lossy() == "-" {
        let mut stdout = io::stdout();
        write!(stdout, "{}", output_data)?;
        stdout.flush()?;
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_report(input: &Path, model: &Path) -> Result<(), SleepscopeCliError> {
    let pipeline = SleepPipeline::load(model)?;
    let request: Value = serde_json::from_str(&read_input(input)?)?;

    let metrics = parse_metrics(&request)?;
    let assessment = pipeline.assess(&metrics, true)?;

    println!("{}", assessment.risk);
    println!();
    if let Some(report) = assessment.report {
        print!("{}", report);
    }

    Ok(())
}

fn cmd_bmi(weight: f64, height: f64) -> Result<(), SleepscopeCliError> {
    let bmi = UnitConverter::compute_bmi(weight, height)?;

    let output = serde_json::json!({
        "bmi": round_to(bmi.value, BMI_DECIMALS),
        "bmiCategory": bmi.category,
    });
    println!("{}", output);

    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), SleepscopeCliError> {
    let requests = read_requests(&read_input(input)?, &input_format)?;
    let results = RequestAdapter::validate_requests(requests);

    let invalid = results.iter().filter(|r| !r.is_valid()).count();

    let report = ValidationReport {
        total_records: results.len(),
        valid_records: results.len() - invalid,
        invalid_records: invalid,
        records: results
            .iter()
            .filter(|r| !r.is_valid() || !r.warnings.is_empty())
            .map(|r| ValidationDetail {
                index: r.index,
                error: r.error.as_ref().map(|e| e.to_string()),
                warnings: r.warnings.iter().map(|w| w.to_string()).collect(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.records.is_empty() {
            println!("\nFindings:");
            for detail in &report.records {
                if let Some(error) = &detail.error {
                    println!("  - Record {}: [ERR] {}", detail.index, error);
                }
                for warning in &detail.warnings {
                    println!("  - Record {}: [WARN] {}", detail.index, warning);
                }
            }
        }
    }

    if report.invalid_records > 0 {
        Err(SleepscopeCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_doctor(model: Option<&Path>, json: bool) -> Result<(), SleepscopeCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "sleepscope_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Sleepscope version {}", SLEEPSCOPE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "feature_layout".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} features: {}", FEATURE_NAMES.len(), FEATURE_NAMES.join(", ")),
    });

    // Check model artifact
    let model_check = match model {
        None => DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Warning,
            message: "No model artifact given (use --model or SLEEPSCOPE_MODEL)".to_string(),
        },
        Some(path) if !path.exists() => DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Error,
            message: format!("Model artifact {} does not exist", path.display()),
        },
        Some(path) => match ScaledModel::load(path) {
            Ok(model) => DoctorCheck {
                name: "model".to_string(),
                status: CheckStatus::Ok,
                message: format!("Model artifact valid ({} regressor)", model.kind()),
            },
            Err(e) => DoctorCheck {
                name: "model".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        },
    };
    checks.push(model_check);

    // Check stdin is available (for piped input)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (batch input ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: SLEEPSCOPE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Sleepscope Doctor Report");
        println!("========================");
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

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(SleepscopeCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), SleepscopeCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input: one JSON object per request, all fields required");
                println!();
                for range in FORM_RANGES.iter() {
                    println!("- {}: number (expected {}-{})", range.field, range.min, range.max);
                }
                println!("- gender: one of {}", labels(Gender::ALL.iter().map(|g| g.label())));
                println!("- occupation: one of {}", labels(Occupation::ALL.iter().map(|o| o.label())));
                println!();
                println!("Integer fields also accept floats (truncated) and numeric strings.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output: one JSON object per request");
                println!();
                println!("- bmi: BMI rounded to 2 decimals");
                println!("- bmiCategory: Underweight | Normal | Overweight");
                println!("- sleepScore: predicted quality of sleep, rounded to 1 decimal");
                println!("- disorderRisk: one of");
                for risk in [RiskLevel::High, RiskLevel::Moderate, RiskLevel::Low] {
                    println!("    {}", risk.message());
                }
                println!("- report: advisory report markdown (only when requested)");
                println!("- producer: {{ name, version, instanceId }}");
                println!("- computedAtUtc: RFC 3339 timestamp");
                println!();
                println!("Failures are reported as {{ error, code }}.");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, SleepscopeCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_requests(
    input_data: &str,
    input_format: &InputFormat,
) -> Result<Vec<Result<Value, ComputeError>>, SleepscopeCliError> {
    let requests = match input_format {
        InputFormat::Ndjson => RequestAdapter::parse_ndjson(input_data),
        InputFormat::Json => RequestAdapter::parse_array(input_data)?
            .into_iter()
            .map(Ok)
            .collect(),
    };
    Ok(requests)
}

fn format_output(records: &[BatchRecord], format: &OutputFormat) -> Result<String, SleepscopeCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)?),
    }
}

fn labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join(", ")
}

fn get_input_json_schema() -> String {
    let integer = serde_json::json!({ "type": ["integer", "number", "string"] });
    let number = serde_json::json!({ "type": ["number", "string"] });

    let mut properties = serde_json::Map::new();
    for field in REQUIRED_FIELDS {
        let schema = match field {
            "gender" => serde_json::json!({
                "type": "string",
                "enum": Gender::ALL.iter().map(|g| g.label()).collect::<Vec<_>>()
            }),
            "occupation" => serde_json::json!({
                "type": "string",
                "enum": Occupation::ALL.iter().map(|o| o.label()).collect::<Vec<_>>()
            }),
            "sleepDuration" | "weight" | "height" => number.clone(),
            _ => integer.clone(),
        };
        properties.insert(field.to_string(), schema);
    }

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "sleepscope.request",
        "description": "Sleepscope assessment request",
        "type": "object",
        "required": REQUIRED_FIELDS,
        "properties": properties
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "sleepscope.response",
        "description": "Sleepscope assessment response",
        "type": "object",
        "required": ["bmi", "bmiCategory", "sleepScore", "disorderRisk", "producer", "computedAtUtc"],
        "properties": {
            "bmi": { "type": "number" },
            "bmiCategory": { "type": "string", "enum": ["Underweight", "Normal", "Overweight"] },
            "sleepScore": { "type": "number" },
            "disorderRisk": {
                "type": "string",
                "enum": [RiskLevel::High.message(), RiskLevel::Moderate.message(), RiskLevel::Low.message()]
            },
            "report": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instanceId": { "type": "string" }
                }
            },
            "computedAtUtc": { "type": "string", "format": "date-time" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum SleepscopeCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoRecords,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for SleepscopeCliError {
    fn from(e: io::Error) -> Self {
        SleepscopeCliError::Io(e)
    }
}

impl From<ComputeError> for SleepscopeCliError {
    fn from(e: ComputeError) -> Self {
        SleepscopeCliError::Compute(e)
    }
}

impl From<serde_json::Error> for SleepscopeCliError {
    fn from(e: serde_json::Error) -> Self {
        SleepscopeCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SleepscopeCliError> for CliError {
    fn from(e: SleepscopeCliError) -> Self {
        match e {
            SleepscopeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SleepscopeCliError::Compute(e) => {
                let hint = match &e {
                    ComputeError::ModelError(_) => "Run 'sleepscope doctor --model <path>' for details",
                    ComputeError::UnknownCategory { .. } => "Run 'sleepscope schema input' for accepted labels",
                    _ => "Ensure input matches 'sleepscope schema input'",
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            SleepscopeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SleepscopeCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            SleepscopeCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            SleepscopeCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
#[serde(untagged)]
enum BatchRecord {
    Response(Box<AssessmentResponse>),
    Error(ErrorResponse),
}

#[derive(Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    records: Vec<ValidationDetail>,
}

#[derive(Serialize)]
struct ValidationDetail {
    index: usize,
    error: Option<String>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
