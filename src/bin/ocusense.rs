//! Ocusense CLI - Command-line interface for the Ocusense engine
//!
//! Commands:
//! - replay: Run a recorded frame-sample stream through a full session
//! - schema: Print input/output shapes
//! - doctor: Diagnose engine configuration health

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Duration, Utc};
use ocusense::capability::{AlwaysAvailable, FrameSink};
use ocusense::report::ReportEncoder;
use ocusense::session::SessionController;
use ocusense::types::{DurationPreset, FrameSample};
use ocusense::{DetectorConfig, ENGINE_VERSION, PRODUCER_NAME};

/// Ocusense - on-device detection engine for ocular symptom events
#[derive(Parser)]
#[command(name = "ocusense")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Detect ocular symptom events in frame-sample streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded frame-sample stream through a full exercise session
    Replay {
        /// Input file with NDJSON frame samples (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Exercise duration in seconds (30, 60, or 120)
        #[arg(long, default_value = "30")]
        duration: u32,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Emit accepted events as NDJSON instead of the final report
        #[arg(long)]
        events: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },

    /// Diagnose engine configuration health
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (frame sample NDJSON)
    Input,
    /// Output schema (session report)
    Output,
}

fn main() -> ExitCode {
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

fn run(cli: Cli) -> Result<(), OcusenseCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            duration,
            output_format,
            events,
        } => cmd_replay(&input, &output, duration, output_format, events),

        Commands::Schema { schema_type } => cmd_schema(schema_type),

        Commands::Doctor { json } => cmd_doctor(json),
    }
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    duration: u32,
    output_format: OutputFormat,
    events_only: bool,
) -> Result<(), OcusenseCliError> {
    let preset =
        DurationPreset::try_from_seconds(duration).ok_or(OcusenseCliError::BadDuration(duration))?;

    // Read input
    let input_data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("reading frame samples from stdin (one JSON object per line, ^D to end)");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let samples = parse_samples(&input_data)?;
    if samples.is_empty() {
        return Err(OcusenseCliError::NoSamples);
    }

    let mut controller = SessionController::new(Box::new(AlwaysAvailable));
    controller.configure_duration(preset);

    let started_at = samples[0].timestamp;
    controller
        .start()
        .map_err(|e| OcusenseCliError::Engine(e.to_string()))?;

    // Interleave 1-second countdown ticks with the recorded frames, driven by
    // the sample timestamps.
    let mut next_tick_at = started_at + Duration::seconds(1);
    let mut last_seen = started_at;

    for sample in samples {
        while controller.is_exercise_active() && sample.timestamp >= next_tick_at {
            controller.tick(next_tick_at);
            next_tick_at += Duration::seconds(1);
        }
        last_seen = sample.timestamp;
        controller.on_frame_sample(sample);
    }
    controller.stop(last_seen);

    let output_data = if events_only {
        format_events(&controller)?
    } else {
        format_report(&controller, last_seen, &output_format)?
    };

    if output.to_string_lossy() == "-" {
        print!("{output_data}");
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn parse_samples(input: &str) -> Result<Vec<FrameSample>, OcusenseCliError> {
    let mut samples = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let sample: FrameSample = serde_json::from_str(line).map_err(|e| {
            OcusenseCliError::ParseError(format!("line {}: {}", index + 1, e))
        })?;
        samples.push(sample);
    }
    // Frames must be ingested in arrival order for debouncing to mean anything
    samples.sort_by_key(|s| s.timestamp);
    Ok(samples)
}

/// Accepted events from both logs, chronological, one JSON object per line
fn format_events(controller: &SessionController) -> Result<String, OcusenseCliError> {
    let mut events: Vec<_> = controller
        .blink_log()
        .iter()
        .chain(controller.twitch_log().iter())
        .cloned()
        .collect();
    events.sort_by_key(|e| e.timestamp);

    let mut out = String::new();
    for event in events {
        out.push_str(&serde_json::to_string(&event)?);
        out.push('\n');
    }
    Ok(out)
}

fn format_report(
    controller: &SessionController,
    now: DateTime<Utc>,
    format: &OutputFormat,
) -> Result<String, OcusenseCliError> {
    let encoder = ReportEncoder::new();
    let report = encoder.encode(controller, now);
    let json = match format {
        OutputFormat::Json => serde_json::to_string(&report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
    };
    Ok(json + "\n")
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), OcusenseCliError> {
    let schema = match schema_type {
        SchemaType::Input => serde_json::json!({
            "description": "NDJSON stream, one frame sample per line",
            "example": {
                "timestamp": "2025-03-01T09:00:00Z",
                "left_eye_blink": 0.55,
                "right_eye_blink": 0.62,
                "brow_inner_up": 0.1,
                "brow_outer_up_left": 0.05,
                "brow_outer_up_right": 0.07,
                "eye_squint_left": 0.2,
                "eye_squint_right": 0.18
            },
            "notes": "all intensity fields are optional floats in [0,1]"
        }),
        SchemaType::Output => serde_json::json!({
            "description": "Session report payload",
            "required": ["report_version", "producer", "generated_at_utc",
                         "snapshot", "blink_log", "twitch_log", "sessions"],
            "properties": {
                "report_version": { "type": "string" },
                "producer": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "version": { "type": "string" },
                        "instance_id": { "type": "string" }
                    }
                },
                "snapshot": { "type": "object" },
                "blink_log": { "type": "array", "items": { "type": "object" } },
                "twitch_log": { "type": "array", "items": { "type": "object" } },
                "sessions": { "type": "array", "items": { "type": "object" } }
            }
        }),
    };

    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn cmd_doctor(json: bool) -> Result<(), OcusenseCliError> {
    let config = DetectorConfig::default();
    let mut checks = Vec::new();

    let threshold_ok = (0.0..=1.0).contains(&config.blink_threshold)
        && (0.0..=1.0).contains(&config.twitch_threshold)
        && (0.0..=1.0).contains(&config.strain_threshold);
    checks.push(DoctorCheck {
        name: "thresholds".to_string(),
        status: if threshold_ok { CheckStatus::Ok } else { CheckStatus::Error },
        message: format!(
            "blink {} / twitch {} / strain {}",
            config.blink_threshold, config.twitch_threshold, config.strain_threshold
        ),
    });

    let debounce_ok = config.blink_debounce_ms > 0 && config.twitch_debounce_ms > 0;
    checks.push(DoctorCheck {
        name: "debounce".to_string(),
        status: if debounce_ok { CheckStatus::Ok } else { CheckStatus::Error },
        message: format!(
            "blink {}ms / twitch {}ms",
            config.blink_debounce_ms, config.twitch_debounce_ms
        ),
    });

    checks.push(DoctorCheck {
        name: "log_capacity".to_string(),
        status: if config.log_capacity > 0 { CheckStatus::Ok } else { CheckStatus::Error },
        message: format!("{} entries per symptom log", config.log_capacity),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    let failed = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} {}", report.producer, report.version);
        for check in &report.checks {
            let status = match check.status {
                CheckStatus::Ok => "ok",
                CheckStatus::Error => "error",
            };
            println!("  [{status}] {}: {}", check.name, check.message);
        }
    }

    if failed {
        return Err(OcusenseCliError::DoctorFailed);
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum OcusenseCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Engine(String),
    ParseError(String),
    BadDuration(u32),
    NoSamples,
    DoctorFailed,
}

impl From<io::Error> for OcusenseCliError {
    fn from(e: io::Error) -> Self {
        OcusenseCliError::Io(e)
    }
}

impl From<serde_json::Error> for OcusenseCliError {
    fn from(e: serde_json::Error) -> Self {
        OcusenseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<OcusenseCliError> for CliError {
    fn from(e: OcusenseCliError) -> Self {
        match e {
            OcusenseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            OcusenseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            OcusenseCliError::Engine(msg) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: msg,
                hint: None,
            },
            OcusenseCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'ocusense schema input' for the expected shape".to_string()),
            },
            OcusenseCliError::BadDuration(seconds) => CliError {
                code: "BAD_DURATION".to_string(),
                message: format!("unsupported exercise duration: {seconds} seconds"),
                hint: Some("Supported durations: 30, 60, 120".to_string()),
            },
            OcusenseCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "No frame samples found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            OcusenseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

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
    Error,
}
