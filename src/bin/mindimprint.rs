//! MindImprint CLI - Command-line interface for the scoring engine
//!
//! Commands:
//! - score: Score session telemetry into assessment reports (batch mode)
//! - screen: Quick behavioral screen over wait-game telemetry
//! - validate: Validate session telemetry and report data quality
//! - schema: Print input/output schema examples

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mindimprint_engine::normalizer::TelemetryNormalizer;
use mindimprint_engine::pipeline::parse_session;
use mindimprint_engine::screen::QuickScreen;
use mindimprint_engine::{ScoringError, ScoringProcessor, ENGINE_VERSION};

/// MindImprint - deterministic scoring for cognitive-assessment game telemetry
#[derive(Parser)]
#[command(name = "mindimprint")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score assessment game telemetry into cognitive profile reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score session telemetry into assessment reports (batch mode)
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Load narrative cache from file
        #[arg(long)]
        load_cache: Option<PathBuf>,

        /// Save narrative cache to file after processing
        #[arg(long)]
        save_cache: Option<PathBuf>,
    },

    /// Quick behavioral screen over wait-game telemetry
    Screen {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Validate session telemetry and report data quality
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Single session JSON document
    Json,
    /// Newline-delimited JSON (one session per line)
    Ndjson,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one report per line)
    Ndjson,
    /// JSON array of reports
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaType {
    /// Input schema (session telemetry)
    Input,
    /// Output schema (assessment payload)
    Output,
}

#[derive(Serialize)]
struct CliError {
    error: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let report = CliError {
                error: e.to_string(),
            };
            eprintln!(
                "{}",
                serde_json::to_string(&report).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ScoringError> {
    match cli.command {
        Commands::Score {
            input,
            output,
            input_format,
            output_format,
            load_cache,
            save_cache,
        } => cmd_score(
            &input,
            &output,
            input_format,
            output_format,
            load_cache.as_deref(),
            save_cache.as_deref(),
        ),
        Commands::Screen { input } => cmd_screen(&input),
        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
        Commands::Schema { schema_type } => {
            cmd_schema(schema_type);
            Ok(())
        }
    }
}

fn read_input(path: &Path) -> Result<String, ScoringError> {
    if path == Path::new("-") {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("Reading session telemetry from stdin (end with Ctrl-D)...");
        }
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| ScoringError::ParseError(format!("Failed to read stdin: {}", e)))?;
        Ok(buffer)
    } else {
        fs::read_to_string(path).map_err(|e| {
            ScoringError::ParseError(format!("Failed to read {}: {}", path.display(), e))
        })
    }
}

fn write_output(path: &Path, content: &str) -> Result<(), ScoringError> {
    if path == Path::new("-") {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(content.as_bytes())
            .and_then(|_| stdout.write_all(b"\n"))
            .map_err(|e| ScoringError::EncodingError(format!("Failed to write stdout: {}", e)))
    } else {
        fs::write(path, content).map_err(|e| {
            ScoringError::EncodingError(format!("Failed to write {}: {}", path.display(), e))
        })
    }
}

fn split_documents(raw: &str, format: InputFormat) -> Vec<String> {
    match format {
        InputFormat::Json => vec![raw.trim().to_string()],
        InputFormat::Ndjson => raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

fn cmd_score(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    load_cache: Option<&Path>,
    save_cache: Option<&Path>,
) -> Result<(), ScoringError> {
    let mut processor = ScoringProcessor::new();

    if let Some(cache_path) = load_cache {
        let cache_json = fs::read_to_string(cache_path).map_err(|e| {
            ScoringError::ParseError(format!("Failed to read {}: {}", cache_path.display(), e))
        })?;
        processor.load_narrative_cache(&cache_json)?;
    }

    let raw = read_input(input)?;
    let mut reports = Vec::new();
    for document in split_documents(&raw, input_format) {
        reports.push(processor.process(&document)?);
    }

    let rendered = match output_format {
        OutputFormat::Ndjson => {
            let compact: Result<Vec<String>, ScoringError> = reports
                .iter()
                .map(|r| {
                    let value: serde_json::Value = serde_json::from_str(r)?;
                    serde_json::to_string(&value).map_err(ScoringError::JsonError)
                })
                .collect();
            compact?.join("\n")
        }
        OutputFormat::Json => {
            let values: Result<Vec<serde_json::Value>, _> =
                reports.iter().map(|r| serde_json::from_str(r)).collect();
            serde_json::to_string(&values?)?
        }
        OutputFormat::JsonPretty => {
            if reports.len() == 1 {
                reports.into_iter().next().unwrap_or_default()
            } else {
                let values: Result<Vec<serde_json::Value>, _> =
                    reports.iter().map(|r| serde_json::from_str(r)).collect();
                serde_json::to_string_pretty(&values?)?
            }
        }
    };

    write_output(output, &rendered)?;

    if let Some(cache_path) = save_cache {
        let cache_json = processor.save_narrative_cache()?;
        fs::write(cache_path, cache_json).map_err(|e| {
            ScoringError::EncodingError(format!("Failed to write {}: {}", cache_path.display(), e))
        })?;
    }

    Ok(())
}

fn cmd_screen(input: &Path) -> Result<(), ScoringError> {
    let raw = read_input(input)?;
    let session = parse_session(&raw)?;
    let screen = QuickScreen::from_wait_game(&session.wait_game);
    let json = serde_json::to_string_pretty(&screen)?;
    write_output(Path::new("-"), &json)
}

#[derive(Serialize)]
struct ValidationReport {
    total: usize,
    valid: usize,
    invalid: usize,
    sessions: Vec<SessionValidation>,
}

#[derive(Serialize)]
struct SessionValidation {
    line: usize,
    session_id: Option<String>,
    coverage: Option<f64>,
    quality_flags: Vec<String>,
    error: Option<String>,
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), ScoringError> {
    let raw = read_input(input)?;
    let documents = split_documents(&raw, input_format);

    let mut report = ValidationReport {
        total: documents.len(),
        valid: 0,
        invalid: 0,
        sessions: Vec::new(),
    };

    for (index, document) in documents.iter().enumerate() {
        match parse_session(document) {
            Ok(session) => {
                let session_id = session.session_id.clone();
                let normalized = TelemetryNormalizer::normalize(session);
                report.valid += 1;
                report.sessions.push(SessionValidation {
                    line: index + 1,
                    session_id: Some(session_id),
                    coverage: Some(normalized.coverage),
                    quality_flags: normalized
                        .quality_flags
                        .iter()
                        .map(|f| format!("{f:?}"))
                        .collect(),
                    error: None,
                });
            }
            Err(e) => {
                report.invalid += 1;
                report.sessions.push(SessionValidation {
                    line: index + 1,
                    session_id: None,
                    coverage: None,
                    quality_flags: Vec::new(),
                    error: Some(e.to_string()),
                });
            }
        }
    }

    if json {
        write_output(Path::new("-"), &serde_json::to_string_pretty(&report)?)?;
    } else {
        println!(
            "Sessions: {} total, {} valid, {} invalid",
            report.total, report.valid, report.invalid
        );
        for session in &report.sessions {
            match (&session.session_id, &session.error) {
                (Some(id), _) => println!(
                    "  line {}: {} (coverage {:.2}{})",
                    session.line,
                    id,
                    session.coverage.unwrap_or(0.0),
                    if session.quality_flags.is_empty() {
                        String::new()
                    } else {
                        format!(", flags: {}", session.quality_flags.join(", "))
                    }
                ),
                (None, Some(error)) => println!("  line {}: INVALID - {}", session.line, error),
                (None, None) => {}
            }
        }
    }

    if report.invalid > 0 {
        return Err(ScoringError::InvalidSession(format!(
            "{} of {} sessions failed to parse",
            report.invalid, report.total
        )));
    }

    Ok(())
}

fn cmd_schema(schema_type: SchemaType) {
    match schema_type {
        SchemaType::Input => {
            println!(
                r#"{{
  "session_id": "sess-123",
  "age_group": 7,
  "session_start": "2024-03-10T09:00:00Z",
  "session_end": "2024-03-10T09:12:00Z",
  "total_duration_seconds": 720,
  "wait_for_your_turn": {{
    "total_trials": 20,
    "premature_taps": 3,
    "avg_reaction": 410.5,
    "reaction_variability": 95.0
  }},
  "story_reading": {{
    "skip_rate": 0.2,
    "pages_read": 3
  }},
  "step_builder": {{
    "order_errors": 1,
    "task_completed": true,
    "steps_skipped": 0
  }}
}}"#
            );
        }
        SchemaType::Output => {
            println!(
                r#"{{
  "report_version": "1.0.0",
  "producer": {{ "name": "...", "version": "...", "instance_id": "..." }},
  "provenance": {{ "session_id": "...", "observed_at_utc": "...", "computed_at_utc": "..." }},
  "quality": {{ "coverage": 1.0, "confidence": 1.0, "flags": [] }},
  "cognitive_profile": {{
    "impulsivity": {{ "score": 0.0, "level": "Low", "conclusion": "...", "evidence": [] }},
    "attention": {{ "score": 0.0, "level": "Low", "conclusion": "...", "evidence": [] }},
    "memory_organization": {{ "score": 0.0, "level": "Low", "conclusion": "...", "evidence": [] }}
  }},
  "overall_score": 0.0,
  "overall_level": "Low",
  "recommendation": "...",
  "ml_prediction": {{ "profile": "...", "confidence": 0.0, "probabilities": {{}}, "risk_level": "..." }}
}}"#
            );
        }
    }
}
