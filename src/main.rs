//! HealthTwin: outcome prediction and population risk scoring.
//!
//! Command-line entry point. Results are printed to stdout as JSON; logs go
//! to stderr or a file.
//!
//! # Usage
//!
//! ```bash
//! healthtwin predict <adult|child> <subject-id> [--months N]
//! healthtwin population <adults|children> [--threshold T]
//! ```

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use healthtwin::adapters::sanitize::SanitizingMakeWriter;
use healthtwin::adapters::SqliteRecordSource;
use healthtwin::application::{PopulationService, PredictionService};
use healthtwin::{OutcomePredictor, SubjectKind};

const USAGE: &str = "Usage:
  healthtwin predict <adult|child> <subject-id> [--months N]
  healthtwin population <adults|children> [--threshold T]

Environment:
  HEALTHTWIN_DB         SQLite database path (default: healthtwin.db)
  HEALTHTWIN_LOG_MODE   stderr | file | auto (default: auto)
  HEALTHTWIN_LOG_FILE   log file path (default: healthtwin.log)
  RUST_LOG              log filter (default: info)";

#[derive(Debug, PartialEq)]
enum Command {
    Predict {
        kind: SubjectKind,
        subject_id: String,
        months: Option<u32>,
    },
    Population {
        kind: SubjectKind,
        threshold: Option<f64>,
    },
}

/// Parse command-line arguments; `None` means help was requested.
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<Command>> {
    let mut args = args.into_iter();

    let command = match args.next() {
        Some(c) => c,
        None => bail!("Missing command"),
    };

    match command.as_str() {
        "-h" | "--help" | "help" => Ok(None),
        "predict" => {
            let kind: SubjectKind = args.next().context("Missing subject kind")?.parse()?;
            let subject_id = args.next().context("Missing subject ID")?;
            let mut months = None;

            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--months" => {
                        let v = args.next().context("--months needs a value")?;
                        months = Some(v.parse::<u32>().with_context(|| format!("Invalid month count: {v}"))?);
                    }
                    _ => bail!("Unknown arg: {arg}"),
                }
            }

            Ok(Some(Command::Predict {
                kind,
                subject_id,
                months,
            }))
        }
        "population" => {
            let kind: SubjectKind = args.next().context("Missing subject kind")?.parse()?;
            let mut threshold = None;

            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--threshold" => {
                        let v = args.next().context("--threshold needs a value")?;
                        threshold = Some(v.parse::<f64>().with_context(|| format!("Invalid threshold: {v}"))?);
                    }
                    _ => bail!("Unknown arg: {arg}"),
                }
            }

            Ok(Some(Command::Population { kind, threshold }))
        }
        other => bail!("Unknown command: {other}"),
    }
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // stdout carries the JSON result, so logs never go there.
    // auto: a log file when HEALTHTWIN_LOG_FILE is set or stderr is not a terminal.
    let log_mode = std::env::var("HEALTHTWIN_LOG_MODE").unwrap_or_else(|_| "auto".to_string());
    let log_file = std::env::var("HEALTHTWIN_LOG_FILE").ok();

    let use_file = match log_mode.as_str() {
        "file" => true,
        "stderr" => false,
        _ => log_file.is_some() || !std::io::stderr().is_terminal(),
    };

    let (writer, guard) = if use_file {
        let log_file = log_file.unwrap_or_else(|| "healthtwin.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            // Best-effort: a missing directory surfaces on open below.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Cannot open log file {log_file}"))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    Ok(guard)
}

fn main() -> Result<()> {
    let command = match parse_args(std::env::args().skip(1)) {
        Ok(Some(command)) => command,
        Ok(None) => {
            println!("{USAGE}");
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e:#}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    let _guard = init_logging()?;

    let db_path = std::env::var("HEALTHTWIN_DB").unwrap_or_else(|_| "healthtwin.db".to_string());
    tracing::debug!("Opening record database {}", db_path);
    let source = Arc::new(
        SqliteRecordSource::new(&db_path).with_context(|| format!("Cannot open database {db_path}"))?,
    );
    let predictor = OutcomePredictor::new();

    let output = match command {
        Command::Predict {
            kind,
            subject_id,
            months,
        } => {
            let service = PredictionService::new(predictor, source);
            serde_json::to_string_pretty(&service.predict(&subject_id, kind, months)?)?
        }
        Command::Population { kind, threshold } => {
            let service = PopulationService::new(predictor, source);
            serde_json::to_string_pretty(&service.score(kind, threshold)?)?
        }
    };

    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_predict() {
        let command = parse_args(args("predict child C0012 --months 9")).expect("Should parse");
        assert_eq!(
            command,
            Some(Command::Predict {
                kind: SubjectKind::Child,
                subject_id: "C0012".to_string(),
                months: Some(9),
            })
        );
    }

    #[test]
    fn test_parse_population() {
        let command = parse_args(args("population adults --threshold 0.5")).expect("Should parse");
        assert_eq!(
            command,
            Some(Command::Population {
                kind: SubjectKind::Adult,
                threshold: Some(0.5),
            })
        );
        assert_eq!(parse_args(args("--help")).expect("Should parse"), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(args("")).is_err());
        assert!(parse_args(args("predict elders P001")).is_err());
        assert!(parse_args(args("predict adult")).is_err());
        assert!(parse_args(args("predict adult P001 --months -3")).is_err());
        assert!(parse_args(args("population children --verbose")).is_err());
        assert!(parse_args(args("forecast adult P001")).is_err());
    }
}
