//! CLI entry point for the station analyzer.
//!
//! Loads a sensor CSV log, analyzes it and writes the dashboards and report
//! into the output directory.

use anyhow::{Context, Result};
use clap::Parser;
use station_analyzer::pipeline::{self, PipelineOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "station_analyzer.log";

#[derive(Parser)]
#[command(name = "station-analyzer")]
#[command(about = "Analyze environmental monitoring station sensor logs", long_about = None)]
struct Cli {
    /// CSV log with Tempo(ms), Distancia(cm), Luminosidade(IR) and Estado columns
    #[arg(value_name = "INPUT", default_value = "sample_readings.csv")]
    input: PathBuf,

    /// Directory the charts and report are written to
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Analysis failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = PipelineOptions::new(cli.input, cli.output_dir);

    info!(
        input = %options.input.display(),
        output_dir = %options.output_dir.display(),
        "Starting analysis"
    );
    let written = pipeline::run(&options)
        .with_context(|| format!("analyzing {}", options.input.display()))?;
    for path in &written {
        info!(path = %path.display(), "Wrote");
    }
    Ok(())
}

/// Logging setup: colored stderr + JSON daily log file under `logs/`.
///
/// The file layer is left out when the log directory cannot be created, so
/// a read-only working directory does not stop the analysis. The returned
/// guard flushes the file writer on drop.
fn init_logging() -> Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info"));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(LOG_DIR);

    let (json_layer, guard, file_error) = match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(writer)
                .with_filter(env_filter("RUST_LOG_JSON", "debug"));
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    if let Some(e) = file_error {
        warn!(dir = LOG_DIR, error = %e, "JSON log file disabled");
    }
    Ok(guard)
}

fn env_filter(var: &str, default: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}
