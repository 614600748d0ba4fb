use std::path::PathBuf;
use tracing::info;

use crate::analyzers::analyzer::analyze;
use crate::config::RenderConfig;
use crate::error::{AnalysisError, Result};
use crate::loader::load_dataset;
use crate::output::{ANNOTATED_FILE, print_json, print_pretty, write_annotated};
use crate::render::dashboard::render_dashboard;
use crate::render::interactive::render_interactive;
use crate::render::{DASHBOARD_FILE, INTERACTIVE_FILE};
use crate::report::{REPORT_FILE, write_report};

/// Inputs for one analysis run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub config: RenderConfig,
    /// Also write `annotated_readings.csv`.
    pub annotated: bool,
    /// Log the full analysis as JSON.
    pub json: bool,
}

impl PipelineOptions {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        PipelineOptions {
            input: input.into(),
            output_dir: output_dir.into(),
            config: RenderConfig::default(),
            annotated: false,
            json: false,
        }
    }
}

/// Loads, analyzes and writes every output file, in order. Returns the
/// written paths.
///
/// The output directory is only created once the input loaded cleanly, so
/// a rejected input leaves nothing behind.
#[tracing::instrument(skip_all, fields(input = %options.input.display()))]
pub fn run(options: &PipelineOptions) -> Result<Vec<PathBuf>> {
    options.config.validate()?;
    let dataset = load_dataset(&options.input)?;
    let analysis = analyze(&dataset);

    print_pretty(&analysis);
    if options.json {
        print_json(&analysis)?;
    }

    let dir = &options.output_dir;
    std::fs::create_dir_all(dir).map_err(|e| AnalysisError::write(dir, e))?;

    let mut written = Vec::new();

    let path = dir.join(DASHBOARD_FILE);
    render_dashboard(&dataset, &analysis, &options.config, &path)?;
    written.push(path);

    let path = dir.join(INTERACTIVE_FILE);
    render_interactive(&dataset, &options.config, &path)?;
    written.push(path);

    let path = dir.join(REPORT_FILE);
    write_report(&path, &analysis)?;
    written.push(path);

    if options.annotated {
        let path = dir.join(ANNOTATED_FILE);
        write_annotated(&path, &dataset)?;
        written.push(path);
    }

    info!(files = written.len(), dir = %dir.display(), "Analysis complete");
    Ok(written)
}
