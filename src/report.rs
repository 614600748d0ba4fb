//! Markdown analysis report.
//!
//! Each section is present only when its input is non-empty. Numbers use
//! fixed precision: distances 1 decimal, reflectance 0, percentages 1,
//! durations 2, correlation 3.

use std::fmt::Write;
use std::path::Path;
use tracing::info;

use crate::analyzers::types::{Analysis, CategoryCount, TransitionSummary};
use crate::error::{AnalysisError, Result};
use crate::reading::{MAX_REFLECTANCE, OUT_OF_RANGE_CM};

pub const REPORT_FILE: &str = "environmental_report.md";

/// Transition runs listed in the run table before it is truncated.
const MAX_RUN_ROWS: usize = 50;

/// Renders `analysis` as a Markdown document.
pub fn render_report(analysis: &Analysis) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_report_into(&mut out, analysis);
    out
}

fn write_report_into(out: &mut String, analysis: &Analysis) -> std::fmt::Result {
    let summary = &analysis.summary;

    writeln!(out, "# Environmental Monitoring Station - Analysis Report")?;
    writeln!(out)?;
    writeln!(out, "## Report Summary")?;
    writeln!(
        out,
        "- **Analysis Date**: {}",
        analysis.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out, "- **Data Source**: {}", analysis.source)?;
    writeln!(out, "- **Total Records**: {}", summary.records)?;
    writeln!(out, "- **Observation Span**: {:.1} seconds", summary.span_secs)?;
    match summary.sampling_rate_hz {
        Some(hz) => writeln!(out, "- **Sampling Rate**: {hz:.2} Hz")?,
        None => writeln!(out, "- **Sampling Rate**: n/a")?,
    }
    if let Some(max) = summary.max_distance_cm {
        writeln!(
            out,
            "- **Measurement Range**: Distance: 0-{max:.1}cm, Reflectance: 0-{MAX_REFLECTANCE}"
        )?;
    }

    if !analysis.states.is_empty() {
        writeln!(out)?;
        writeln!(out, "## State Analysis")?;
        writeln!(out)?;
        for s in &analysis.states {
            writeln!(
                out,
                "- **{}**: {} records ({:.1}%)",
                s.state, s.count, s.percent
            )?;
        }
    }

    if let Some(d) = &analysis.distance {
        writeln!(out)?;
        writeln!(out, "## Distance Analysis")?;
        writeln!(out)?;
        writeln!(out, "### Statistical Summary")?;
        writeln!(out, "- **Valid Measurements**: {}", d.valid_count)?;
        writeln!(out, "- **Out of Range**: {}", d.out_of_range_count)?;
        writeln!(out, "- **Mean Distance**: {:.1} cm", d.stats.mean)?;
        writeln!(out, "- **Median Distance**: {:.1} cm", d.stats.median)?;
        writeln!(out, "- **Standard Deviation**: {:.1} cm", d.stats.std_dev)?;
        writeln!(
            out,
            "- **Measurement Range**: {:.1} to {:.1} cm",
            d.stats.min, d.stats.max
        )?;
        writeln!(out)?;
        writeln!(out, "### Distance Categories")?;
        write_categories(out, &d.categories, "measurements")?;
    }

    if let Some(r) = &analysis.reflectance {
        writeln!(out)?;
        writeln!(out, "## Reflectance Analysis")?;
        writeln!(out)?;
        writeln!(out, "### Statistical Summary")?;
        writeln!(out, "- **Mean Reflectance**: {:.0}", r.stats.mean)?;
        writeln!(out, "- **Median Reflectance**: {:.0}", r.stats.median)?;
        writeln!(out, "- **Standard Deviation**: {:.0}", r.stats.std_dev)?;
        writeln!(
            out,
            "- **Dynamic Range**: {:.0} to {:.0}",
            r.stats.min, r.stats.max
        )?;
        if let Some(c) = &r.correlation {
            writeln!(
                out,
                "- **Distance Correlation**: {:.3} ({}, {} samples)",
                c.coefficient,
                c.strength.label(),
                c.samples
            )?;
        }
        writeln!(out)?;
        writeln!(out, "### Reflectance Categories")?;
        write_categories(out, &r.categories, "readings")?;
    }

    if analysis.transitions.has_transitions() {
        writeln!(out)?;
        write_transitions(out, &analysis.transitions)?;
    }

    writeln!(out)?;
    writeln!(out, "## Notes")?;
    writeln!(
        out,
        "- Wall-clock times are approximate: they are the load time plus each reading's offset."
    )?;
    writeln!(
        out,
        "- Distances of {OUT_OF_RANGE_CM:.0} cm or more mean the sensor reported out-of-range and are excluded from distance statistics."
    )?;
    writeln!(out)?;
    writeln!(out, "---")?;
    writeln!(out, "*Report generated by station-analyzer*")?;
    Ok(())
}

fn write_categories(out: &mut String, categories: &[CategoryCount], unit: &str) -> std::fmt::Result {
    for c in categories {
        writeln!(
            out,
            "- **{}**: {} {unit} ({:.1}%)",
            c.label, c.count, c.percent
        )?;
    }
    Ok(())
}

fn write_transitions(out: &mut String, t: &TransitionSummary) -> std::fmt::Result {
    writeln!(out, "## State Transitions")?;
    writeln!(out)?;
    writeln!(out, "- **Runs**: {}", t.runs.len())?;
    writeln!(out, "- **Transitions**: {}", t.transitions())?;
    writeln!(out)?;
    writeln!(out, "### Average Duration")?;
    for d in &t.durations {
        writeln!(
            out,
            "- **{}**: {:.2} s over {} runs",
            d.state, d.mean_secs, d.runs
        )?;
    }
    writeln!(out)?;
    writeln!(out, "### Runs")?;
    writeln!(out)?;
    writeln!(out, "| # | State | Start (s) | Duration (s) | Readings |")?;
    writeln!(out, "|---|-------|-----------|--------------|----------|")?;
    for (i, run) in t.runs.iter().enumerate().take(MAX_RUN_ROWS) {
        writeln!(
            out,
            "| {} | {} | {:.2} | {:.2} | {} |",
            i + 1,
            run.state,
            run.start_ms as f64 / 1000.0,
            run.duration_secs(),
            run.len
        )?;
    }
    if t.runs.len() > MAX_RUN_ROWS {
        writeln!(out)?;
        writeln!(out, "*{} more runs omitted*", t.runs.len() - MAX_RUN_ROWS)?;
    }
    Ok(())
}

/// Writes the report to `path`, replacing any previous file.
pub fn write_report(path: &Path, analysis: &Analysis) -> Result<()> {
    std::fs::write(path, render_report(analysis)).map_err(|e| AnalysisError::write(path, e))?;
    info!(path = %path.display(), "Report saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::analyze;
    use crate::reading::{Dataset, Reading};
    use chrono::Utc;

    fn analysis(rows: Vec<Reading>) -> Analysis {
        analyze(&Dataset::new("station.csv", Utc::now(), rows))
    }

    #[test]
    fn test_full_report_sections() {
        let a = analysis(vec![
            Reading::new(0, 40.0, 300, "NORMAL"),
            Reading::new(1000, 20.0, 600, "OBJECT_DETECTED"),
            Reading::new(2000, 8.0, 900, "ALERT_CLOSE"),
            Reading::new(3000, 999.0, 100, "NORMAL"),
        ]);
        let md = render_report(&a);
        for heading in [
            "## Report Summary",
            "## State Analysis",
            "## Distance Analysis",
            "## Reflectance Analysis",
            "## State Transitions",
            "## Notes",
        ] {
            assert!(md.contains(heading), "missing {heading}");
        }
        assert!(md.contains("- **Total Records**: 4"));
        assert!(md.contains("- **Mean Distance**: 22.7 cm"));
        assert!(md.contains("- **NORMAL**: 2 records (50.0%)"));
        assert!(md.contains("- **Ideal (10-30cm)**: 1 measurements (33.3%)"));
        assert!(md.contains("- **Transitions**: 3"));
        assert!(md.contains("| 1 | NORMAL | 0.00 | 1.00 | 1 |"));
    }

    #[test]
    fn test_sections_skipped_without_input() {
        let md = render_report(&analysis(vec![]));
        assert!(md.contains("## Report Summary"));
        assert!(md.contains("- **Sampling Rate**: n/a"));
        assert!(!md.contains("## State Analysis"));
        assert!(!md.contains("## Distance Analysis"));
        assert!(!md.contains("## Reflectance Analysis"));
        assert!(!md.contains("## State Transitions"));
        assert!(md.contains("## Notes"));
    }

    #[test]
    fn test_all_out_of_range_skips_distance_only() {
        let md = render_report(&analysis(vec![
            Reading::new(0, 999.0, 10, "NORMAL"),
            Reading::new(100, 999.0, 20, "NORMAL"),
        ]));
        assert!(!md.contains("## Distance Analysis"));
        assert!(md.contains("## Reflectance Analysis"));
        assert!(!md.contains("Distance Correlation"));
        assert!(!md.contains("## State Transitions"));
    }

    #[test]
    fn test_write_report_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(REPORT_FILE);
        std::fs::write(&path, "stale").unwrap();
        write_report(&path, &analysis(vec![Reading::new(0, 12.0, 500, "NORMAL")])).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Environmental Monitoring Station"));
    }
}
