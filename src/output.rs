//! Console output of the analysis and the annotated CSV export.

use csv::WriterBuilder;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::{Analysis, DistanceCategory, ReflectanceCategory};
use crate::error::{AnalysisError, Result};
use crate::reading::Dataset;

pub const ANNOTATED_FILE: &str = "annotated_readings.csv";

/// Logs the analysis using Rust's debug pretty-print format.
pub fn print_pretty(analysis: &Analysis) {
    debug!("{:#?}", analysis);
}

/// Logs the analysis as pretty-printed JSON.
pub fn print_json(analysis: &Analysis) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(analysis)?);
    Ok(())
}

/// One row of the annotated export: the input columns plus derived ones.
#[derive(Debug, Serialize)]
struct AnnotatedRow<'a> {
    #[serde(rename = "Tempo(ms)")]
    timestamp_ms: u64,
    #[serde(rename = "Distancia(cm)")]
    distance_cm: f64,
    #[serde(rename = "Luminosidade(IR)")]
    reflectance: u16,
    #[serde(rename = "Estado")]
    state: &'a str,
    datetime: String,
    distance_category: &'static str,
    reflectance_category: &'static str,
}

/// Writes every reading with its wall-clock time and category labels.
///
/// Out-of-range distances get an empty `distance_category`.
pub fn write_annotated(path: &Path, dataset: &Dataset) -> Result<()> {
    debug!(path = %path.display(), rows = dataset.len(), "Writing annotated CSV");

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    for (i, r) in dataset.readings().iter().enumerate() {
        let row = AnnotatedRow {
            timestamp_ms: r.timestamp_ms,
            distance_cm: r.distance_cm,
            reflectance: r.reflectance,
            state: &r.state,
            datetime: dataset
                .wall_clock(i)
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            distance_category: DistanceCategory::classify(r.distance_cm)
                .map(|c| c.label())
                .unwrap_or(""),
            reflectance_category: ReflectanceCategory::classify(r.reflectance)
                .map(|c| c.label())
                .unwrap_or(""),
        };
        writer.serialize(row).map_err(|e| csv_error(path, e))?;
    }
    writer.flush().map_err(|e| AnalysisError::write(path, e))?;

    info!(path = %path.display(), "Annotated readings saved");
    Ok(())
}

fn csv_error(path: &Path, e: csv::Error) -> AnalysisError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => AnalysisError::write(path, io),
        other => AnalysisError::Serialize(format!("{}: {other:?}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::analyze;
    use crate::reading::Reading;
    use chrono::{TimeZone, Utc};
    use std::fs;

    fn sample() -> Dataset {
        let anchor = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Dataset::new(
            "station.csv",
            anchor,
            vec![
                Reading::new(0, 25.0, 310, "NORMAL"),
                Reading::new(1500, 999.0, 950, "ALERT_CLOSE"),
            ],
        )
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&analyze(&sample()));
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&analyze(&sample())).unwrap();
    }

    #[test]
    fn test_write_annotated_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANNOTATED_FILE);
        write_annotated(&path, &sample()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Tempo(ms),Distancia(cm),Luminosidade(IR),Estado,datetime,distance_category,reflectance_category"
        );
        assert_eq!(
            lines[1],
            "0,25.0,310,NORMAL,2024-03-01T12:00:00+00:00,Ideal (10-30cm),Medium (300-600)"
        );
        assert_eq!(
            lines[2],
            "1500,999.0,950,ALERT_CLOSE,2024-03-01T12:00:01.500+00:00,,Very High (900-1023)"
        );
    }

    #[test]
    fn test_write_annotated_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join(ANNOTATED_FILE);
        assert!(matches!(
            write_annotated(&path, &sample()),
            Err(AnalysisError::Write { .. })
        ));
    }
}
