//! CSV loader for station logs.
//!
//! Reads the serial log captured from the station into a [`Dataset`],
//! rejecting files that lack a required column or carry values outside the
//! sensors' domains.

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, Result};
use crate::reading::{Dataset, MAX_REFLECTANCE, REQUIRED_COLUMNS, Reading};

/// Loads `path`, anchoring derived wall-clock times at the current instant.
///
/// # Errors
///
/// [`AnalysisError::MissingFile`] when the file does not exist,
/// [`AnalysisError::MalformedData`] when a column is absent or a row does
/// not parse.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    load_dataset_at(path, Utc::now())
}

/// Same as [`load_dataset`] with an explicit wall-clock anchor.
#[tracing::instrument(skip(anchor), fields(path = %path.display()))]
pub fn load_dataset_at(path: &Path, anchor: DateTime<Utc>) -> Result<Dataset> {
    if !path.exists() {
        return Err(AnalysisError::MissingFile(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AnalysisError::MissingFile(path.to_path_buf()),
        _ => AnalysisError::Io(e),
    })?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = rdr
        .headers()
        .map_err(|e| AnalysisError::malformed(path, format!("unreadable header: {e}")))?
        .clone();
    check_columns(path, &headers)?;
    debug!(columns = ?headers.iter().collect::<Vec<_>>(), "Header accepted");

    let mut readings = Vec::new();
    let mut record = StringRecord::new();
    loop {
        match rdr.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => return Err(AnalysisError::malformed(path, e.to_string())),
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let reading: Reading = record
            .deserialize(Some(&headers))
            .map_err(|e| AnalysisError::malformed(path, format!("line {line}: {e}")))?;
        validate(&reading).map_err(|reason| AnalysisError::malformed(path, format!("line {line}: {reason}")))?;
        readings.push(reading);
    }

    if readings.is_empty() {
        warn!("Input has a header but no readings");
    }

    let decreasing = readings
        .windows(2)
        .filter(|w| w[1].timestamp_ms < w[0].timestamp_ms)
        .count();
    if decreasing > 0 {
        warn!(decreasing, "Timestamps are not monotonic; durations may be negative");
    }

    let dataset = Dataset::new(path, anchor, readings);
    match dataset.time_range_ms() {
        Some((first_ms, last_ms)) => {
            info!(records = dataset.len(), first_ms, last_ms, "Loaded station log")
        }
        None => info!(records = 0, "Loaded station log"),
    }

    Ok(dataset)
}

fn check_columns(path: &Path, headers: &StringRecord) -> Result<()> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(AnalysisError::malformed(
                path,
                format!("missing column \"{column}\""),
            ));
        }
    }
    Ok(())
}

fn validate(reading: &Reading) -> std::result::Result<(), String> {
    if i64::try_from(reading.timestamp_ms).is_err() {
        return Err(format!("timestamp {} exceeds {}", reading.timestamp_ms, i64::MAX));
    }
    if !reading.distance_cm.is_finite() || reading.distance_cm < 0.0 {
        return Err(format!("distance {} is not a non-negative number", reading.distance_cm));
    }
    if reading.reflectance > MAX_REFLECTANCE {
        return Err(format!(
            "reflectance {} exceeds {MAX_REFLECTANCE}",
            reading.reflectance
        ));
    }
    if reading.state.is_empty() {
        return Err("empty state label".to_string());
    }
    Ok(())
}
