//! Sensor readings and the in-memory dataset they form.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Distances at or above this value mean the ultrasonic sensor got no echo.
pub const OUT_OF_RANGE_CM: f64 = 999.0;

/// Upper bound of the 10-bit IR reflectance ADC.
pub const MAX_REFLECTANCE: u16 = 1023;

pub const COL_TIMESTAMP: &str = "Tempo(ms)";
pub const COL_DISTANCE: &str = "Distancia(cm)";
pub const COL_REFLECTANCE: &str = "Luminosidade(IR)";
pub const COL_STATE: &str = "Estado";

/// Columns every input file must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = [COL_TIMESTAMP, COL_DISTANCE, COL_REFLECTANCE, COL_STATE];

/// One sensor sample row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(rename = "Tempo(ms)")]
    pub timestamp_ms: u64,
    #[serde(rename = "Distancia(cm)")]
    pub distance_cm: f64,
    #[serde(rename = "Luminosidade(IR)")]
    pub reflectance: u16,
    #[serde(rename = "Estado")]
    pub state: String,
}

impl Reading {
    pub fn new(timestamp_ms: u64, distance_cm: f64, reflectance: u16, state: &str) -> Self {
        Reading {
            timestamp_ms,
            distance_cm,
            reflectance,
            state: state.to_string(),
        }
    }

    /// True when the distance is below the no-echo sentinel.
    pub fn has_valid_distance(&self) -> bool {
        self.distance_cm < OUT_OF_RANGE_CM
    }

    pub fn seconds(&self) -> f64 {
        self.timestamp_ms as f64 / 1000.0
    }
}

/// Readings in acquisition order, plus the wall-clock anchor taken at load time.
///
/// The anchor is the moment the file was loaded, not the moment it was
/// recorded: the station only logs millisecond offsets since power-up, so
/// [`Dataset::wall_clock`] is an approximation.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: PathBuf,
    anchor: DateTime<Utc>,
    readings: Vec<Reading>,
}

impl Dataset {
    pub fn new(source: impl Into<PathBuf>, anchor: DateTime<Utc>, readings: Vec<Reading>) -> Self {
        Dataset {
            source: source.into(),
            anchor,
            readings,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Readings whose distance is below the out-of-range sentinel.
    pub fn valid_distance(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter().filter(|r| r.has_valid_distance())
    }

    /// Derived wall-clock time of reading `index`: load-time anchor plus offset.
    pub fn wall_clock(&self, index: usize) -> Option<DateTime<Utc>> {
        let reading = self.readings.get(index)?;
        let offset = TimeDelta::try_milliseconds(i64::try_from(reading.timestamp_ms).ok()?)?;
        self.anchor.checked_add_signed(offset)
    }

    /// Smallest and largest timestamp in milliseconds.
    pub fn time_range_ms(&self) -> Option<(u64, u64)> {
        let min = self.readings.iter().map(|r| r.timestamp_ms).min()?;
        let max = self.readings.iter().map(|r| r.timestamp_ms).max()?;
        Some((min, max))
    }

    /// State labels in order of first appearance.
    pub fn state_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for r in &self.readings {
            if !labels.contains(&r.state.as_str()) {
                labels.push(&r.state);
            }
        }
        labels
    }
}
