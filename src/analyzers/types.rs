//! Data types produced by the analysis pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::strength::CorrelationStrength;
use crate::reading::{MAX_REFLECTANCE, OUT_OF_RANGE_CM};

/// Count, location and spread of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl DescriptiveStats {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Semantic distance band for a valid (below-sentinel) distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DistanceCategory {
    VeryClose,
    Ideal,
    Moderate,
    Far,
}

impl DistanceCategory {
    pub const ALL: [DistanceCategory; 4] = [
        DistanceCategory::VeryClose,
        DistanceCategory::Ideal,
        DistanceCategory::Moderate,
        DistanceCategory::Far,
    ];

    /// Bands are right-open: [0,10) [10,30) [30,100) [100,999).
    /// Out-of-range and negative distances have no band.
    pub fn classify(distance_cm: f64) -> Option<Self> {
        match distance_cm {
            d if !(0.0..OUT_OF_RANGE_CM).contains(&d) => None,
            d if d < 10.0 => Some(DistanceCategory::VeryClose),
            d if d < 30.0 => Some(DistanceCategory::Ideal),
            d if d < 100.0 => Some(DistanceCategory::Moderate),
            _ => Some(DistanceCategory::Far),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DistanceCategory::VeryClose => "Very Close (<10cm)",
            DistanceCategory::Ideal => "Ideal (10-30cm)",
            DistanceCategory::Moderate => "Moderate (30-100cm)",
            DistanceCategory::Far => "Far (>100cm)",
        }
    }
}

/// Semantic band for an IR reflectance sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReflectanceCategory {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ReflectanceCategory {
    pub const ALL: [ReflectanceCategory; 4] = [
        ReflectanceCategory::Low,
        ReflectanceCategory::Medium,
        ReflectanceCategory::High,
        ReflectanceCategory::VeryHigh,
    ];

    /// Bands are [0,300) [300,600) [600,900) [900,1023].
    pub fn classify(reflectance: u16) -> Option<Self> {
        match reflectance {
            r if r > MAX_REFLECTANCE => None,
            0..300 => Some(ReflectanceCategory::Low),
            300..600 => Some(ReflectanceCategory::Medium),
            600..900 => Some(ReflectanceCategory::High),
            _ => Some(ReflectanceCategory::VeryHigh),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReflectanceCategory::Low => "Low (0-300)",
            ReflectanceCategory::Medium => "Medium (300-600)",
            ReflectanceCategory::High => "High (600-900)",
            ReflectanceCategory::VeryHigh => "Very High (900-1023)",
        }
    }
}

/// Number and share of rows falling in one band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// Number and share of rows carrying one state label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateCount {
    pub state: String,
    pub count: usize,
    pub percent: f64,
}

/// Pearson correlation between distance and reflectance over valid distances.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub coefficient: f64,
    pub strength: CorrelationStrength,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceAnalysis {
    pub valid_count: usize,
    pub out_of_range_count: usize,
    pub stats: DescriptiveStats,
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReflectanceAnalysis {
    pub stats: DescriptiveStats,
    pub categories: Vec<CategoryCount>,
    pub correlation: Option<Correlation>,
}

/// A maximal run of consecutive readings sharing one state label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateRun {
    pub state: String,
    /// Index of the first reading in the run.
    pub start_index: usize,
    /// Number of readings in the run.
    pub len: usize,
    pub start_ms: u64,
    /// Next run's start, or the last reading's timestamp for the final run.
    pub end_ms: u64,
}

impl StateRun {
    /// Signed so that out-of-order timestamps show up as negative
    /// durations. Saturates at the `i64` bounds.
    pub fn duration_ms(&self) -> i64 {
        let diff = i128::from(self.end_ms) - i128::from(self.start_ms);
        i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_ms() as f64 / 1000.0
    }
}

/// Mean duration of the terminated runs of one state label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateDuration {
    pub state: String,
    pub mean_secs: f64,
    pub runs: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransitionSummary {
    pub runs: Vec<StateRun>,
    /// Per-label mean durations, in first-appearance order. Empty when
    /// there are fewer than two runs.
    pub durations: Vec<StateDuration>,
}

impl TransitionSummary {
    /// Number of boundaries between runs.
    pub fn transitions(&self) -> usize {
        self.runs.len().saturating_sub(1)
    }

    pub fn has_transitions(&self) -> bool {
        self.runs.len() > 1
    }

    pub fn mean_duration(&self, state: &str) -> Option<f64> {
        self.durations
            .iter()
            .find(|d| d.state == state)
            .map(|d| d.mean_secs)
    }
}

/// Dataset-level figures shown at the top of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub records: usize,
    pub first_ms: Option<u64>,
    pub last_ms: Option<u64>,
    pub span_secs: f64,
    pub sampling_rate_hz: Option<f64>,
    pub max_distance_cm: Option<f64>,
}

/// Every analysis result for one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub summary: DatasetSummary,
    pub states: Vec<StateCount>,
    pub distance: Option<DistanceAnalysis>,
    pub reflectance: Option<ReflectanceAnalysis>,
    pub transitions: TransitionSummary,
}
