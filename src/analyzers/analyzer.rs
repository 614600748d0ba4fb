use chrono::Utc;
use tracing::{info, warn};

use crate::analyzers::aggregate::{analyze_distance, analyze_reflectance, state_distribution};
use crate::analyzers::transitions::summarize_transitions;
use crate::analyzers::types::{Analysis, DatasetSummary};
use crate::reading::Dataset;

/// Runs every analysis step over `dataset`.
///
/// Steps without data (no valid distances, no rows) come back as `None`
/// or empty and are logged, never turned into errors.
#[tracing::instrument(skip_all, fields(records = dataset.len()))]
pub fn analyze(dataset: &Dataset) -> Analysis {
    let summary = summarize_dataset(dataset);

    let states = state_distribution(dataset);
    for s in &states {
        info!(state = %s.state, count = s.count, percent = %format!("{:.1}", s.percent), "State distribution");
    }

    let distance = analyze_distance(dataset);
    match &distance {
        Some(d) => {
            info!(
                valid = d.valid_count,
                out_of_range = d.out_of_range_count,
                mean_cm = %format!("{:.2}", d.stats.mean),
                median_cm = %format!("{:.2}", d.stats.median),
                std_cm = %format!("{:.2}", d.stats.std_dev),
                min_cm = %format!("{:.2}", d.stats.min),
                max_cm = %format!("{:.2}", d.stats.max),
                "Distance analysis"
            );
            for c in &d.categories {
                info!(category = %c.label, count = c.count, percent = %format!("{:.1}", c.percent), "Distance category");
            }
        }
        None => warn!("No valid distance measurements found"),
    }

    let reflectance = analyze_reflectance(dataset);
    match &reflectance {
        Some(r) => {
            info!(
                mean = %format!("{:.2}", r.stats.mean),
                median = %format!("{:.2}", r.stats.median),
                std = %format!("{:.2}", r.stats.std_dev),
                min = r.stats.min,
                max = r.stats.max,
                "Reflectance analysis"
            );
            if let Some(c) = &r.correlation {
                info!(
                    r = %format!("{:.3}", c.coefficient),
                    strength = c.strength.label(),
                    samples = c.samples,
                    "Distance/reflectance correlation"
                );
            }
            for c in &r.categories {
                info!(category = %c.label, count = c.count, percent = %format!("{:.1}", c.percent), "Reflectance category");
            }
        }
        None => warn!("No reflectance measurements found"),
    }

    let transitions = summarize_transitions(dataset.readings());
    if transitions.has_transitions() {
        info!(
            runs = transitions.runs.len(),
            transitions = transitions.transitions(),
            "State transition analysis"
        );
        for d in &transitions.durations {
            info!(state = %d.state, mean_secs = %format!("{:.2}", d.mean_secs), runs = d.runs, "Average state duration");
        }
    } else {
        info!("No state transitions");
    }

    Analysis {
        generated_at: Utc::now(),
        source: dataset.source().display().to_string(),
        summary,
        states,
        distance,
        reflectance,
        transitions,
    }
}

/// Record count, observed span, sampling rate and largest distance.
pub fn summarize_dataset(dataset: &Dataset) -> DatasetSummary {
    let range = dataset.time_range_ms();
    let span_secs = range
        .map(|(first, last)| (last - first) as f64 / 1000.0)
        .unwrap_or(0.0);
    let sampling_rate_hz = (span_secs > 0.0).then(|| dataset.len() as f64 / span_secs);
    let max_distance_cm = dataset
        .readings()
        .iter()
        .map(|r| r.distance_cm)
        .max_by(f64::total_cmp);

    DatasetSummary {
        records: dataset.len(),
        first_ms: range.map(|(first, _)| first),
        last_ms: range.map(|(_, last)| last),
        span_secs,
        sampling_rate_hz,
        max_distance_cm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Reading;

    fn dataset(rows: Vec<Reading>) -> Dataset {
        Dataset::new("test.csv", Utc::now(), rows)
    }

    #[test]
    fn test_analyze_full_dataset() {
        let ds = dataset(vec![
            Reading::new(0, 40.0, 300, "NORMAL"),
            Reading::new(1000, 20.0, 600, "OBJECT_DETECTED"),
            Reading::new(2000, 8.0, 900, "ALERT_CLOSE"),
            Reading::new(3000, 999.0, 100, "NORMAL"),
        ]);
        let a = analyze(&ds);
        assert_eq!(a.summary.records, 4);
        assert_eq!(a.states.len(), 3);
        assert_eq!(a.distance.as_ref().unwrap().valid_count, 3);
        assert!(a.reflectance.as_ref().unwrap().correlation.is_some());
        assert_eq!(a.transitions.transitions(), 3);
        assert_eq!(a.source, "test.csv");
    }

    #[test]
    fn test_analyze_empty_dataset_degrades() {
        let a = analyze(&dataset(vec![]));
        assert_eq!(a.summary.records, 0);
        assert!(a.states.is_empty());
        assert!(a.distance.is_none());
        assert!(a.reflectance.is_none());
        assert!(a.transitions.runs.is_empty());
    }

    #[test]
    fn test_summary_sampling_rate() {
        let ds = dataset(vec![
            Reading::new(1000, 10.0, 1, "A"),
            Reading::new(2000, 999.0, 1, "A"),
            Reading::new(3000, 12.0, 1, "A"),
        ]);
        let s = summarize_dataset(&ds);
        assert_eq!(s.span_secs, 2.0);
        assert_eq!(s.sampling_rate_hz, Some(1.5));
        assert_eq!(s.max_distance_cm, Some(999.0));
        assert_eq!(s.first_ms, Some(1000));
    }

    #[test]
    fn test_summary_single_reading_has_no_rate() {
        let s = summarize_dataset(&dataset(vec![Reading::new(5, 10.0, 1, "A")]));
        assert_eq!(s.span_secs, 0.0);
        assert_eq!(s.sampling_rate_hz, None);
    }
}
