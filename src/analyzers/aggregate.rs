use std::collections::HashMap;

use crate::analyzers::strength::classify;
use crate::analyzers::types::{
    CategoryCount, Correlation, DescriptiveStats, DistanceAnalysis, DistanceCategory,
    ReflectanceAnalysis, ReflectanceCategory, StateCount,
};
use crate::analyzers::utility::{mean, pearson, quantile_sorted, sorted, stddev};
use crate::reading::{Dataset, Reading};

/// Share of `part` in `total`, as a percentage. Zero when `total` is zero.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Count, mean, median, sample standard deviation, min and max of `values`.
/// `None` for empty input.
pub fn describe(values: &[f64]) -> Option<DescriptiveStats> {
    let s = sorted(values);
    let min = *s.first()?;
    let max = *s.last()?;
    let avg = mean(&s);

    Some(DescriptiveStats {
        count: s.len(),
        mean: avg,
        median: quantile_sorted(&s, 0.5)?,
        std_dev: stddev(&s, avg),
        min,
        max,
    })
}

/// Statistics and bands over valid distances. Rows at or above the
/// sentinel are counted as out of range and otherwise ignored.
pub fn analyze_distance(dataset: &Dataset) -> Option<DistanceAnalysis> {
    let values: Vec<f64> = dataset.valid_distance().map(|r| r.distance_cm).collect();
    let stats = describe(&values)?;

    let mut counts: HashMap<DistanceCategory, usize> = HashMap::new();
    for v in &values {
        if let Some(category) = DistanceCategory::classify(*v) {
            *counts.entry(category).or_default() += 1;
        }
    }

    let categories = DistanceCategory::ALL
        .iter()
        .map(|c| {
            let count = counts.get(c).copied().unwrap_or(0);
            CategoryCount {
                label: c.label().to_string(),
                count,
                percent: pct(count, values.len()),
            }
        })
        .collect();

    Some(DistanceAnalysis {
        valid_count: values.len(),
        out_of_range_count: dataset.len() - values.len(),
        stats,
        categories,
    })
}

/// Statistics and bands over every reflectance sample, plus the
/// distance/reflectance correlation over valid-distance rows.
pub fn analyze_reflectance(dataset: &Dataset) -> Option<ReflectanceAnalysis> {
    let values: Vec<f64> = dataset
        .readings()
        .iter()
        .map(|r| f64::from(r.reflectance))
        .collect();
    let stats = describe(&values)?;

    let mut counts: HashMap<ReflectanceCategory, usize> = HashMap::new();
    for r in dataset.readings() {
        if let Some(category) = ReflectanceCategory::classify(r.reflectance) {
            *counts.entry(category).or_default() += 1;
        }
    }

    let categories = ReflectanceCategory::ALL
        .iter()
        .map(|c| {
            let count = counts.get(c).copied().unwrap_or(0);
            CategoryCount {
                label: c.label().to_string(),
                count,
                percent: pct(count, dataset.len()),
            }
        })
        .collect();

    Some(ReflectanceAnalysis {
        stats,
        categories,
        correlation: correlate(dataset),
    })
}

/// Pearson correlation of distance against reflectance over valid distances.
pub fn correlate(dataset: &Dataset) -> Option<Correlation> {
    let valid: Vec<&Reading> = dataset.valid_distance().collect();
    let xs: Vec<f64> = valid.iter().map(|r| r.distance_cm).collect();
    let ys: Vec<f64> = valid.iter().map(|r| f64::from(r.reflectance)).collect();

    let coefficient = pearson(&xs, &ys)?;
    Some(Correlation {
        coefficient,
        strength: classify(coefficient),
        samples: valid.len(),
    })
}

/// Rows per state label, most frequent first; ties keep first appearance.
pub fn state_distribution(dataset: &Dataset) -> Vec<StateCount> {
    let mut out: Vec<StateCount> = dataset
        .state_labels()
        .into_iter()
        .map(|state| {
            let count = dataset
                .readings()
                .iter()
                .filter(|r| r.state == state)
                .count();
            StateCount {
                state: state.to_string(),
                count,
                percent: pct(count, dataset.len()),
            }
        })
        .collect();

    // stable sort keeps first-appearance order among equal counts
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::strength::CorrelationStrength;
    use chrono::Utc;

    const EPS: f64 = 1e-9;

    fn dataset(rows: &[(u64, f64, u16, &str)]) -> Dataset {
        let readings = rows
            .iter()
            .map(|(t, d, r, s)| Reading::new(*t, *d, *r, s))
            .collect();
        Dataset::new("test.csv", Utc::now(), readings)
    }

    fn mixed() -> Dataset {
        dataset(&[
            (0, 5.0, 950, "ALERT_CLOSE"),
            (100, 15.0, 700, "OBJECT_DETECTED"),
            (200, 999.0, 120, "NORMAL"),
            (300, 45.0, 400, "NORMAL"),
            (400, 150.0, 50, "NORMAL"),
            (500, 1500.0, 10, "NORMAL"),
            (600, 25.0, 650, "OBJECT_DETECTED"),
        ])
    }

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(pct(10, 0), 0.0);
        assert_eq!(pct(1, 4), 25.0);
    }

    #[test]
    fn test_describe() {
        let s = describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.count, 4);
        assert!((s.mean - 2.5).abs() < EPS);
        assert!((s.median - 2.5).abs() < EPS);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.range(), 3.0);
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn test_distance_mean_excludes_sentinel_rows() {
        let a = analyze_distance(&mixed()).unwrap();
        let expected = (5.0 + 15.0 + 45.0 + 150.0 + 25.0) / 5.0;
        assert!((a.stats.mean - expected).abs() < EPS);
        assert_eq!(a.valid_count, 5);
        assert_eq!(a.out_of_range_count, 2);
    }

    #[test]
    fn test_distance_buckets_sum_to_valid_rows() {
        let a = analyze_distance(&mixed()).unwrap();
        let counts: Vec<usize> = a.categories.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![1, 2, 1, 1]);
        assert_eq!(counts.iter().sum::<usize>(), a.valid_count);
        assert!((a.categories[1].percent - 40.0).abs() < EPS);
    }

    #[test]
    fn test_distance_without_valid_rows() {
        let ds = dataset(&[(0, 999.0, 10, "NORMAL"), (10, 2000.0, 12, "NORMAL")]);
        assert!(analyze_distance(&ds).is_none());
    }

    #[test]
    fn test_reflectance_buckets_sum_to_total_rows() {
        let ds = mixed();
        let a = analyze_reflectance(&ds).unwrap();
        let counts: Vec<usize> = a.categories.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![3, 1, 2, 1]);
        assert_eq!(counts.iter().sum::<usize>(), ds.len());
        assert_eq!(a.stats.count, ds.len());
    }

    #[test]
    fn test_correlation_over_valid_rows() {
        let ds = dataset(&[
            (0, 10.0, 900, "A"),
            (1, 20.0, 800, "A"),
            (2, 999.0, 0, "A"),
            (3, 30.0, 700, "B"),
        ]);
        let c = correlate(&ds).unwrap();
        assert_eq!(c.samples, 3);
        assert!((c.coefficient + 1.0).abs() < EPS);
        assert_eq!(c.strength, CorrelationStrength::Strong);
    }

    #[test]
    fn test_correlation_needs_two_valid_rows() {
        let ds = dataset(&[(0, 10.0, 900, "A"), (1, 999.0, 800, "A")]);
        assert!(correlate(&ds).is_none());
    }

    #[test]
    fn test_state_distribution_order() {
        let states = state_distribution(&mixed());
        let labels: Vec<&str> = states.iter().map(|s| s.state.as_str()).collect();
        assert_eq!(labels, vec!["NORMAL", "OBJECT_DETECTED", "ALERT_CLOSE"]);
        assert_eq!(states[0].count, 4);
        assert_eq!(states.iter().map(|s| s.count).sum::<usize>(), 7);
    }
}
