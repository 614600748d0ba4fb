//! Static and interactive charts of a station log.
//!
//! Both renderers take the palette and theme as an explicit
//! [`RenderConfig`](crate::config::RenderConfig); nothing here keeps global
//! plotting state.

pub mod dashboard;
pub mod interactive;

use std::ops::Range;

use crate::analyzers::utility::{quantile_sorted, sorted};
use crate::config::{RenderConfig, Rgb};
use crate::reading::{Dataset, Reading};

/// Distance below which the station raises its close-object alert.
pub const ALERT_THRESHOLD_CM: f64 = 10.0;

/// Upper edge of the ideal detection band.
pub const IDEAL_BOUNDARY_CM: f64 = 30.0;

pub const DASHBOARD_FILE: &str = "environmental_dashboard.png";
pub const INTERACTIVE_FILE: &str = "interactive_dashboard.html";

/// One histogram bar: `[lo, hi)` and the number of values in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

impl Bin {
    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }
}

/// Equal-width bins over the span of `values`. The last bin is closed so
/// the maximum is counted.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    if min == max {
        return vec![Bin {
            lo: min - 0.5,
            hi: max + 0.5,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            lo: min + width * i as f64,
            hi: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Five-number summary for a box plot, with 1.5 x IQR whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let s = sorted(values);
        let q1 = quantile_sorted(&s, 0.25)?;
        let median = quantile_sorted(&s, 0.5)?;
        let q3 = quantile_sorted(&s, 0.75)?;
        let iqr = q3 - q1;
        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;

        let inside: Vec<f64> = s
            .iter()
            .copied()
            .filter(|v| *v >= lo_fence && *v <= hi_fence)
            .collect();
        let lower_whisker = inside.first().copied().unwrap_or(q1);
        let upper_whisker = inside.last().copied().unwrap_or(q3);
        let outliers = s
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect();

        Some(BoxStats {
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}

/// Axis range covering `[min, max]` with a margin; never empty.
pub fn axis_range(min: f64, max: f64) -> Range<f64> {
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    if span <= f64::EPSILON {
        return (min - 1.0)..(max + 1.0);
    }
    let pad = span * 0.05;
    (min - pad)..(max + pad)
}

/// Readings of one state label with the color it is drawn in.
pub struct StateGroup<'a> {
    pub state: &'a str,
    pub color: Rgb,
    pub readings: Vec<&'a Reading>,
}

/// Readings grouped by state label, in first-appearance order.
pub fn group_by_state<'a>(dataset: &'a Dataset, config: &RenderConfig) -> Vec<StateGroup<'a>> {
    let labels = dataset.state_labels();
    let colors = config.state_palette(&labels);
    labels
        .into_iter()
        .zip(colors)
        .map(|(state, color)| StateGroup {
            state,
            color,
            readings: dataset
                .readings()
                .iter()
                .filter(|r| r.state == state)
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0];
        let bins = histogram(&values, 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[4].count, 2);
        assert!((bins[0].width() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_constant_and_empty() {
        let bins = histogram(&[3.0, 3.0], 10);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 2);
        assert!(histogram(&[], 10).is_empty());
    }

    #[test]
    fn test_box_stats_with_outlier() {
        let b = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert!((b.median - 3.5).abs() < 1e-12);
        assert_eq!(b.outliers, vec![100.0]);
        assert_eq!(b.upper_whisker, 5.0);
        assert_eq!(b.lower_whisker, 1.0);
        assert!(BoxStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_axis_range_never_empty() {
        let r = axis_range(5.0, 5.0);
        assert!(r.start < r.end);
        let r = axis_range(0.0, 100.0);
        assert!(r.start < 0.0 && r.end > 100.0);
    }

    #[test]
    fn test_group_by_state() {
        let ds = Dataset::new(
            "t.csv",
            Utc::now(),
            vec![
                Reading::new(0, 1.0, 1, "NORMAL"),
                Reading::new(1, 1.0, 1, "ALERT_CLOSE"),
                Reading::new(2, 1.0, 1, "NORMAL"),
            ],
        );
        let groups = group_by_state(&ds, &RenderConfig::default());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].state, "NORMAL");
        assert_eq!(groups[0].readings.len(), 2);
        assert_eq!(groups[1].color, Rgb(0xe7, 0x4c, 0x3c));
    }
}
