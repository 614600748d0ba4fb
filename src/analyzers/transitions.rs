//! Run-length encoding of the state column and per-state dwell times.
//!
//! A run starts at the first reading and wherever the label differs from the
//! previous reading's. The duration of run `i` is the distance between its
//! start and the start of run `i + 1`. The final run has no successor, so its
//! duration never enters the per-state means.

use crate::analyzers::types::{StateDuration, StateRun, TransitionSummary};
use crate::reading::Reading;

/// Splits `readings` into maximal runs of equal state label.
pub fn state_runs(readings: &[Reading]) -> Vec<StateRun> {
    let mut runs: Vec<StateRun> = Vec::new();

    for (i, r) in readings.iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.state == r.state => run.len += 1,
            _ => runs.push(StateRun {
                state: r.state.clone(),
                start_index: i,
                len: 1,
                start_ms: r.timestamp_ms,
                end_ms: r.timestamp_ms,
            }),
        }
    }

    let next_starts: Vec<u64> = runs.iter().skip(1).map(|r| r.start_ms).collect();
    for (run, next_start) in runs.iter_mut().zip(next_starts) {
        run.end_ms = next_start;
    }
    if let (Some(run), Some(last)) = (runs.last_mut(), readings.last()) {
        run.end_ms = last.timestamp_ms;
    }

    runs
}

/// Builds the run list and the mean duration, in seconds, of every state's
/// terminated runs.
pub fn summarize_transitions(readings: &[Reading]) -> TransitionSummary {
    let runs = state_runs(readings);
    if runs.len() < 2 {
        return TransitionSummary {
            runs,
            durations: Vec::new(),
        };
    }

    let mut grouped: Vec<(String, Vec<f64>)> = Vec::new();
    for pair in runs.windows(2) {
        let secs = (pair[1].start_ms as f64 - pair[0].start_ms as f64) / 1000.0;
        match grouped.iter_mut().find(|(state, _)| *state == pair[0].state) {
            Some((_, list)) => list.push(secs),
            None => grouped.push((pair[0].state.clone(), vec![secs])),
        }
    }

    let durations = grouped
        .into_iter()
        .map(|(state, list)| StateDuration {
            state,
            mean_secs: list.iter().sum::<f64>() / list.len() as f64,
            runs: list.len(),
        })
        .collect();

    TransitionSummary { runs, durations }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(rows: &[(u64, &str)]) -> Vec<Reading> {
        rows.iter()
            .map(|(t, s)| Reading::new(*t, 20.0, 500, s))
            .collect()
    }

    #[test]
    fn test_two_runs_only_first_terminated() {
        let r = readings(&[(0, "A"), (1000, "A"), (2000, "B"), (5000, "B")]);
        let summary = summarize_transitions(&r);

        let starts: Vec<(&str, u64)> = summary
            .runs
            .iter()
            .map(|run| (run.state.as_str(), run.start_ms))
            .collect();
        assert_eq!(starts, vec![("A", 0), ("B", 2000)]);
        assert_eq!(summary.transitions(), 1);
        assert_eq!(summary.durations.len(), 1);
        assert_eq!(summary.mean_duration("A"), Some(2.0));
        assert_eq!(summary.mean_duration("B"), None);
    }

    #[test]
    fn test_single_state_has_no_durations() {
        let rows: Vec<(u64, &str)> = (0..100).map(|i| (i * 100, "NORMAL")).collect();
        let summary = summarize_transitions(&readings(&rows));
        assert_eq!(summary.runs.len(), 1);
        assert_eq!(summary.runs[0].len, 100);
        assert!(summary.durations.is_empty());
        assert!(!summary.has_transitions());
    }

    #[test]
    fn test_empty_input() {
        let summary = summarize_transitions(&[]);
        assert!(summary.runs.is_empty());
        assert!(summary.durations.is_empty());
    }

    #[test]
    fn test_runs_partition_and_reproduce_states() {
        let r = readings(&[
            (0, "NORMAL"),
            (100, "NORMAL"),
            (200, "OBJECT_DETECTED"),
            (300, "ALERT_CLOSE"),
            (400, "ALERT_CLOSE"),
            (500, "NORMAL"),
            (600, "NORMAL"),
        ]);
        let runs = state_runs(&r);

        let mut next_index = 0;
        let mut rebuilt: Vec<&str> = Vec::new();
        for run in &runs {
            assert_eq!(run.start_index, next_index);
            next_index += run.len;
            rebuilt.extend(std::iter::repeat_n(run.state.as_str(), run.len));
        }
        assert_eq!(next_index, r.len());

        let original: Vec<&str> = r.iter().map(|x| x.state.as_str()).collect();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_run_end_is_next_start_and_last_timestamp() {
        let r = readings(&[(0, "A"), (100, "B"), (250, "B"), (400, "A"), (900, "A")]);
        let runs = state_runs(&r);
        let ends: Vec<u64> = runs.iter().map(|run| run.end_ms).collect();
        assert_eq!(ends, vec![100, 400, 900]);
    }

    #[test]
    fn test_means_group_by_label() {
        let r = readings(&[
            (0, "A"),
            (1000, "B"),
            (1500, "A"),
            (4500, "B"),
            (5000, "A"),
        ]);
        let summary = summarize_transitions(&r);
        // A: 1.0 and 3.0; B: 0.5 and 0.5; the last A run is open
        assert_eq!(summary.mean_duration("A"), Some(2.0));
        assert_eq!(summary.mean_duration("B"), Some(0.5));
        assert_eq!(summary.durations[0].state, "A");
        assert_eq!(summary.durations[0].runs, 2);
        assert_eq!(summary.transitions(), 4);
    }
}
