//! Recent vs baseline windowing
//!
//! A lookback window is split by position: the most recent N samples form the
//! recent sub-window, everything strictly older forms the baseline. Missing
//! numeric values are dropped after the split, so a gap in the recent nights
//! shrinks the recent sub-window instead of pulling an older sample forward.

use crate::types::Sample;

/// Numeric values of one signal, split into baseline and recent sub-windows
#[derive(Debug, Clone, PartialEq)]
pub struct SampleWindow {
    /// Number of samples fetched, including those without a numeric value
    pub total_samples: usize,
    /// Configured size of the recent sub-window
    pub recent_len: usize,
    /// Present values older than the recent sub-window, oldest first
    pub baseline: Vec<f64>,
    /// Present values of the most recent samples, oldest first
    pub recent: Vec<f64>,
}

impl SampleWindow {
    /// Split samples into baseline and recent sub-windows
    pub fn split(samples: &[Sample], recent_len: usize) -> Self {
        let mut ordered: Vec<&Sample> = samples.iter().collect();
        ordered.sort_by_key(|s| s.timestamp);

        let split_at = ordered.len().saturating_sub(recent_len);
        let (older, newer) = ordered.split_at(split_at);

        Self {
            total_samples: samples.len(),
            recent_len,
            baseline: older.iter().filter_map(|s| s.numeric_value()).collect(),
            recent: newer.iter().filter_map(|s| s.numeric_value()).collect(),
        }
    }

    pub fn recent_mean(&self) -> Option<f64> {
        mean(&self.recent)
    }

    pub fn baseline_mean(&self) -> Option<f64> {
        mean(&self.baseline)
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    Some(sum / values.len() as f64)
}

/// Relative change of `recent` against `baseline`; a non-positive or
/// non-finite baseline (or a non-finite recent value) yields 0.0
pub fn relative_delta(recent: f64, baseline: f64) -> f64 {
    if recent.is_finite() && baseline.is_finite() && baseline > 0.0 {
        (recent - baseline) / baseline
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalType;
    use chrono::{Duration, TimeZone, Utc};

    fn samples(values: &[Option<f64>]) -> Vec<Sample> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut s = Sample::numeric("m-1", SignalType::Hrv, 0.0, start + Duration::days(i as i64));
                s.value_num = *v;
                s
            })
            .collect()
    }

    #[test]
    fn test_split_by_position() {
        let values: Vec<Option<f64>> = (1..=10).map(|v| Some(v as f64)).collect();
        let window = SampleWindow::split(&samples(&values), 7);

        assert_eq!(window.total_samples, 10);
        assert_eq!(window.baseline, vec![1.0, 2.0, 3.0]);
        assert_eq!(window.recent, vec![4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn test_split_sorts_descending_input() {
        let values: Vec<Option<f64>> = (1..=9).map(|v| Some(v as f64)).collect();
        let mut input = samples(&values);
        input.reverse();

        let window = SampleWindow::split(&input, 7);
        assert_eq!(window.baseline, vec![1.0, 2.0]);
        assert_eq!(window.recent.last(), Some(&9.0));
    }

    #[test]
    fn test_missing_values_are_dropped_after_split() {
        let values = vec![Some(10.0), None, Some(30.0), None, Some(50.0)];
        let window = SampleWindow::split(&samples(&values), 3);

        assert_eq!(window.baseline, vec![10.0]);
        assert_eq!(window.recent, vec![30.0, 50.0]);
        assert_eq!(window.recent_mean(), Some(40.0));
    }

    #[test]
    fn test_short_window_has_empty_baseline() {
        let values = vec![Some(1.0), Some(2.0)];
        let window = SampleWindow::split(&samples(&values), 7);
        assert!(window.baseline.is_empty());
        assert_eq!(window.baseline_mean(), None);
    }

    #[test]
    fn test_relative_delta_guard() {
        assert!((relative_delta(45.0, 60.0) + 0.25).abs() < 1e-12);
        assert_eq!(relative_delta(45.0, 0.0), 0.0);
        assert_eq!(relative_delta(45.0, -3.0), 0.0);
        assert_eq!(relative_delta(45.0, f64::INFINITY), 0.0);
        assert_eq!(relative_delta(f64::INFINITY, 60.0), 0.0);
        assert_eq!(relative_delta(45.0, f64::NAN), 0.0);
    }
}
