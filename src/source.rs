//! Sample sources
//!
//! The engine reads samples through the [`SampleSource`] trait. Storage lives
//! outside this crate; [`InMemorySampleSource`] backs tests, the CLI and batch
//! re-runs over exported sample files.

use crate::error::{RiskError, SourceError};
use crate::types::{Sample, SignalType};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for time-ordered sample feeds
pub trait SampleSource {
    /// Fetch samples of one signal type for a member within `[start, end]`,
    /// ascending by measurement timestamp.
    fn fetch(
        &self,
        member_id: &str,
        signal_type: SignalType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, SourceError>;
}

impl<T: SampleSource + ?Sized> SampleSource for &T {
    fn fetch(
        &self,
        member_id: &str,
        signal_type: SignalType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, SourceError> {
        (**self).fetch(member_id, signal_type, start, end)
    }
}

impl<T: SampleSource + ?Sized> SampleSource for Box<T> {
    fn fetch(
        &self,
        member_id: &str,
        signal_type: SignalType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, SourceError> {
        (**self).fetch(member_id, signal_type, start, end)
    }
}

impl<T: SampleSource + ?Sized> SampleSource for Arc<T> {
    fn fetch(
        &self,
        member_id: &str,
        signal_type: SignalType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, SourceError> {
        (**self).fetch(member_id, signal_type, start, end)
    }
}

/// In-memory sample store keyed by member and signal type
#[derive(Debug, Clone)]
pub struct InMemorySampleSource {
    samples: HashMap<(String, SignalType), Vec<Sample>>,
    limit: usize,
}

impl Default for InMemorySampleSource {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_SAMPLES_PER_FETCH)
    }
}

impl InMemorySampleSource {
    /// Create an empty store returning at most `limit` samples per fetch
    pub fn new(limit: usize) -> Self {
        Self {
            samples: HashMap::new(),
            limit,
        }
    }

    /// Build a store from a batch of samples
    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Self {
        let mut store = Self::default();
        store.extend(samples);
        store
    }

    /// Parse a JSON array of samples
    pub fn parse_array(json: &str) -> Result<Vec<Sample>, RiskError> {
        let samples: Vec<Sample> = serde_json::from_str(json)?;
        Ok(samples)
    }

    /// Parse NDJSON (one sample per line)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<Sample>, RiskError> {
        let mut samples = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Sample>(trimmed) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    return Err(RiskError::Parse(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(samples)
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn insert(&mut self, sample: Sample) {
        self.samples
            .entry((sample.member_id.clone(), sample.signal_type))
            .or_default()
            .push(sample);
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = Sample>) {
        for sample in samples {
            self.insert(sample);
        }
    }

    /// Total number of stored samples
    pub fn len(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct members with at least one sample, sorted
    pub fn members(&self) -> Vec<String> {
        let mut members: Vec<String> = self.samples.keys().map(|(m, _)| m.clone()).collect();
        members.sort();
        members.dedup();
        members
    }
}

impl SampleSource for InMemorySampleSource {
    fn fetch(
        &self,
        member_id: &str,
        signal_type: SignalType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, SourceError> {
        let Some(stored) = self.samples.get(&(member_id.to_string(), signal_type)) else {
            return Ok(Vec::new());
        };

        let mut window: Vec<Sample> = stored
            .iter()
            .filter(|s| s.timestamp >= start && s.timestamp <= end)
            .cloned()
            .collect();

        // Newest first so the limit keeps the most recent samples
        window.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        window.truncate(self.limit);
        window.reverse();

        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_fetch_filters_and_orders() {
        let mut store = InMemorySampleSource::default();
        for day in [5, 1, 3, 20] {
            store.insert(Sample::numeric("m-1", SignalType::Hrv, day as f64, at(day)));
        }
        store.insert(Sample::numeric("m-1", SignalType::Steps, 9000.0, at(2)));
        store.insert(Sample::numeric("m-2", SignalType::Hrv, 40.0, at(2)));

        let samples = store
            .fetch("m-1", SignalType::Hrv, at(1), at(10))
            .unwrap();
        let values: Vec<f64> = samples.iter().filter_map(|s| s.value_num).collect();
        assert_eq!(values, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_fetch_unknown_member_is_empty() {
        let store = InMemorySampleSource::default();
        let samples = store
            .fetch("nobody", SignalType::Hrv, at(1), at(2))
            .unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn test_limit_keeps_most_recent() {
        let start = at(1);
        let samples = (0..10)
            .map(|i| Sample::numeric("m-1", SignalType::Steps, i as f64, start + Duration::days(i)));
        let store = InMemorySampleSource::from_samples(samples).with_limit(3);

        let fetched = store
            .fetch("m-1", SignalType::Steps, start, start + Duration::days(30))
            .unwrap();
        let values: Vec<f64> = fetched.iter().filter_map(|s| s.value_num).collect();
        assert_eq!(values, vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_parse_ndjson() {
        let ndjson = r#"
{"id":"a","member_id":"m-1","type":"hrv","value_num":52.0,"source":"mock","timestamp":"2024-01-01T08:00:00Z"}

{"id":"b","member_id":"m-1","type":"steps","value_num":8000,"source":"mock","timestamp":"2024-01-01T20:00:00Z"}
"#;
        let samples = InMemorySampleSource::parse_ndjson(ndjson).unwrap();
        assert_eq!(samples.len(), 2);

        let store = InMemorySampleSource::from_samples(samples);
        assert_eq!(store.len(), 2);
        assert_eq!(store.members(), vec!["m-1".to_string()]);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let err = InMemorySampleSource::parse_ndjson("{\"oops\": 1}").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
