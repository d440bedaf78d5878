//! Core types for the Synheart Risk engine
//!
//! This module defines the records that flow through the engine: the samples it
//! reads, the factors its analyzers emit, and the risk event it produces.

use crate::error::RiskError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Measured signal types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    // Heart
    HeartRate,
    Hrv,
    RestingHr,

    // Activity
    Steps,
    Distance,
    ActiveMinutes,
    Calories,

    // Sleep
    SleepDuration,
    SleepEfficiency,
    DeepSleep,
    RemSleep,
    LightSleep,
    AwakeTime,

    // Vitals
    Weight,
    Bmi,
    #[serde(rename = "bp_systolic")]
    BloodPressureSystolic,
    #[serde(rename = "bp_diastolic")]
    BloodPressureDiastolic,
    BloodOxygen,
    BodyTemperature,

    // Home sensors
    BathroomVisits,
    RoomTransitions,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::HeartRate => "heart_rate",
            SignalType::Hrv => "hrv",
            SignalType::RestingHr => "resting_hr",
            SignalType::Steps => "steps",
            SignalType::Distance => "distance",
            SignalType::ActiveMinutes => "active_minutes",
            SignalType::Calories => "calories",
            SignalType::SleepDuration => "sleep_duration",
            SignalType::SleepEfficiency => "sleep_efficiency",
            SignalType::DeepSleep => "deep_sleep",
            SignalType::RemSleep => "rem_sleep",
            SignalType::LightSleep => "light_sleep",
            SignalType::AwakeTime => "awake_time",
            SignalType::Weight => "weight",
            SignalType::Bmi => "bmi",
            SignalType::BloodPressureSystolic => "bp_systolic",
            SignalType::BloodPressureDiastolic => "bp_diastolic",
            SignalType::BloodOxygen => "blood_oxygen",
            SignalType::BodyTemperature => "body_temperature",
            SignalType::BathroomVisits => "bathroom_visits",
            SignalType::RoomTransitions => "room_transitions",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped measurement, read-only to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Unique sample identifier
    #[serde(default = "new_sample_id")]
    pub id: String,
    /// Member the sample belongs to
    pub member_id: String,
    /// Type of signal
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    /// Numeric value, absent for structured payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_num: Option<f64>,
    /// Structured value (e.g. sleep stage breakdown)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_json: Option<serde_json::Value>,
    /// Measurement unit ("ms", "steps", "ratio", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Source identifier ("healthkit", "googlefit", "mock", ...)
    #[serde(default = "unknown_source")]
    pub source: String,
    /// Linked device account, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_account_id: Option<String>,
    /// When the measurement was taken
    pub timestamp: DateTime<Utc>,
    /// When the measurement was recorded
    #[serde(default = "Utc::now")]
    pub ingested_at: DateTime<Utc>,
}

fn new_sample_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn unknown_source() -> String {
    "unknown".to_string()
}

impl Sample {
    /// Create a numeric sample measured at `timestamp`
    pub fn numeric(
        member_id: impl Into<String>,
        signal_type: SignalType,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Sample {
            id: new_sample_id(),
            member_id: member_id.into(),
            signal_type,
            value_num: Some(value),
            value_json: None,
            unit: None,
            source: unknown_source(),
            device_account_id: None,
            timestamp,
            ingested_at: Utc::now(),
        }
    }

    /// Create a structured sample with no numeric value
    pub fn structured(
        member_id: impl Into<String>,
        signal_type: SignalType,
        value: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Sample {
            value_num: None,
            value_json: Some(value),
            ..Sample::numeric(member_id, signal_type, 0.0, timestamp)
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Numeric value if present and finite
    pub fn numeric_value(&self) -> Option<f64> {
        self.value_num.filter(|v| v.is_finite())
    }

    /// Validate the sample record
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.member_id.trim().is_empty() {
            return Err(RiskError::InvalidSample("member_id is empty".to_string()));
        }
        match (self.value_num, &self.value_json) {
            (Some(v), _) if !v.is_finite() => Err(RiskError::InvalidSample(format!(
                "value_num is not finite: {v}"
            ))),
            (None, None) => Err(RiskError::InvalidSample(
                "sample has neither value_num nor value_json".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Which analyzer produced a factor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    VariabilityDrop,
    SleepEfficiencyLow,
    ActivityDecline,
    /// For analyzers registered outside this crate
    #[serde(untagged)]
    Custom(String),
}

impl FactorKind {
    pub fn as_str(&self) -> &str {
        match self {
            FactorKind::VariabilityDrop => "variability_drop",
            FactorKind::SleepEfficiencyLow => "sleep_efficiency_low",
            FactorKind::ActivityDecline => "activity_decline",
            FactorKind::Custom(name) => name.as_str(),
        }
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected deviation from the member's own baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    #[serde(rename = "type")]
    pub kind: FactorKind,
    /// Size of the recent window compared against baseline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_days: Option<u32>,
    /// Signed relative change, recent vs baseline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    /// Trigger boundary for threshold-based factors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_value: Option<f64>,
    /// Normalized severity (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<f64>,
}

impl Factor {
    /// Create a factor with only its kind set
    pub fn new(kind: FactorKind) -> Self {
        Self {
            kind,
            window_days: None,
            delta: None,
            threshold: None,
            actual_value: None,
            baseline_value: None,
            severity: None,
        }
    }

    pub fn with_severity(mut self, severity: f64) -> Self {
        self.severity = Some(severity.clamp(0.0, 1.0));
        self
    }
}

/// Discrete severity classification, ordered normal < elevated < critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Normal,
    Elevated,
    Critical,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Normal => "normal",
            Tier::Elevated => "elevated",
            Tier::Critical => "critical",
        }
    }

    /// Traffic-light label used by care dashboards
    pub fn color(&self) -> &'static str {
        match self {
            Tier::Normal => "green",
            Tier::Elevated => "yellow",
            Tier::Critical => "red",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow status of a risk event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    New,
    Acknowledged,
    InProgress,
    Resolved,
    Dismissed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::New => "new",
            EventStatus::Acknowledged => "acknowledged",
            EventStatus::InProgress => "in_progress",
            EventStatus::Resolved => "resolved",
            EventStatus::Dismissed => "dismissed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Resolved | EventStatus::Dismissed)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scored, classified, explained risk event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub id: String,
    pub member_id: String,
    pub org_id: String,

    // Assessment
    pub tier: Tier,
    /// Composite risk score (0-100)
    pub score: f64,
    /// Factors in analyzer invocation order
    pub factors: Vec<Factor>,
    pub explanation_text: String,
    pub suggested_actions: Vec<String>,

    // Workflow
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caregiver_notes: Option<String>,

    // Timestamps
    pub detected_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_type_wire_names() {
        let json = serde_json::to_string(&SignalType::BloodPressureSystolic).unwrap();
        assert_eq!(json, "\"bp_systolic\"");

        let parsed: SignalType = serde_json::from_str("\"sleep_efficiency\"").unwrap();
        assert_eq!(parsed, SignalType::SleepEfficiency);
        assert_eq!(parsed.to_string(), "sleep_efficiency");
    }

    #[test]
    fn test_factor_kind_custom() {
        let kind: FactorKind = serde_json::from_str("\"resting_hr_rise\"").unwrap();
        assert_eq!(kind, FactorKind::Custom("resting_hr_rise".to_string()));

        let kind: FactorKind = serde_json::from_str("\"variability_drop\"").unwrap();
        assert_eq!(kind, FactorKind::VariabilityDrop);
    }

    #[test]
    fn test_factor_serializes_kind_as_type() {
        let factor = Factor::new(FactorKind::ActivityDecline).with_severity(1.4);
        let value = serde_json::to_value(&factor).unwrap();
        assert_eq!(value["type"], "activity_decline");
        assert_eq!(value["severity"], 1.0);
        assert!(value.get("delta").is_none());
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Normal < Tier::Elevated);
        assert!(Tier::Elevated < Tier::Critical);
        assert_eq!(Tier::Critical.color(), "red");
    }

    #[test]
    fn test_sample_validation() {
        let now = Utc::now();
        let ok = Sample::numeric("m-1", SignalType::Hrv, 55.0, now);
        assert!(ok.validate().is_ok());

        let bad = Sample::numeric("m-1", SignalType::Hrv, f64::NAN, now);
        assert!(bad.validate().is_err());
        assert_eq!(bad.numeric_value(), None);

        let structured = Sample::structured(
            "m-1",
            SignalType::DeepSleep,
            serde_json::json!({"minutes": 80}),
            now,
        );
        assert!(structured.validate().is_ok());
        assert_eq!(structured.numeric_value(), None);
    }

    #[test]
    fn test_deserialize_sample_defaults() {
        let json = r#"{
            "id": "s-1",
            "member_id": "member-001",
            "type": "steps",
            "value_num": 8500,
            "unit": "steps",
            "source": "healthkit",
            "timestamp": "2024-01-15T08:30:00Z"
        }"#;

        let sample: Sample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.signal_type, SignalType::Steps);
        assert_eq!(sample.value_num, Some(8500.0));
        assert!(sample.device_account_id.is_none());
    }
}
