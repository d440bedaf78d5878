//! Risk engine orchestration
//!
//! This module provides the public entry point of Synheart Risk. It runs every
//! registered analyzer over a lookback window and assembles a risk event when
//! at least one factor is detected.
//!
//! Pipeline stages:
//! 1. SampleSource - Fetch one window per analyzer signal
//! 2. SignalAnalyzer - Detect deviation factors
//! 3. composite_score / classify_tier - Score and tier
//! 4. ExplanationStrategy / suggest_actions - Text and actions
//! 5. RiskEvent - Immutable record in status "new"

use crate::actions::suggest_actions;
use crate::analyzers::AnalyzerRegistry;
use crate::config::EngineConfig;
use crate::error::RiskError;
use crate::explain::{ExplanationStrategy, TemplateExplainer};
use crate::scoring::{classify_tier, composite_score};
use crate::source::SampleSource;
use crate::types::{EventStatus, Factor, RiskEvent, Sample};
use crate::RISK_VERSION;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Stateless risk engine over a sample source.
///
/// Holds no per-member state; concurrent evaluations never interact.
pub struct RiskEngine<S> {
    source: S,
    config: EngineConfig,
    registry: AnalyzerRegistry,
    explainer: Box<dyn ExplanationStrategy>,
}

impl<S: SampleSource> RiskEngine<S> {
    /// Create an engine with the default policy
    pub fn new(source: S) -> Self {
        let config = EngineConfig::default();
        Self {
            source,
            registry: AnalyzerRegistry::standard(&config),
            config,
            explainer: Box::new(TemplateExplainer),
        }
    }

    /// Create an engine with a custom policy
    pub fn with_config(source: S, config: EngineConfig) -> Result<Self, RiskError> {
        config.validate()?;
        Ok(Self {
            source,
            registry: AnalyzerRegistry::standard(&config),
            config,
            explainer: Box::new(TemplateExplainer),
        })
    }

    /// Replace the analyzer set
    pub fn with_registry(mut self, registry: AnalyzerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the explanation renderer
    pub fn with_explainer(mut self, explainer: impl ExplanationStrategy + 'static) -> Self {
        self.explainer = Box::new(explainer);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    /// Evaluate a member over the lookback window ending now.
    ///
    /// Returns `Ok(None)` when no analyzer detects a deviation. A failed fetch
    /// fails the whole evaluation.
    pub fn evaluate(&self, member_id: &str, org_id: &str) -> Result<Option<RiskEvent>, RiskError> {
        self.evaluate_at(member_id, org_id, Utc::now())
    }

    /// Evaluate a member over the lookback window ending at `now`
    pub fn evaluate_at(
        &self,
        member_id: &str,
        org_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RiskEvent>, RiskError> {
        let start = Duration::try_days(self.config.lookback_days)
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .ok_or_else(|| {
                RiskError::Config(format!(
                    "lookback of {} days before {now} is out of range",
                    self.config.lookback_days
                ))
            })?;
        let factors = self.detect_factors(member_id, start, now)?;

        let mut metadata = BTreeMap::new();
        metadata.insert("engine_version".to_string(), RISK_VERSION.into());
        metadata.insert("lookback_days".to_string(), self.config.lookback_days.into());

        let event = assess(
            member_id,
            org_id,
            factors,
            self.explainer.as_ref(),
            now,
            metadata,
        );

        match &event {
            Some(event) => info!(
                member_id,
                tier = %event.tier,
                score = event.score,
                factors = event.factors.len(),
                "risk event detected"
            ),
            None => debug!(member_id, "no risk factors detected"),
        }

        Ok(event)
    }

    /// Run every analyzer over `[start, end]`, in registration order
    pub fn detect_factors(
        &self,
        member_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Factor>, RiskError> {
        let mut factors = Vec::new();

        for analyzer in self.registry.iter() {
            let signal_type = analyzer.signal_type();
            let samples = self
                .source
                .fetch(member_id, signal_type, start, end)
                .map_err(|source| {
                    warn!(member_id, signal = %signal_type, error = %source, "sample fetch failed");
                    RiskError::Fetch {
                        member_id: member_id.to_string(),
                        signal_type,
                        source,
                    }
                })?;
            let samples = cap_most_recent(samples, self.config.max_samples_per_fetch);

            match analyzer.evaluate(&samples, self.config.recent_window_samples) {
                Some(factor) => {
                    debug!(
                        member_id,
                        analyzer = analyzer.name(),
                        samples = samples.len(),
                        severity = factor.severity,
                        "factor detected"
                    );
                    factors.push(factor);
                }
                None => debug!(
                    member_id,
                    analyzer = analyzer.name(),
                    samples = samples.len(),
                    min_samples = analyzer.min_samples(),
                    "no factor"
                ),
            }
        }

        Ok(factors)
    }
}

/// Keep at most `max` samples, dropping the oldest
fn cap_most_recent(mut samples: Vec<Sample>, max: usize) -> Vec<Sample> {
    if samples.len() > max {
        let excess = samples.len() - max;
        samples.sort_by_key(|s| s.timestamp);
        samples.drain(..excess);
    }
    samples
}

/// Assemble a risk event from detected factors.
///
/// Pure: score, tier, explanation and actions depend only on `factors`.
/// An empty factor list yields `None`.
pub fn assess(
    member_id: &str,
    org_id: &str,
    factors: Vec<Factor>,
    explainer: &dyn ExplanationStrategy,
    detected_at: DateTime<Utc>,
    metadata: BTreeMap<String, serde_json::Value>,
) -> Option<RiskEvent> {
    if factors.is_empty() {
        return None;
    }

    let score = composite_score(&factors);
    let tier = classify_tier(score, factors.len());
    let explanation_text = explainer.explain(&factors, tier);
    let suggested_actions = suggest_actions(tier, &factors);

    Some(RiskEvent {
        id: Uuid::new_v4().to_string(),
        member_id: member_id.to_string(),
        org_id: org_id.to_string(),
        tier,
        score,
        factors,
        explanation_text,
        suggested_actions,
        status: EventStatus::New,
        assignee_id: None,
        caregiver_notes: None,
        detected_at,
        acknowledged_at: None,
        resolved_at: None,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::SignalAnalyzer;
    use crate::error::SourceError;
    use crate::source::InMemorySampleSource;
    use crate::types::{FactorKind, SignalType, Tier};
    use crate::window::SampleWindow;
    use chrono::TimeZone;
    use std::sync::Arc;

    const MEMBER: &str = "member-001";
    const ORG: &str = "demo-org-001";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    /// Daily samples ending the day before `now()`, oldest first
    fn daily(signal_type: SignalType, values: &[f64]) -> Vec<Sample> {
        let n = values.len() as i64;
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let ts = now() - Duration::days(n - i as i64);
                Sample::numeric(MEMBER, signal_type, *v, ts).with_source("mock")
            })
            .collect()
    }

    fn drop_series(baseline: f64, n_base: usize, recent: f64) -> Vec<f64> {
        let mut values = vec![baseline; n_base];
        values.extend(std::iter::repeat(recent).take(7));
        values
    }

    fn healthy_source() -> InMemorySampleSource {
        let mut source = InMemorySampleSource::default();
        source.extend(daily(SignalType::Hrv, &[58.0; 21]));
        source.extend(daily(SignalType::SleepEfficiency, &[0.88; 21]));
        source.extend(daily(SignalType::Steps, &[8000.0; 21]));
        source
    }

    struct FailingSource;

    impl SampleSource for FailingSource {
        fn fetch(
            &self,
            _member_id: &str,
            signal_type: SignalType,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<Sample>, SourceError> {
            if signal_type == SignalType::SleepEfficiency {
                Err(SourceError::Timeout("metric_samples query".to_string()))
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[test]
    fn test_scenario_a_single_variability_factor() {
        let mut source = InMemorySampleSource::default();
        source.extend(daily(SignalType::Hrv, &drop_series(60.0, 14, 45.0)));
        source.extend(daily(SignalType::SleepEfficiency, &[0.88; 21]));
        source.extend(daily(SignalType::Steps, &[8000.0; 21]));

        let engine = RiskEngine::new(source);
        let event = engine.evaluate_at(MEMBER, ORG, now()).unwrap().unwrap();

        assert_eq!(event.factors.len(), 1);
        assert_eq!(event.factors[0].kind, FactorKind::VariabilityDrop);
        assert!((event.factors[0].delta.unwrap() + 0.25).abs() < 1e-9);

        let severity = 0.25 / 0.30;
        assert!((event.score - severity * 100.0 * 0.8).abs() < 1e-9);
        assert_eq!(event.tier, Tier::Elevated);
        assert_eq!(event.status, EventStatus::New);
        assert_eq!(event.member_id, MEMBER);
        assert_eq!(event.org_id, ORG);
        assert_eq!(event.detected_at, now());
        assert_eq!(
            event.explanation_text,
            "⚡ Wellness alert: 7-day variability down 25% vs baseline."
        );
        assert_eq!(event.metadata["lookback_days"], 30);
    }

    #[test]
    fn test_scenario_d_no_factors() {
        let engine = RiskEngine::new(healthy_source());
        assert!(engine.evaluate_at(MEMBER, ORG, now()).unwrap().is_none());
    }

    #[test]
    fn test_insufficient_data_yields_none() {
        let mut source = InMemorySampleSource::default();
        source.extend(daily(SignalType::Hrv, &[60.0, 60.0, 20.0, 20.0, 20.0, 20.0]));
        source.extend(daily(SignalType::SleepEfficiency, &[0.5, 0.5, 0.5]));
        source.extend(daily(SignalType::Steps, &drop_series(9000.0, 6, 1000.0)));

        let engine = RiskEngine::new(source);
        assert!(engine.evaluate_at(MEMBER, ORG, now()).unwrap().is_none());
    }

    #[test]
    fn test_three_factors_are_critical_in_invocation_order() {
        let mut source = InMemorySampleSource::default();
        source.extend(daily(SignalType::Steps, &drop_series(10000.0, 14, 6000.0)));
        source.extend(daily(SignalType::SleepEfficiency, &[0.70; 10]));
        source.extend(daily(SignalType::Hrv, &drop_series(60.0, 14, 48.0)));

        let engine = RiskEngine::new(source);
        let event = engine.evaluate_at(MEMBER, ORG, now()).unwrap().unwrap();

        let kinds: Vec<FactorKind> = event.factors.iter().map(|f| f.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                FactorKind::VariabilityDrop,
                FactorKind::SleepEfficiencyLow,
                FactorKind::ActivityDecline
            ]
        );
        assert_eq!(event.tier, Tier::Critical);
        assert!(event.explanation_text.starts_with("⚠️ Multiple wellness concerns detected: 7-day variability"));
        assert_eq!(event.suggested_actions.len(), 6);
        assert!((0.0..=100.0).contains(&event.score));
    }

    #[test]
    fn test_samples_outside_lookback_are_ignored() {
        let mut source = healthy_source();
        // A steep drop 40 days ago must not count as recent data
        let old = now() - Duration::days(40);
        for i in 0..10 {
            source.insert(Sample::numeric(MEMBER, SignalType::Hrv, 5.0, old - Duration::hours(i)));
        }

        let engine = RiskEngine::new(source);
        assert!(engine.evaluate_at(MEMBER, ORG, now()).unwrap().is_none());
    }

    #[test]
    fn test_fetch_failure_propagates_with_context() {
        let engine = RiskEngine::new(FailingSource);
        let err = engine.evaluate_at(MEMBER, ORG, now()).unwrap_err();

        match err {
            RiskError::Fetch {
                member_id,
                signal_type,
                source,
            } => {
                assert_eq!(member_id, MEMBER);
                assert_eq!(signal_type, SignalType::SleepEfficiency);
                assert!(matches!(source, SourceError::Timeout(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_idempotent_evaluation() {
        let mut source = InMemorySampleSource::default();
        source.extend(daily(SignalType::Hrv, &drop_series(62.0, 20, 40.0)));
        source.extend(daily(SignalType::SleepEfficiency, &[0.72, 0.9, 0.7, 0.74, 0.76, 0.9, 0.7]));
        let engine = RiskEngine::new(Arc::new(source));

        let first = engine.evaluate_at(MEMBER, ORG, now()).unwrap().unwrap();
        let second = engine.evaluate_at(MEMBER, ORG, now()).unwrap().unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.score, second.score);
        assert_eq!(first.tier, second.tier);
        assert_eq!(first.factors, second.factors);
        assert_eq!(first.explanation_text, second.explanation_text);
        assert_eq!(first.suggested_actions, second.suggested_actions);
    }

    #[test]
    fn test_evaluate_uses_current_time() {
        let mut source = InMemorySampleSource::default();
        let today = Utc::now();
        let values = drop_series(60.0, 14, 30.0);
        let n = values.len() as i64;
        for (i, v) in values.iter().enumerate() {
            let ts = today - Duration::days(n - i as i64);
            source.insert(Sample::numeric(MEMBER, SignalType::Hrv, *v, ts));
        }

        let engine = RiskEngine::new(source);
        let event = engine.evaluate(MEMBER, ORG).unwrap().unwrap();
        assert_eq!(event.factors[0].severity, Some(1.0));
    }

    #[test]
    fn test_custom_analyzer_and_explainer() {
        struct RestingHrRise;

        impl SignalAnalyzer for RestingHrRise {
            fn name(&self) -> &str {
                "resting_hr"
            }
            fn signal_type(&self) -> SignalType {
                SignalType::RestingHr
            }
            fn min_samples(&self) -> usize {
                3
            }
            fn analyze(&self, window: &SampleWindow) -> Option<Factor> {
                let recent = window.recent_mean()?;
                (recent > 80.0).then(|| {
                    Factor::new(FactorKind::Custom("resting_hr_rise".to_string()))
                        .with_severity(0.9)
                })
            }
        }

        struct Terse;

        impl ExplanationStrategy for Terse {
            fn explain(&self, factors: &[Factor], tier: Tier) -> String {
                format!("{tier}: {} factor(s)", factors.len())
            }
        }

        let mut source = InMemorySampleSource::default();
        source.extend(daily(SignalType::RestingHr, &[85.0, 88.0, 90.0]));

        let mut registry = AnalyzerRegistry::standard(&EngineConfig::default());
        registry.register(RestingHrRise);
        let engine = RiskEngine::new(source)
            .with_registry(registry)
            .with_explainer(Terse);

        let event = engine.evaluate_at(MEMBER, ORG, now()).unwrap().unwrap();
        assert_eq!(event.explanation_text, "critical: 1 factor(s)");
        assert!((event.score - 72.0).abs() < 1e-9);
        assert_eq!(event.tier, Tier::Critical);
    }

    #[test]
    fn test_fetch_cap_keeps_recent_samples() {
        let mut config = EngineConfig::default();
        config.max_samples_per_fetch = 14;
        // Only the 14 newest samples survive: 7 baseline at 60, 7 recent at 45
        let mut values = vec![10.0; 10];
        values.extend(drop_series(60.0, 7, 45.0));

        let mut source = InMemorySampleSource::default();
        source.extend(daily(SignalType::Hrv, &values));
        let engine = RiskEngine::with_config(source, config).unwrap();

        let event = engine.evaluate_at(MEMBER, ORG, now()).unwrap().unwrap();
        assert_eq!(event.factors[0].baseline_value, Some(60.0));
    }

    #[test]
    fn test_assess_empty_factors() {
        let event = assess(MEMBER, ORG, Vec::new(), &TemplateExplainer, now(), BTreeMap::new());
        assert!(event.is_none());
    }

    #[test]
    fn test_lookback_before_earliest_time_is_config_error() {
        let engine = RiskEngine::new(healthy_source());
        let err = engine
            .evaluate_at(MEMBER, ORG, DateTime::<Utc>::MIN_UTC)
            .unwrap_err();
        assert!(matches!(err, RiskError::Config(_)));
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let mut config = EngineConfig::default();
        config.lookback_days = 0;
        assert!(RiskEngine::with_config(InMemorySampleSource::default(), config.clone()).is_err());

        config.lookback_days = 1_000_000_000_000_000;
        assert!(RiskEngine::with_config(InMemorySampleSource::default(), config).is_err());
    }
}
