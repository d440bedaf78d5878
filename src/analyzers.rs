//! Signal analyzers
//!
//! Each analyzer watches one signal type and turns a lookback window of samples
//! into zero or one [`Factor`]. Analyzers are held in an [`AnalyzerRegistry`];
//! registration order is invocation order, which fixes factor order in events.

use crate::config::{EngineConfig, RelativeDropPolicy, SleepPolicy};
use crate::types::{Factor, FactorKind, Sample, SignalType};
use crate::window::{mean, relative_delta, SampleWindow};

/// Trait for per-signal deviation detectors
pub trait SignalAnalyzer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Signal type fetched for this analyzer
    fn signal_type(&self) -> SignalType;

    /// Fewest fetched samples needed for a meaningful judgement
    fn min_samples(&self) -> usize;

    /// Apply the trigger rule to a split window
    fn analyze(&self, window: &SampleWindow) -> Option<Factor>;

    /// Check the sample count, split the window and apply the trigger rule.
    ///
    /// Too few samples is not an error; it yields no factor.
    fn evaluate(&self, samples: &[Sample], recent_len: usize) -> Option<Factor> {
        if samples.len() < self.min_samples() {
            return None;
        }
        let window = SampleWindow::split(samples, recent_len);
        self.analyze(&window)
    }
}

/// Triggers when the recent mean falls a given fraction below the baseline mean
#[derive(Debug, Clone)]
pub struct RelativeDropAnalyzer {
    name: &'static str,
    kind: FactorKind,
    signal_type: SignalType,
    policy: RelativeDropPolicy,
}

impl RelativeDropAnalyzer {
    pub fn new(
        name: &'static str,
        kind: FactorKind,
        signal_type: SignalType,
        policy: RelativeDropPolicy,
    ) -> Self {
        Self {
            name,
            kind,
            signal_type,
            policy,
        }
    }

    /// Heart-rate variability drop
    pub fn variability(policy: RelativeDropPolicy) -> Self {
        Self::new("variability", FactorKind::VariabilityDrop, SignalType::Hrv, policy)
    }

    /// Daily step count decline
    pub fn activity(policy: RelativeDropPolicy) -> Self {
        Self::new("activity", FactorKind::ActivityDecline, SignalType::Steps, policy)
    }
}

impl SignalAnalyzer for RelativeDropAnalyzer {
    fn name(&self) -> &str {
        self.name
    }

    fn signal_type(&self) -> SignalType {
        self.signal_type
    }

    fn min_samples(&self) -> usize {
        self.policy.min_samples
    }

    fn analyze(&self, window: &SampleWindow) -> Option<Factor> {
        let recent = window.recent_mean()?;
        let baseline = window.baseline_mean()?;
        let delta = relative_delta(recent, baseline);

        // A NaN delta must not trigger
        if delta >= 0.0 || !(delta <= -self.policy.drop_threshold) {
            return None;
        }

        Some(Factor {
            kind: self.kind.clone(),
            window_days: Some(window.recent_len as u32),
            delta: Some(delta),
            threshold: None,
            actual_value: Some(recent),
            baseline_value: Some(baseline),
            severity: Some((delta.abs() / self.policy.saturation).min(1.0)),
        })
    }
}

/// Triggers when enough recent nights fall below an absolute efficiency floor
#[derive(Debug, Clone)]
pub struct PoorNightsAnalyzer {
    policy: SleepPolicy,
}

impl PoorNightsAnalyzer {
    pub fn new(policy: SleepPolicy) -> Self {
        Self { policy }
    }
}

impl SignalAnalyzer for PoorNightsAnalyzer {
    fn name(&self) -> &str {
        "sleep"
    }

    fn signal_type(&self) -> SignalType {
        SignalType::SleepEfficiency
    }

    fn min_samples(&self) -> usize {
        self.policy.min_samples
    }

    fn analyze(&self, window: &SampleWindow) -> Option<Factor> {
        let average = mean(&window.recent)?;
        let poor_nights = window
            .recent
            .iter()
            .filter(|eff| **eff < self.policy.efficiency_floor)
            .count();

        if poor_nights < self.policy.min_poor_nights {
            return None;
        }

        let nights = window.recent_len.max(1) as f64;
        Some(Factor {
            kind: FactorKind::SleepEfficiencyLow,
            window_days: Some(window.recent_len as u32),
            delta: None,
            threshold: Some(self.policy.efficiency_floor),
            actual_value: Some(average),
            baseline_value: None,
            severity: Some((poor_nights as f64 / nights).min(1.0)),
        })
    }
}

/// Ordered set of analyzers run by the engine
pub struct AnalyzerRegistry {
    analyzers: Vec<Box<dyn SignalAnalyzer>>,
}

impl AnalyzerRegistry {
    /// Empty registry
    pub fn empty() -> Self {
        Self {
            analyzers: Vec::new(),
        }
    }

    /// Variability, sleep and activity analyzers, in that order
    pub fn standard(config: &EngineConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(RelativeDropAnalyzer::variability(config.variability.clone()));
        registry.register(PoorNightsAnalyzer::new(config.sleep.clone()));
        registry.register(RelativeDropAnalyzer::activity(config.activity.clone()));
        registry
    }

    /// Append an analyzer; it runs after all previously registered ones
    pub fn register(&mut self, analyzer: impl SignalAnalyzer + 'static) -> &mut Self {
        self.analyzers.push(Box::new(analyzer));
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Box<dyn SignalAnalyzer>> {
        self.analyzers.iter()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::standard(&EngineConfig::default())
    }
}
