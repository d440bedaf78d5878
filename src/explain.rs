//! Explanation synthesis
//!
//! Renders factors and tier into deterministic prose. The renderer sits behind
//! [`ExplanationStrategy`] so another narrative style can replace the templates
//! without touching scoring or classification.

use crate::config::DEFAULT_RECENT_WINDOW_SAMPLES;
use crate::types::{Factor, FactorKind, Tier};

pub const CRITICAL_PREFIX: &str = "⚠️ Multiple wellness concerns detected: ";
pub const ELEVATED_PREFIX: &str = "⚡ Wellness alert: ";
pub const NORMAL_PREFIX: &str = "✓ Wellness check: ";

/// Text used when there is nothing to explain
pub const ALL_CLEAR_TEXT: &str = "All wellness indicators are within normal range.";

/// Trait for turning an assessment into human-readable text
pub trait ExplanationStrategy: Send + Sync {
    fn explain(&self, factors: &[Factor], tier: Tier) -> String;
}

/// Template-based explainer
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateExplainer;

impl TemplateExplainer {
    pub fn new() -> Self {
        Self
    }

    fn prefix(tier: Tier) -> &'static str {
        match tier {
            Tier::Critical => CRITICAL_PREFIX,
            Tier::Elevated => ELEVATED_PREFIX,
            Tier::Normal => NORMAL_PREFIX,
        }
    }
}

impl ExplanationStrategy for TemplateExplainer {
    fn explain(&self, factors: &[Factor], tier: Tier) -> String {
        if factors.is_empty() {
            return ALL_CLEAR_TEXT.to_string();
        }

        let clauses: Vec<String> = factors.iter().map(render_clause).collect();
        format!("{}{}.", Self::prefix(tier), clauses.join("; "))
    }
}

/// One clause per factor, keyed by factor kind
fn render_clause(factor: &Factor) -> String {
    let delta_pct = factor.delta.unwrap_or(0.0).abs() * 100.0;
    let actual = factor.actual_value.unwrap_or(0.0);

    match &factor.kind {
        FactorKind::VariabilityDrop => {
            let window = factor
                .window_days
                .unwrap_or(DEFAULT_RECENT_WINDOW_SAMPLES as u32);
            format!("{window}-day variability down {delta_pct:.0}% vs baseline")
        }
        FactorKind::SleepEfficiencyLow => {
            format!("Poor sleep efficiency in recent nights (avg {actual:.2})")
        }
        FactorKind::ActivityDecline => {
            format!("Activity level down {delta_pct:.0}% (recent avg: {actual:.0} steps)")
        }
        FactorKind::Custom(name) => match factor.delta {
            Some(delta) => format!("{name} changed {:+.0}% vs baseline", delta * 100.0),
            None => format!("{name} outside expected range"),
        },
    }
}
