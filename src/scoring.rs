//! Composite scoring and tier classification
//!
//! Both functions are pure: the score depends only on the factor list and the
//! tier only on `(score, factor_count)`.

use crate::types::{Factor, Tier};

/// Severity assumed for factors that carry none
pub const DEFAULT_FACTOR_SEVERITY: f64 = 0.5;

/// Factor count at which the corroboration multiplier reaches 1.0
pub const FULL_CORROBORATION_COUNT: usize = 3;

pub const CRITICAL_SCORE: f64 = 70.0;
pub const ELEVATED_SCORE: f64 = 40.0;
pub const CRITICAL_FACTOR_COUNT: usize = 3;
pub const ELEVATED_FACTOR_COUNT: usize = 2;

/// Multiplier rewarding concurrent factors: `0.7 + 0.3 * min(n / 3, 1)`,
/// i.e. 0.8 for one factor, 0.9 for two and 1.0 from three
pub fn count_boost(factor_count: usize) -> f64 {
    let weight = (factor_count as f64 / FULL_CORROBORATION_COUNT as f64).min(1.0);
    0.7 + 0.3 * weight
}

/// Composite risk score (0-100) from a factor list
pub fn composite_score(factors: &[Factor]) -> f64 {
    if factors.is_empty() {
        return 0.0;
    }

    let total_severity: f64 = factors
        .iter()
        .map(|f| f.severity.unwrap_or(DEFAULT_FACTOR_SEVERITY).clamp(0.0, 1.0))
        .sum();
    let mean_severity = total_severity / factors.len() as f64;

    (mean_severity * 100.0 * count_boost(factors.len())).clamp(0.0, 100.0)
}

/// Tier from score and factor count; first matching guard wins
pub fn classify_tier(score: f64, factor_count: usize) -> Tier {
    if score >= CRITICAL_SCORE || factor_count >= CRITICAL_FACTOR_COUNT {
        Tier::Critical
    } else if score >= ELEVATED_SCORE || factor_count >= ELEVATED_FACTOR_COUNT {
        Tier::Elevated
    } else {
        Tier::Normal
    }
}
