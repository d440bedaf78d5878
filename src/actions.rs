//! Action recommendation
//!
//! Base actions come from the tier, followed by factor-specific actions in a
//! fixed check order (sleep, activity, variability) regardless of factor order.

use crate::types::{Factor, FactorKind, Tier};

pub const CONTACT_IMMEDIATELY: &str = "Contact member immediately";
pub const SCHEDULE_CARE_REVIEW: &str = "Schedule care team review";
pub const CHECK_RECENT_CHANGES: &str = "Check for recent health changes";
pub const CHECK_IN_24H: &str = "Check in with member within 24 hours";
pub const REVIEW_PATTERNS: &str = "Review recent activities and sleep patterns";
pub const CONTINUE_MONITORING: &str = "Continue monitoring";

pub const DISCUSS_SLEEP: &str = "Discuss sleep quality and environment";
pub const ENCOURAGE_ACTIVITY: &str = "Encourage light physical activity";
pub const CHECK_STRESS: &str = "Check for stress or illness symptoms";

fn base_actions(tier: Tier) -> &'static [&'static str] {
    match tier {
        Tier::Critical => &[CONTACT_IMMEDIATELY, SCHEDULE_CARE_REVIEW, CHECK_RECENT_CHANGES],
        Tier::Elevated => &[CHECK_IN_24H, REVIEW_PATTERNS],
        Tier::Normal => &[CONTINUE_MONITORING],
    }
}

/// Factor-specific actions, in check order
const FACTOR_ACTIONS: [(FactorKind, &str); 3] = [
    (FactorKind::SleepEfficiencyLow, DISCUSS_SLEEP),
    (FactorKind::ActivityDecline, ENCOURAGE_ACTIVITY),
    (FactorKind::VariabilityDrop, CHECK_STRESS),
];

/// Ordered, de-duplicated list of suggested actions
pub fn suggest_actions(tier: Tier, factors: &[Factor]) -> Vec<String> {
    let mut actions: Vec<String> = base_actions(tier).iter().map(|a| a.to_string()).collect();

    for (kind, action) in &FACTOR_ACTIONS {
        if factors.iter().any(|f| &f.kind == kind) && !actions.iter().any(|a| a == action) {
            actions.push(action.to_string());
        }
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_critical_with_all_factors() {
        let factors = vec![
            Factor::new(FactorKind::VariabilityDrop),
            Factor::new(FactorKind::SleepEfficiencyLow),
            Factor::new(FactorKind::ActivityDecline),
        ];
        assert_eq!(
            suggest_actions(Tier::Critical, &factors),
            vec![
                CONTACT_IMMEDIATELY,
                SCHEDULE_CARE_REVIEW,
                CHECK_RECENT_CHANGES,
                DISCUSS_SLEEP,
                ENCOURAGE_ACTIVITY,
                CHECK_STRESS,
            ]
        );
    }

    #[test]
    fn test_additive_order_ignores_factor_order() {
        let factors = vec![
            Factor::new(FactorKind::VariabilityDrop),
            Factor::new(FactorKind::ActivityDecline),
        ];
        assert_eq!(
            suggest_actions(Tier::Elevated, &factors),
            vec![CHECK_IN_24H, REVIEW_PATTERNS, ENCOURAGE_ACTIVITY, CHECK_STRESS]
        );
    }

    #[test]
    fn test_normal_tier() {
        let factors = vec![Factor::new(FactorKind::SleepEfficiencyLow)];
        assert_eq!(
            suggest_actions(Tier::Normal, &factors),
            vec![CONTINUE_MONITORING, DISCUSS_SLEEP]
        );
        assert_eq!(suggest_actions(Tier::Normal, &[]), vec![CONTINUE_MONITORING]);
    }

    #[test]
    fn test_no_duplicates() {
        let factors = vec![
            Factor::new(FactorKind::SleepEfficiencyLow),
            Factor::new(FactorKind::SleepEfficiencyLow),
            Factor::new(FactorKind::Custom("weight_gain".to_string())),
        ];
        let actions = suggest_actions(Tier::Elevated, &factors);
        let mut deduped = actions.clone();
        deduped.dedup();
        assert_eq!(actions, deduped);
        assert_eq!(actions.len(), 3);
    }
}
