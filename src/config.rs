//! Engine configuration
//!
//! Policy constants for the risk engine. The defaults reproduce the production
//! policy exactly; a JSON file may override any subset of them.

use crate::error::RiskError;
use serde::{Deserialize, Serialize};

/// Days of history fetched per evaluation
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Longest accepted lookback window (about a century)
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

/// Number of most recent samples forming the recent sub-window
pub const DEFAULT_RECENT_WINDOW_SAMPLES: usize = 7;

/// Cap on samples requested per fetch
pub const DEFAULT_MAX_SAMPLES_PER_FETCH: usize = 1000;

pub const VARIABILITY_MIN_SAMPLES: usize = 7;
pub const VARIABILITY_DROP_THRESHOLD: f64 = 0.15;
pub const VARIABILITY_SATURATION: f64 = 0.30;

pub const SLEEP_MIN_SAMPLES: usize = 4;
pub const SLEEP_EFFICIENCY_FLOOR: f64 = 0.78;
pub const SLEEP_MIN_POOR_NIGHTS: usize = 4;

pub const ACTIVITY_MIN_SAMPLES: usize = 14;
pub const ACTIVITY_DROP_THRESHOLD: f64 = 0.25;
pub const ACTIVITY_SATURATION: f64 = 0.40;

/// Policy for analyzers that compare recent vs baseline means
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeDropPolicy {
    /// Minimum samples in the lookback window
    pub min_samples: usize,
    /// Relative drop (0-1) that triggers a factor
    pub drop_threshold: f64,
    /// Relative drop at which severity saturates to 1.0
    pub saturation: f64,
}

/// Policy for the poor-nights sleep analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepPolicy {
    pub min_samples: usize,
    /// Nights with efficiency strictly below this are poor
    pub efficiency_floor: f64,
    /// Poor nights within the recent window that trigger a factor
    pub min_poor_nights: usize,
}

impl Default for SleepPolicy {
    fn default() -> Self {
        Self {
            min_samples: SLEEP_MIN_SAMPLES,
            efficiency_floor: SLEEP_EFFICIENCY_FLOOR,
            min_poor_nights: SLEEP_MIN_POOR_NIGHTS,
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub lookback_days: i64,
    pub recent_window_samples: usize,
    pub max_samples_per_fetch: usize,
    pub variability: RelativeDropPolicy,
    pub sleep: SleepPolicy,
    pub activity: RelativeDropPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            recent_window_samples: DEFAULT_RECENT_WINDOW_SAMPLES,
            max_samples_per_fetch: DEFAULT_MAX_SAMPLES_PER_FETCH,
            variability: RelativeDropPolicy {
                min_samples: VARIABILITY_MIN_SAMPLES,
                drop_threshold: VARIABILITY_DROP_THRESHOLD,
                saturation: VARIABILITY_SATURATION,
            },
            sleep: SleepPolicy::default(),
            activity: RelativeDropPolicy {
                min_samples: ACTIVITY_MIN_SAMPLES,
                drop_threshold: ACTIVITY_DROP_THRESHOLD,
                saturation: ACTIVITY_SATURATION,
            },
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, RiskError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, RiskError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every policy value is usable
    pub fn validate(&self) -> Result<(), RiskError> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(RiskError::Config(format!(
                "lookback_days must be within 1-{MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            )));
        }
        if self.recent_window_samples == 0 {
            return Err(RiskError::Config(
                "recent_window_samples must be at least 1".to_string(),
            ));
        }
        if self.max_samples_per_fetch == 0 {
            return Err(RiskError::Config(
                "max_samples_per_fetch must be at least 1".to_string(),
            ));
        }
        for (name, policy) in [("variability", &self.variability), ("activity", &self.activity)] {
            if !(policy.saturation > 0.0 && policy.saturation.is_finite()) {
                return Err(RiskError::Config(format!(
                    "{name}.saturation must be a positive number"
                )));
            }
            if !(0.0..=1.0).contains(&policy.drop_threshold) {
                return Err(RiskError::Config(format!(
                    "{name}.drop_threshold must be within 0-1"
                )));
            }
        }
        if self.sleep.min_poor_nights == 0 || self.sleep.min_poor_nights > self.recent_window_samples
        {
            return Err(RiskError::Config(format!(
                "sleep.min_poor_nights must be within 1-{}",
                self.recent_window_samples
            )));
        }
        Ok(())
    }
}
