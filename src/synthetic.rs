//! Synthetic member data
//!
//! Generates daily wearable samples that follow a named health pattern. Output
//! is reproducible for a given seed: the ChaCha8 stream is value-stable across
//! releases, which makes it usable both for demos and as test fixtures.

use crate::types::{Sample, SignalType};
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source identifier stamped on generated samples
pub const SYNTHETIC_SOURCE: &str = "mock";

/// Health trajectory for a synthetic member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthPattern {
    Healthy,
    DecliningVariability,
    PoorSleep,
    LowActivity,
    MixedConcerns,
}

impl HealthPattern {
    pub const ALL: [HealthPattern; 5] = [
        HealthPattern::Healthy,
        HealthPattern::DecliningVariability,
        HealthPattern::PoorSleep,
        HealthPattern::LowActivity,
        HealthPattern::MixedConcerns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthPattern::Healthy => "healthy",
            HealthPattern::DecliningVariability => "declining_variability",
            HealthPattern::PoorSleep => "poor_sleep",
            HealthPattern::LowActivity => "low_activity",
            HealthPattern::MixedConcerns => "mixed_concerns",
        }
    }
}

impl fmt::Display for HealthPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HealthPattern::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown health pattern: {s}"))
    }
}

/// Per-day base values before noise
struct DayBase {
    hrv: f64,
    sleep_efficiency: f64,
    steps: f64,
}

fn day_base(pattern: HealthPattern, day: usize, rng: &mut ChaCha8Rng) -> DayBase {
    let d = day as f64;
    match pattern {
        HealthPattern::Healthy => DayBase {
            hrv: rng.gen_range(50.0..65.0),
            sleep_efficiency: rng.gen_range(0.82..0.92),
            steps: rng.gen_range(6000.0..10000.0),
        },
        HealthPattern::DecliningVariability => DayBase {
            hrv: rng.gen_range(55.0..65.0_f64) - d * 0.8,
            sleep_efficiency: rng.gen_range(0.80..0.88),
            steps: rng.gen_range(5000.0..8000.0),
        },
        HealthPattern::PoorSleep => DayBase {
            hrv: rng.gen_range(48.0..58.0),
            sleep_efficiency: if rng.gen_bool(0.7) {
                rng.gen_range(0.60..0.75)
            } else {
                rng.gen_range(0.80..0.85)
            },
            steps: rng.gen_range(4000.0..7000.0),
        },
        HealthPattern::LowActivity => DayBase {
            hrv: rng.gen_range(45.0..55.0),
            sleep_efficiency: rng.gen_range(0.80..0.88),
            steps: rng.gen_range(7000.0..9000.0_f64) - d * 160.0,
        },
        HealthPattern::MixedConcerns => DayBase {
            hrv: rng.gen_range(48.0..58.0_f64) - d * 0.7,
            sleep_efficiency: rng.gen_range(0.65..0.75),
            steps: rng.gen_range(5000.0..8000.0_f64) - d * 120.0,
        },
    }
}

/// Generate `days` days of samples ending the day before `end`.
///
/// Daily hrv, sleep efficiency, steps and heart rate; weekly weight.
pub fn generate(
    member_id: &str,
    pattern: HealthPattern,
    end: DateTime<Utc>,
    days: usize,
    seed: u64,
) -> Vec<Sample> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut samples = Vec::with_capacity(days * 5);

    for day in 0..days {
        let timestamp = end - Duration::days((days - day) as i64);
        let base = day_base(pattern, day, &mut rng);

        let hrv = (base.hrv + rng.gen_range(-3.0..3.0_f64)).max(30.0);
        let efficiency = (base.sleep_efficiency + rng.gen_range(-0.05..0.05_f64)).clamp(0.5, 1.0);
        let steps = (base.steps + rng.gen_range(-500.0..500.0_f64)).max(1000.0).round();
        let heart_rate = f64::from(rng.gen_range(60..=85_u32));

        samples.push(numeric(member_id, SignalType::Hrv, hrv, "ms", timestamp, day));
        samples.push(numeric(
            member_id,
            SignalType::SleepEfficiency,
            efficiency,
            "ratio",
            timestamp,
            day,
        ));
        samples.push(numeric(member_id, SignalType::Steps, steps, "steps", timestamp, day));
        samples.push(numeric(
            member_id,
            SignalType::HeartRate,
            heart_rate,
            "bpm",
            timestamp,
            day,
        ));

        if day % 7 == 0 {
            let weight = rng.gen_range(65.0..85.0);
            samples.push(numeric(member_id, SignalType::Weight, weight, "kg", timestamp, day));
        }
    }

    samples
}

fn numeric(
    member_id: &str,
    signal_type: SignalType,
    value: f64,
    unit: &str,
    timestamp: DateTime<Utc>,
    day: usize,
) -> Sample {
    let mut sample = Sample::numeric(member_id, signal_type, value, timestamp)
        .with_unit(unit)
        .with_source(SYNTHETIC_SOURCE);
    sample.id = format!("{member_id}-{signal_type}-{day}");
    sample.ingested_at = timestamp;
    sample
}
