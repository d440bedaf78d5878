//! Synheart Risk - Rule-based wellness risk detection over wearable signals
//!
//! Risk compares each member's recent readings against their own baseline and
//! turns significant deviations into scored, tiered, explained risk events:
//! sample fetch → signal analysis → composite scoring → tier classification
//! → explanation and action synthesis.
//!
//! ## Modules
//!
//! - **Engine**: Orchestrates analyzers over a pluggable [`SampleSource`]
//! - **Analyzers**: Per-signal factor detection (variability, sleep, activity)
//! - **Workflow**: Care-team status changes on produced events
//! - **Synthetic**: Seeded demo data for each health pattern

pub mod actions;
pub mod analyzers;
pub mod config;
pub mod engine;
pub mod error;
pub mod explain;
pub mod scoring;
pub mod source;
pub mod synthetic;
pub mod types;
pub mod window;
pub mod workflow;

pub use analyzers::{AnalyzerRegistry, PoorNightsAnalyzer, RelativeDropAnalyzer, SignalAnalyzer};
pub use config::EngineConfig;
pub use engine::{assess, RiskEngine};
pub use error::{RiskError, SourceError};
pub use explain::{ExplanationStrategy, TemplateExplainer};
pub use source::{InMemorySampleSource, SampleSource};
pub use types::{EventStatus, Factor, FactorKind, RiskEvent, Sample, SignalType, Tier};

/// Engine version recorded in event metadata
pub const RISK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for emitted events
pub const PRODUCER_NAME: &str = "synheart-risk";
