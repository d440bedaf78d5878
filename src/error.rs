//! Error types for Synheart Risk

use crate::types::{EventStatus, SignalType};
use thiserror::Error;

/// Errors reported by a sample source while fetching a window.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("Sample store unavailable: {0}")]
    Unavailable(String),

    #[error("Sample fetch timed out: {0}")]
    Timeout(String),

    #[error("Sample query failed: {0}")]
    Query(String),
}

/// Errors that can occur during risk evaluation
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Failed to fetch {signal_type} samples for member {member_id}: {source}")]
    Fetch {
        member_id: String,
        signal_type: SignalType,
        #[source]
        source: SourceError,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse samples: {0}")]
    Parse(String),

    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: EventStatus, to: EventStatus },
}
