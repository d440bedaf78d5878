//! Risk event workflow
//!
//! Status changes and assignment applied by care teams after an event has been
//! produced. The engine never calls into this module.
//!
//! Lifecycle: new → acknowledged → in_progress → resolved, with dismissed
//! reachable from any open status. Resolved and dismissed are terminal.

use crate::error::RiskError;
use crate::types::{EventStatus, RiskEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Partial update to a risk event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caregiver_notes: Option<String>,
}

impl EventUpdate {
    pub fn status(status: EventStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Whether `from -> to` is a legal status change
pub fn can_transition(from: EventStatus, to: EventStatus) -> bool {
    use EventStatus::*;

    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (New, Acknowledged)
            | (New, InProgress)
            | (Acknowledged, InProgress)
            | (Acknowledged, Resolved)
            | (InProgress, Resolved)
            | (New | Acknowledged | InProgress, Dismissed)
    )
}

/// Apply an update, stamping acknowledgement and resolution times
pub fn apply_update(
    event: &mut RiskEvent,
    update: EventUpdate,
    now: DateTime<Utc>,
) -> Result<(), RiskError> {
    if let Some(to) = update.status {
        let from = event.status;
        if !can_transition(from, to) {
            return Err(RiskError::InvalidTransition { from, to });
        }

        match to {
            EventStatus::Acknowledged | EventStatus::InProgress => {
                event.acknowledged_at.get_or_insert(now);
            }
            EventStatus::Resolved => {
                event.acknowledged_at.get_or_insert(now);
                event.resolved_at.get_or_insert(now);
            }
            EventStatus::New | EventStatus::Dismissed => {}
        }
        event.status = to;
    }

    if let Some(assignee_id) = update.assignee_id {
        event.assignee_id = Some(assignee_id);
    }
    if let Some(notes) = update.caregiver_notes {
        event.caregiver_notes = Some(notes);
    }

    Ok(())
}

pub fn acknowledge(event: &mut RiskEvent, now: DateTime<Utc>) -> Result<(), RiskError> {
    apply_update(event, EventUpdate::status(EventStatus::Acknowledged), now)
}

pub fn start(event: &mut RiskEvent, now: DateTime<Utc>) -> Result<(), RiskError> {
    apply_update(event, EventUpdate::status(EventStatus::InProgress), now)
}

pub fn resolve(event: &mut RiskEvent, now: DateTime<Utc>) -> Result<(), RiskError> {
    apply_update(event, EventUpdate::status(EventStatus::Resolved), now)
}

pub fn dismiss(event: &mut RiskEvent, now: DateTime<Utc>) -> Result<(), RiskError> {
    apply_update(event, EventUpdate::status(EventStatus::Dismissed), now)
}

pub fn assign(event: &mut RiskEvent, assignee_id: impl Into<String>) {
    event.assignee_id = Some(assignee_id.into());
}
