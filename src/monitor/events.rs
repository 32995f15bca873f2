//! Events emitted by the proximity monitor.
//!
//! These types are serializable so they can be streamed to subscribers as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::position::PositionError;
use crate::session::Arrival;

/// Event payload.
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// The trigger fired.
    Arrived { arrival: Arrival },

    /// The position source reported a delivery failure.
    PositionUnavailable { error: PositionError },
}

/// An event delivered on a `MonitorStream`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl MonitorEvent {
    /// Stamps `payload` with a fresh id and the current time.
    #[must_use]
    pub fn new(payload: EventPayload) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Event for a fired trigger.
    #[must_use]
    pub fn arrived(arrival: Arrival) -> Self {
        Self::new(EventPayload::Arrived { arrival })
    }

    /// Event for a position delivery failure.
    #[must_use]
    pub fn position_unavailable(error: PositionError) -> Self {
        Self::new(EventPayload::PositionUnavailable { error })
    }

    /// The arrival carried by this event, if any.
    #[must_use]
    pub const fn arrival(&self) -> Option<&Arrival> {
        match &self.payload {
            EventPayload::Arrived { arrival } => Some(arrival),
            EventPayload::PositionUnavailable { .. } => None,
        }
    }
}
