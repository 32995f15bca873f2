//! Alarm session state.
//!
//! `AlarmSession` is the single-threaded core that wraps `evaluate` with the
//! state it needs: the target, the armed/triggered flags, and the last known
//! position. It decides when an `Arrival` is reported and keeps a trigger from
//! firing again within the same arming session.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::coordinate::Coordinate;
use crate::error::ValidationError;
use crate::position::{PositionError, PositionSample};
use crate::proximity::{decide, proximity_km, TriggerDecision};

/// Whether a trigger may fire more than once per arming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetriggerPolicy {
    /// Fire once, then stay quiet until disarmed or re-targeted.
    #[default]
    OncePerSession,
    /// Fire on every sample inside the radius.
    EverySample,
}

/// Armed/triggered flags.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlarmState {
    pub armed: bool,
    pub triggered: bool,
}

/// Details of a trigger.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arrival {
    pub target: Coordinate,
    pub position: PositionSample,
    pub distance_km: f64,
}

/// Serializable view of a session.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub target: Option<Coordinate>,
    pub state: AlarmState,
    pub last_position: Option<PositionSample>,
    pub last_distance_km: Option<f64>,
    pub alert_active: bool,
    pub policy: RetriggerPolicy,
}

/// Target, armed flag and trigger latch for one alarm.
///
/// Single-threaded; `ProximityMonitor` drives one on its worker thread.
#[derive(Debug, Clone, Default)]
pub struct AlarmSession {
    target: Option<Coordinate>,
    state: AlarmState,
    last_position: Option<PositionSample>,
    last_distance_km: Option<f64>,
    alert_active: bool,
    policy: RetriggerPolicy,
}

impl AlarmSession {
    /// An unarmed session without a target.
    #[must_use]
    pub fn new(policy: RetriggerPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Current target, if one was set.
    #[must_use]
    pub const fn target(&self) -> Option<Coordinate> {
        self.target
    }

    /// Armed/triggered flags.
    #[must_use]
    pub const fn state(&self) -> AlarmState {
        self.state
    }

    /// Most recent successful fix.
    #[must_use]
    pub const fn last_position(&self) -> Option<PositionSample> {
        self.last_position
    }

    /// Whether an alert is raised and not yet acknowledged.
    #[must_use]
    pub const fn alert_active(&self) -> bool {
        self.alert_active
    }

    /// Overwrite the target. Starts a new trigger session.
    pub fn set_target(&mut self, target: Coordinate) {
        info!(%target, "target set");
        self.target = Some(target);
        self.state.triggered = false;
        self.last_distance_km = self
            .last_position
            .and_then(|p| proximity_km(&p.coordinate, Some(&target)));
    }

    /// Parse `"lat, lon"` and set it as the target. Leaves the session untouched on error.
    pub fn set_target_text(&mut self, text: &str) -> Result<Coordinate, ValidationError> {
        let target: Coordinate = text.parse()?;
        self.set_target(target);
        Ok(target)
    }

    /// Arm or disarm.
    ///
    /// Disarming clears `triggered`. Arming re-checks the last known position
    /// right away, so a user already inside the radius is alerted without
    /// waiting for the next fix.
    pub fn set_armed(&mut self, armed: bool) -> Option<Arrival> {
        if self.state.armed == armed {
            return None;
        }
        info!(armed, "alarm toggled");
        self.state.armed = armed;
        self.state.triggered = false;

        match (armed, self.last_position) {
            (true, Some(sample)) => self.check(sample),
            _ => None,
        }
    }

    /// Flip the armed flag; see `set_armed`.
    pub fn toggle(&mut self) -> Option<Arrival> {
        self.set_armed(!self.state.armed)
    }

    /// Record a fix and report an arrival if it fires the trigger.
    pub fn observe(&mut self, sample: PositionSample) -> Option<Arrival> {
        self.last_position = Some(sample);
        self.check(sample)
    }

    /// A delivery failure leaves the last position and target in place.
    pub fn observe_error(&self, error: &PositionError) {
        warn!(%error, last_position = ?self.last_position.map(|p| p.coordinate), "position update failed");
    }

    /// Close the active alert. Returns whether one was open.
    pub fn acknowledge(&mut self) -> bool {
        let was_active = std::mem::replace(&mut self.alert_active, false);
        if was_active {
            info!("alarm acknowledged");
        }
        was_active
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            target: self.target,
            state: self.state,
            last_position: self.last_position,
            last_distance_km: self.last_distance_km,
            alert_active: self.alert_active,
            policy: self.policy,
        }
    }

    fn check(&mut self, sample: PositionSample) -> Option<Arrival> {
        let distance_km = proximity_km(&sample.coordinate, self.target.as_ref());
        self.last_distance_km = distance_km;
        debug!(position = %sample.coordinate, distance_km = ?distance_km, armed = self.state.armed, "evaluated position");

        if decide(distance_km, self.state.armed) != TriggerDecision::Trigger {
            return None;
        }
        if self.state.triggered && self.policy == RetriggerPolicy::OncePerSession {
            return None;
        }

        let (Some(target), Some(distance_km)) = (self.target, distance_km) else {
            return None;
        };

        self.state.triggered = true;
        self.alert_active = true;
        info!(%target, distance_km, accuracy_m = ?sample.accuracy_m, "arrived at target");
        Some(Arrival {
            target,
            position: sample,
            distance_km,
        })
    }
}
