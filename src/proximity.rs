//! Proximity trigger evaluation.
//!
//! `evaluate` is the pure decision at the heart of the alarm: given the current
//! position, the optional target and the armed flag, decide whether the user has
//! arrived. It keeps no state; de-duplication belongs to `AlarmSession`.

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::distance::haversine_km;

/// Arrival radius in kilometres. Fixed, not configurable.
pub const TRIGGER_THRESHOLD_KM: f64 = 0.1;

/// Outcome of a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerDecision {
    /// Disarmed, no target, or still outside the radius.
    NoTrigger,
    /// Armed and strictly inside the radius.
    Trigger,
}

impl TriggerDecision {
    /// Returns true for `Trigger`.
    #[must_use]
    pub const fn is_trigger(self) -> bool {
        matches!(self, Self::Trigger)
    }
}

/// Decide whether `current` has reached `target`.
///
/// Returns `Trigger` only when armed, a target is present, and the haversine
/// distance is strictly below `TRIGGER_THRESHOLD_KM`.
///
/// ```
/// use geoalarm::{evaluate, Coordinate, TriggerDecision};
///
/// let target = Coordinate::new(37.0, -122.0).unwrap();
/// let here = Coordinate::new(37.0001, -122.0).unwrap();
/// assert_eq!(evaluate(here, Some(target), true), TriggerDecision::Trigger);
/// assert_eq!(evaluate(here, Some(target), false), TriggerDecision::NoTrigger);
/// assert_eq!(evaluate(here, None, true), TriggerDecision::NoTrigger);
/// ```
#[must_use]
pub fn evaluate(current: Coordinate, target: Option<Coordinate>, armed: bool) -> TriggerDecision {
    decide(proximity_km(&current, target.as_ref()), armed)
}

/// Distance to the target, or `None` without one.
#[must_use]
pub fn proximity_km(current: &Coordinate, target: Option<&Coordinate>) -> Option<f64> {
    target.map(|t| haversine_km(current, t))
}

/// Threshold rule applied to an already computed distance.
#[must_use]
pub fn decide(distance_km: Option<f64>, armed: bool) -> TriggerDecision {
    match distance_km {
        Some(d) if armed && d < TRIGGER_THRESHOLD_KM => TriggerDecision::Trigger,
        _ => TriggerDecision::NoTrigger,
    }
}
