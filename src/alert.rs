//! Alert surface.
//!
//! An `Alerter` owns the audible cue and the confirmation dialog. The monitor
//! worker holds the only instance, raises it on arrival and silences it on
//! acknowledgement and on shutdown.

use tracing::{info, warn};

use crate::session::Arrival;

/// Dialog title.
pub const ALERT_TITLE: &str = "Location Alarm";
/// Dialog body.
pub const ALERT_MESSAGE: &str = "You have reached your desired location!";
/// Label of the single acknowledgement action.
pub const ALERT_ACTION: &str = "OK";

/// Sound + blocking dialog presented when the user arrives.
///
/// `raise` starts the cue and shows a dialog that can only be closed through its
/// single acknowledgement action; `silence` stops the cue. Both must tolerate
/// being called when there is nothing to start or stop.
pub trait Alerter: Send {
    /// Start the cue and present the dialog for `arrival`.
    fn raise(&mut self, arrival: &Arrival);

    /// Stop the cue.
    fn silence(&mut self);
}

/// Headless alerter that reports through `tracing`.
#[derive(Debug, Default)]
pub struct LogAlerter {
    sounding: bool,
}

impl LogAlerter {
    /// A silent alerter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cue is currently playing.
    #[must_use]
    pub const fn is_sounding(&self) -> bool {
        self.sounding
    }
}

impl Alerter for LogAlerter {
    fn raise(&mut self, arrival: &Arrival) {
        if self.sounding {
            warn!("alarm already sounding");
        }
        self.sounding = true;
        info!(
            title = ALERT_TITLE,
            target = %arrival.target,
            position = %arrival.position.coordinate,
            distance_m = arrival.distance_km * 1000.0,
            "{ALERT_MESSAGE}"
        );
    }

    fn silence(&mut self) {
        if std::mem::take(&mut self.sounding) {
            info!(action = ALERT_ACTION, "alarm silenced");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coordinate, PositionSample};

    #[test]
    fn log_alerter_tracks_sound_lifecycle() {
        let here = Coordinate::new(1.0, 1.0).unwrap();
        let arrival = Arrival {
            target: here,
            position: PositionSample::now(here),
            distance_km: 0.0,
        };

        let mut alerter = LogAlerter::new();
        assert!(!alerter.is_sounding());
        alerter.raise(&arrival);
        assert!(alerter.is_sounding());
        alerter.silence();
        assert!(!alerter.is_sounding());
        // Idempotent.
        alerter.silence();
        assert!(!alerter.is_sounding());
    }
}
