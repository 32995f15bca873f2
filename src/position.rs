//! Position samples and the sources that produce them.
//!
//! The device geolocation service is an external collaborator. This module only
//! fixes the shape of what it hands us (`PositionUpdate`), the options it is asked
//! to honour, and two concrete sources: a scripted replay and a line-oriented
//! text reader.

use std::collections::VecDeque;
use std::io::{BufRead, ErrorKind};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coordinate::Coordinate;
use crate::distance::haversine_m;

/// A single fix from the position source.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub coordinate: Coordinate,
    pub timestamp: DateTime<Utc>,
    /// Horizontal accuracy radius in metres, when the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
}

impl PositionSample {
    /// A sample stamped with the current time.
    #[must_use]
    pub fn now(coordinate: Coordinate) -> Self {
        Self::at(coordinate, Utc::now())
    }

    /// A sample with an explicit timestamp.
    #[must_use]
    pub fn at(coordinate: Coordinate, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            timestamp,
            accuracy_m: None,
        }
    }

    /// Attaches the source's horizontal accuracy radius.
    #[must_use]
    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    /// Age of the sample relative to `now`; samples from the future count as fresh.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.timestamp).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Delivery failure reported by a position source.
#[allow(missing_docs)]
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("position request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("malformed position '{input}': {reason}")]
    Malformed { input: String, reason: String },
}

/// What a position source delivers: a fix or a delivery error.
pub type PositionUpdate = Result<PositionSample, PositionError>;

/// Options for a one-time current position request.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CurrentPositionOptions {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    /// A cached fix younger than this may be returned instead of a fresh one.
    pub maximum_age_ms: u64,
}

impl CurrentPositionOptions {
    /// `timeout_ms` as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `maximum_age_ms` as a `Duration`.
    #[must_use]
    pub const fn maximum_age(&self) -> Duration {
        Duration::from_millis(self.maximum_age_ms)
    }
}

impl Default for CurrentPositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 15_000,
            maximum_age_ms: 10_000,
        }
    }
}

/// Options for a continuous watch subscription.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// Minimum movement in metres before a new fix is delivered.
    pub distance_filter_m: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            distance_filter_m: 50.0,
        }
    }
}

/// Producer of position updates.
///
/// Sources are lazy and not restartable: once `next_update` returns `None` the
/// source is exhausted.
pub trait PositionSource: Send {
    /// One-time request for the current position.
    fn current_position(&mut self, options: &CurrentPositionOptions) -> PositionUpdate;

    /// Next update of a continuous watch. May block until one is available.
    fn next_update(&mut self) -> Option<PositionUpdate>;
}

/// Suppresses fixes that have not moved far enough since the last delivered one.
#[derive(Debug, Clone)]
pub struct DistanceFilter {
    min_distance_m: f64,
    last: Option<Coordinate>,
}

impl DistanceFilter {
    /// Filter admitting fixes at least `min_distance_m` metres apart.
    #[must_use]
    pub const fn new(min_distance_m: f64) -> Self {
        Self {
            min_distance_m,
            last: None,
        }
    }

    /// Returns true if `update` should be delivered. Errors always pass.
    pub fn admit(&mut self, update: &PositionUpdate) -> bool {
        let Ok(sample) = update else {
            return true;
        };
        match self.last {
            Some(last) if haversine_m(&last, &sample.coordinate) < self.min_distance_m => false,
            _ => {
                self.last = Some(sample.coordinate);
                true
            }
        }
    }
}

/// Source that replays a fixed script of updates.
#[derive(Debug, Default)]
pub struct ReplaySource {
    script: VecDeque<PositionUpdate>,
    last_fix: Option<PositionSample>,
}

impl ReplaySource {
    /// Replays `script` in order.
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = PositionUpdate>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last_fix: None,
        }
    }

    /// Script of successful fixes stamped with the current time.
    #[must_use]
    pub fn from_coordinates(coords: impl IntoIterator<Item = Coordinate>) -> Self {
        Self::new(coords.into_iter().map(|c| Ok(PositionSample::now(c))))
    }

    /// Updates not yet delivered.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn pop(&mut self) -> Option<PositionUpdate> {
        let update = self.script.pop_front()?;
        if let Ok(sample) = &update {
            self.last_fix = Some(*sample);
        }
        Some(update)
    }
}

impl PositionSource for ReplaySource {
    fn current_position(&mut self, options: &CurrentPositionOptions) -> PositionUpdate {
        if let Some(fix) = self.last_fix {
            if fix.age(Utc::now()) <= options.maximum_age() {
                return Ok(fix);
            }
        }
        self.pop().unwrap_or_else(|| {
            Err(PositionError::Unavailable {
                reason: "replay script exhausted".to_string(),
            })
        })
    }

    fn next_update(&mut self) -> Option<PositionUpdate> {
        self.pop()
    }
}

/// Source reading one `"lat, lon"` or `"lat, lon, accuracy_m"` fix per line.
///
/// Blank lines and lines starting with `#` are skipped. Lines that do not parse,
/// including lines that are not valid UTF-8, are delivered as
/// `PositionError::Malformed`. Only a failing reader ends the stream early.
#[derive(Debug)]
pub struct LineSource<R> {
    reader: R,
    line: Vec<u8>,
    exhausted: bool,
}

impl<R: BufRead> LineSource<R> {
    /// Wraps a reader such as stdin or an opened file.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            exhausted: false,
        }
    }
}

impl<R: BufRead + Send> PositionSource for LineSource<R> {
    fn current_position(&mut self, options: &CurrentPositionOptions) -> PositionUpdate {
        self.next_update().unwrap_or(Err(PositionError::Timeout {
            timeout_ms: options.timeout_ms,
        }))
    }

    fn next_update(&mut self) -> Option<PositionUpdate> {
        while !self.exhausted {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => self.exhausted = true,
                Ok(_) => {
                    let Ok(text) = std::str::from_utf8(&self.line) else {
                        return Some(Err(PositionError::Malformed {
                            input: String::from_utf8_lossy(&self.line).trim().to_string(),
                            reason: "line is not valid UTF-8".to_string(),
                        }));
                    };
                    let text = text.trim();
                    if text.is_empty() || text.starts_with('#') {
                        continue;
                    }
                    return Some(parse_fix(text));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!(error = %e, "position input read failed");
                    self.exhausted = true;
                }
            }
        }
        None
    }
}

fn parse_fix(text: &str) -> PositionUpdate {
    let malformed = |reason: String| PositionError::Malformed {
        input: text.to_string(),
        reason,
    };

    let (coordinate, accuracy) = match text.match_indices(',').nth(1) {
        Some((i, _)) => (&text[..i], Some(text[i + 1..].trim())),
        None => (text, None),
    };
    let coordinate = coordinate
        .parse::<Coordinate>()
        .map_err(|e| malformed(e.to_string()))?;
    let sample = PositionSample::now(coordinate);

    match accuracy {
        None => Ok(sample),
        Some(raw) => match raw.parse::<f64>() {
            Ok(m) if m.is_finite() && m >= 0.0 => Ok(sample.with_accuracy(m)),
            _ => Err(malformed(format!("accuracy '{raw}' is not a non-negative number"))),
        },
    }
}
