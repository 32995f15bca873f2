//! # geoalarm
//!
//! A proximity alarm: watch a stream of position fixes and raise a one-shot
//! alert when the user comes within 100 m of a chosen target coordinate.
//!
//! ## Core Concepts
//!
//! - **Coordinate**: a validated latitude/longitude pair
//! - **evaluate**: the pure haversine threshold decision
//! - **AlarmSession**: target, armed and triggered flags; fires once per arming session
//! - **ProximityMonitor**: the session on a worker thread, fed by a single input queue
//!
//! ## Usage
//!
//! ```rust,no_run
//! use geoalarm::{LogAlerter, MonitorConfig, PositionSample, ProximityMonitor};
//!
//! let (monitor, events) = ProximityMonitor::start(MonitorConfig::default(), Box::new(LogAlerter::new()))?;
//! monitor.set_target_text("37.7749, -122.4194")?;
//! monitor.set_armed(true)?;
//!
//! let feed = monitor.feed();
//! feed.push_sample(PositionSample::now("37.7750, -122.4194".parse()?))?;
//!
//! let event = events.recv()?;
//! assert!(event.arrival().is_some());
//! monitor.acknowledge()?;
//! # Ok::<(), geoalarm::AlarmError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod alert;
pub mod config;
pub mod coordinate;
pub mod distance;
pub mod error;
pub mod monitor;
pub mod position;
pub mod proximity;
pub mod session;

// Re-export primary types at crate root for convenience
pub use alert::{Alerter, LogAlerter};
pub use config::AlarmConfig;
pub use coordinate::Coordinate;
pub use distance::{haversine_km, haversine_m, EARTH_RADIUS_KM};
pub use error::{AlarmError, AlarmResult, ExecutionError, ValidationError};
pub use monitor::{
    watch, EventPayload, MonitorConfig, MonitorEvent, MonitorStream, PositionFeed, ProximityMonitor,
    WatchEnd, WatchHandle,
};
pub use position::{
    CurrentPositionOptions, DistanceFilter, LineSource, PositionError, PositionSample, PositionSource,
    PositionUpdate, ReplaySource, WatchOptions,
};
pub use proximity::{evaluate, TriggerDecision, TRIGGER_THRESHOLD_KM};
pub use session::{AlarmSession, AlarmState, Arrival, RetriggerPolicy, SessionSnapshot};
