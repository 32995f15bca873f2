//! Threaded proximity monitoring.
//!
//! A `ProximityMonitor` runs the alarm session on a worker thread fed by one
//! input queue. Position producers push through a `PositionFeed` (directly, or via
//! a `watch` subscription), user actions go through the monitor handle, and
//! events come back on a `MonitorStream`.

/// Worker thread, input queue and monitor handle.
pub mod dispatcher;
/// Event types.
pub mod events;
/// Subscriber stream handle.
pub mod stream;
/// Position watch subscriptions.
pub mod watch;

pub use dispatcher::{MonitorConfig, PositionFeed, ProximityMonitor};
pub use events::{EventPayload, MonitorEvent};
pub use stream::MonitorStream;
pub use watch::{fetch_current_position, watch, WatchEnd, WatchHandle};
