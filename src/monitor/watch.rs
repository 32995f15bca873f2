//! Position watch subscriptions.
//!
//! `watch` moves a `PositionSource` onto its own thread and forwards its
//! updates, thinned by a `DistanceFilter`, into a monitor's `PositionFeed`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use crate::error::{AlarmError, AlarmResult, ExecutionError};
use crate::position::{CurrentPositionOptions, DistanceFilter, PositionSource, WatchOptions};

use super::dispatcher::PositionFeed;

/// Why a watch thread stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEnd {
    /// The handle was unsubscribed or dropped.
    Unsubscribed,
    /// The source has no more updates.
    Exhausted,
    /// The monitor feed was disconnected.
    MonitorStopped,
}

/// Handle to a running watch.
///
/// Dropping the handle unsubscribes. The thread notices on its next update; a
/// source blocked waiting for input keeps it parked until then.
#[derive(Debug)]
pub struct WatchHandle {
    cancelled: Arc<AtomicBool>,
    join: Option<JoinHandle<WatchEnd>>,
}

impl WatchHandle {
    /// Stop forwarding updates. Idempotent.
    pub fn unsubscribe(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            debug!("position watch unsubscribed");
        }
    }

    /// Whether the watch thread has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the watch thread to end.
    pub fn wait(mut self) -> AlarmResult<WatchEnd> {
        match self.join.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| AlarmError::internal("position watch panicked")),
            None => Ok(WatchEnd::Unsubscribed),
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Start forwarding `source` into `feed`.
pub fn watch<S>(source: S, options: WatchOptions, feed: PositionFeed) -> AlarmResult<WatchHandle>
where
    S: PositionSource + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let thread_cancelled = Arc::clone(&cancelled);

    let join = thread::Builder::new()
        .name("geoalarm-watch".to_string())
        .spawn(move || watch_loop(source, &options, &feed, &thread_cancelled))
        .map_err(|e| ExecutionError::WorkerSpawn {
            message: e.to_string(),
        })?;

    Ok(WatchHandle {
        cancelled,
        join: Some(join),
    })
}

/// One-time current position request, delivered to the monitor like any fix.
pub fn fetch_current_position<S>(
    source: &mut S,
    options: &CurrentPositionOptions,
    feed: &PositionFeed,
) -> AlarmResult<()>
where
    S: PositionSource + ?Sized,
{
    feed.push(source.current_position(options))
}

fn watch_loop<S: PositionSource>(
    mut source: S,
    options: &WatchOptions,
    feed: &PositionFeed,
    cancelled: &AtomicBool,
) -> WatchEnd {
    let mut filter = DistanceFilter::new(options.distance_filter_m);
    info!(
        high_accuracy = options.high_accuracy,
        distance_filter_m = options.distance_filter_m,
        "position watch started"
    );

    let end = loop {
        if cancelled.load(Ordering::Acquire) {
            break WatchEnd::Unsubscribed;
        }
        let Some(update) = source.next_update() else {
            break WatchEnd::Exhausted;
        };
        if cancelled.load(Ordering::Acquire) {
            break WatchEnd::Unsubscribed;
        }
        if !filter.admit(&update) {
            continue;
        }
        if feed.push(update).is_err() {
            break WatchEnd::MonitorStopped;
        }
    };

    info!(?end, "position watch ended");
    end
}
