//! Proximity monitor worker.
//!
//! The worker thread owns the `AlarmSession` and the `Alerter`. Position updates
//! and user actions share one bounded input queue, so the session sees them in
//! exactly the order they were sent. Position producers enqueue with `try_send`
//! and never block; user actions block until queued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::alert::Alerter;
use crate::coordinate::Coordinate;
use crate::error::{AlarmError, AlarmResult, ExecutionError};
use crate::position::{PositionSample, PositionUpdate};
use crate::session::{AlarmSession, RetriggerPolicy, SessionSnapshot};

use super::events::MonitorEvent;
use super::stream::MonitorStream;

/// Worker queue sizes and retrigger policy.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Max queued inputs (positions and user actions) before positions are dropped.
    pub input_queue_capacity: usize,
    /// Event stream buffer capacity.
    pub stream_capacity: usize,
    pub retrigger: RetriggerPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            input_queue_capacity: 1024,
            stream_capacity: 256,
            retrigger: RetriggerPolicy::OncePerSession,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Input {
    Position(PositionUpdate),
    SetTarget(Coordinate),
    SetArmed(bool),
    Toggle,
    Acknowledge,
    Snapshot { reply: Sender<SessionSnapshot> },
    Shutdown,
}

/// Cloneable handle for pushing position updates into a monitor.
#[derive(Debug, Clone)]
pub struct PositionFeed {
    tx: Sender<Input>,
    dropped_positions: Arc<AtomicU64>,
}

impl PositionFeed {
    /// Non-blocking enqueue.
    ///
    /// A full queue drops the update and counts it; only a stopped monitor is an
    /// error.
    pub fn push(&self, update: PositionUpdate) -> AlarmResult<()> {
        match self.tx.try_send(Input::Position(update)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped_positions.fetch_add(1, Ordering::Relaxed);
                warn!("monitor input queue full, position dropped");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(input_disconnected()),
        }
    }

    /// Push a successful fix.
    pub fn push_sample(&self, sample: PositionSample) -> AlarmResult<()> {
        self.push(Ok(sample))
    }
}

/// Threaded proximity monitor.
///
/// Dropping the monitor shuts the worker down and silences the alerter.
#[derive(Debug)]
pub struct ProximityMonitor {
    input_tx: Sender<Input>,
    dropped_positions: Arc<AtomicU64>,
    dropped_events: Arc<AtomicU64>,
    join: Option<JoinHandle<()>>,
}

impl ProximityMonitor {
    /// Spawn the worker and return the monitor with its event stream.
    pub fn start(cfg: MonitorConfig, alerter: Box<dyn Alerter>) -> AlarmResult<(Self, MonitorStream)> {
        let (input_tx, input_rx) = bounded::<Input>(cfg.input_queue_capacity.max(1));
        let (stream_tx, stream_rx) = bounded::<MonitorEvent>(cfg.stream_capacity.max(1));

        let dropped_events = Arc::new(AtomicU64::new(0));
        let session = AlarmSession::new(cfg.retrigger);

        let thread_dropped_events = Arc::clone(&dropped_events);
        let join = thread::Builder::new()
            .name("geoalarm-monitor".to_string())
            .spawn(move || worker_loop(session, alerter, input_rx, stream_tx, &thread_dropped_events))
            .map_err(|e| ExecutionError::WorkerSpawn {
                message: e.to_string(),
            })?;

        let monitor = Self {
            input_tx,
            dropped_positions: Arc::new(AtomicU64::new(0)),
            dropped_events,
            join: Some(join),
        };
        Ok((monitor, MonitorStream::new(stream_rx)))
    }

    /// A handle for position producers.
    #[must_use]
    pub fn feed(&self) -> PositionFeed {
        PositionFeed {
            tx: self.input_tx.clone(),
            dropped_positions: Arc::clone(&self.dropped_positions),
        }
    }

    /// Set the target from a map tap or any already-validated coordinate.
    pub fn set_target(&self, target: Coordinate) -> AlarmResult<()> {
        self.send(Input::SetTarget(target))
    }

    /// Parse `"lat, lon"` text and set it as the target.
    ///
    /// Invalid text is rejected here and never reaches the worker.
    pub fn set_target_text(&self, text: &str) -> AlarmResult<Coordinate> {
        let target: Coordinate = text.parse()?;
        self.set_target(target)?;
        Ok(target)
    }

    /// Arm or disarm. Arming checks the last known fix immediately.
    pub fn set_armed(&self, armed: bool) -> AlarmResult<()> {
        self.send(Input::SetArmed(armed))
    }

    /// Flip the armed flag.
    pub fn toggle(&self) -> AlarmResult<()> {
        self.send(Input::Toggle)
    }

    /// The user's acknowledgement of the alert dialog.
    pub fn acknowledge(&self) -> AlarmResult<()> {
        self.send(Input::Acknowledge)
    }

    /// Session state after every input queued before this call.
    pub fn snapshot(&self) -> AlarmResult<SessionSnapshot> {
        let (reply_tx, reply_rx) = bounded::<SessionSnapshot>(1);
        self.send(Input::Snapshot { reply: reply_tx })?;
        reply_rx.recv().map_err(|_| input_disconnected())
    }

    /// Position updates dropped because the input queue was full.
    #[must_use]
    pub fn dropped_positions(&self) -> u64 {
        self.dropped_positions.load(Ordering::Relaxed)
    }

    /// Events dropped because the stream buffer was full.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Shut the worker down and wait for it to exit.
    pub fn stop(mut self) -> AlarmResult<()> {
        self.shutdown()
    }

    fn send(&self, input: Input) -> AlarmResult<()> {
        self.input_tx.send(input).map_err(|_| input_disconnected())
    }

    fn shutdown(&mut self) -> AlarmResult<()> {
        let Some(handle) = self.join.take() else {
            return Ok(());
        };
        // The worker may already be gone; joining still reports a panic.
        let _ = self.input_tx.send(Input::Shutdown);
        handle
            .join()
            .map_err(|_| AlarmError::internal("monitor worker panicked"))
    }
}

impl Drop for ProximityMonitor {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn input_disconnected() -> AlarmError {
    AlarmError::Execution(ExecutionError::Disconnected {
        path: "monitor_input".to_string(),
    })
}

fn worker_loop(
    mut session: AlarmSession,
    mut alerter: Box<dyn Alerter>,
    input_rx: Receiver<Input>,
    stream_tx: Sender<MonitorEvent>,
    dropped_events: &AtomicU64,
) {
    let emit = |event: MonitorEvent| {
        // Never block the worker on a slow subscriber.
        if stream_tx.try_send(event).is_err() {
            dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    };

    while let Ok(input) = input_rx.recv() {
        let arrival = match input {
            Input::Position(Ok(sample)) => session.observe(sample),
            Input::Position(Err(error)) => {
                session.observe_error(&error);
                emit(MonitorEvent::position_unavailable(error));
                None
            }
            Input::SetTarget(target) => {
                session.set_target(target);
                None
            }
            Input::SetArmed(armed) => session.set_armed(armed),
            Input::Toggle => session.toggle(),
            Input::Acknowledge => {
                if session.acknowledge() {
                    alerter.silence();
                }
                None
            }
            Input::Snapshot { reply } => {
                let _ = reply.send(session.snapshot());
                None
            }
            Input::Shutdown => break,
        };

        if let Some(arrival) = arrival {
            alerter.raise(&arrival);
            emit(MonitorEvent::arrived(arrival));
        }
    }

    alerter.silence();
    debug!("monitor worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Arrival;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct Calls {
        raised: usize,
        silenced: usize,
    }

    struct CountingAlerter(Arc<Mutex<Calls>>);

    impl Alerter for CountingAlerter {
        fn raise(&mut self, _arrival: &Arrival) {
            self.0.lock().unwrap().raised += 1;
        }

        fn silence(&mut self) {
            self.0.lock().unwrap().silenced += 1;
        }
    }

    fn start(cfg: MonitorConfig) -> (ProximityMonitor, MonitorStream, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let (monitor, stream) =
            ProximityMonitor::start(cfg, Box::new(CountingAlerter(Arc::clone(&calls)))).unwrap();
        (monitor, stream, calls)
    }

    fn fix(lat: f64, lon: f64) -> PositionSample {
        PositionSample::now(Coordinate::new(lat, lon).unwrap())
    }

    #[test]
    fn inputs_are_applied_in_send_order() {
        let (monitor, stream, calls) = start(MonitorConfig::default());
        let feed = monitor.feed();

        // Sample arrives before the target is set: no trigger yet.
        feed.push_sample(fix(37.0, -122.0)).unwrap();
        monitor.set_armed(true).unwrap();
        monitor.set_target_text("37.0, -122.0").unwrap();
        feed.push_sample(fix(37.0001, -122.0)).unwrap();

        let event = stream.recv_timeout(Duration::from_secs(5)).unwrap();
        let arrival = event.arrival().expect("arrival event");
        assert_eq!(arrival.position.coordinate, Coordinate::new(37.0001, -122.0).unwrap());

        let snap = monitor.snapshot().unwrap();
        assert!(snap.state.triggered);
        assert!(snap.alert_active);
        assert_eq!(calls.lock().unwrap().raised, 1);
    }

    #[test]
    fn acknowledge_silences_and_shutdown_releases_sound() {
        let (monitor, stream, calls) = start(MonitorConfig::default());
        monitor.set_target(Coordinate::new(1.0, 1.0).unwrap()).unwrap();
        monitor.set_armed(true).unwrap();
        monitor.feed().push_sample(fix(1.0, 1.0)).unwrap();
        stream.recv_timeout(Duration::from_secs(5)).unwrap();

        monitor.acknowledge().unwrap();
        let snap = monitor.snapshot().unwrap();
        assert!(!snap.alert_active);
        assert_eq!(calls.lock().unwrap().silenced, 1);

        monitor.stop().unwrap();
        assert_eq!(calls.lock().unwrap().silenced, 2);
        assert!(stream.recv().is_err());
    }

    #[test]
    fn invalid_text_is_rejected_without_reaching_worker() {
        let (monitor, _stream, _calls) = start(MonitorConfig::default());
        monitor.set_target(Coordinate::new(5.0, 5.0).unwrap()).unwrap();

        let err = monitor.set_target_text("abc, 12").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(monitor.snapshot().unwrap().target, Some(Coordinate::new(5.0, 5.0).unwrap()));
    }

    #[test]
    fn feed_fails_after_stop() {
        let (monitor, _stream, _calls) = start(MonitorConfig::default());
        let feed = monitor.feed();
        monitor.stop().unwrap();
        assert!(feed.push_sample(fix(0.0, 0.0)).unwrap_err().is_execution());
    }

    #[test]
    fn full_stream_counts_dropped_events() {
        let cfg = MonitorConfig {
            stream_capacity: 1,
            retrigger: RetriggerPolicy::EverySample,
            ..MonitorConfig::default()
        };
        let (monitor, _stream, _calls) = start(cfg);
        monitor.set_target(Coordinate::new(1.0, 1.0).unwrap()).unwrap();
        monitor.set_armed(true).unwrap();
        let feed = monitor.feed();
        for _ in 0..3 {
            feed.push_sample(fix(1.0, 1.0)).unwrap();
        }
        monitor.snapshot().unwrap();
        assert_eq!(monitor.dropped_events(), 2);
    }

    #[test]
    fn position_errors_are_streamed() {
        let (monitor, stream, _calls) = start(MonitorConfig::default());
        monitor
            .feed()
            .push(Err(crate::position::PositionError::PermissionDenied))
            .unwrap();
        let event = stream.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(event.arrival().is_none());
        assert_eq!(monitor.dropped_positions(), 0);
    }
}
