//! Consumer side of the monitor event channel.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::error::{AlarmError, AlarmResult, ExecutionError};

use super::events::MonitorEvent;

/// Receiving end of a monitor's events.
///
/// The stream disconnects once the monitor worker has shut down and every
/// buffered event has been received.
#[derive(Debug)]
pub struct MonitorStream {
    rx: Receiver<MonitorEvent>,
}

impl MonitorStream {
    pub(crate) const fn new(rx: Receiver<MonitorEvent>) -> Self {
        Self { rx }
    }

    /// Receive the next event (blocking).
    pub fn recv(&self) -> AlarmResult<MonitorEvent> {
        self.rx.recv().map_err(|_| disconnected())
    }

    /// Receive the next event with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> AlarmResult<MonitorEvent> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => AlarmError::Execution(ExecutionError::Timeout {
                duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
            }),
            RecvTimeoutError::Disconnected => disconnected(),
        })
    }

    /// Next buffered event, if one is ready.
    pub fn try_recv(&self) -> AlarmResult<Option<MonitorEvent>> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(disconnected()),
        }
    }

    /// Number of events waiting to be received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no events are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Iterator for MonitorStream {
    type Item = MonitorEvent;

    /// Blocks for the next event; ends when the monitor has shut down.
    fn next(&mut self) -> Option<Self::Item> {
        self.rx.recv().ok()
    }
}

fn disconnected() -> AlarmError {
    AlarmError::Execution(ExecutionError::Disconnected {
        path: "monitor_stream".to_string(),
    })
}
