//! Background dispatch of domain events.
//!
//! The event record stays a plain value; queued delivery wraps it in an
//! [`EventEnvelope`]. A [`QueueWorker`] owns one thread and one database
//! connection and publishes envelopes sequentially in submission order.

use crate::db::{DbError, DbResult};
use crate::event::bus::EventBus;
use crate::event::domain::DomainEvent;
use crate::listener::EventContext;
use log::{error, info, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};

/// Queue wrapper around one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub sequence: u64,
    pub enqueued_at_ms: i64,
    pub event: DomainEvent,
}

/// Counters reported when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    /// Envelopes whose listeners all succeeded.
    pub delivered: u64,
    /// Envelopes where at least one listener failed.
    pub faulted: u64,
}

#[derive(Debug)]
pub enum QueueError {
    /// The worker could not open its connection.
    Connect(DbError),
    /// The bounded queue is full.
    Full,
    /// The worker is gone.
    Closed,
    WorkerPanicked,
}

impl Display for QueueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect(err) => write!(f, "queue worker failed to connect: {err}"),
            Self::Full => write!(f, "event queue is full"),
            Self::Closed => write!(f, "event queue is closed"),
            Self::WorkerPanicked => write!(f, "queue worker panicked"),
        }
    }
}

impl Error for QueueError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connect(err) => Some(err),
            Self::Full | Self::Closed | Self::WorkerPanicked => None,
        }
    }
}

/// Handle to a background publishing thread.
pub struct QueueWorker {
    sender: Option<SyncSender<EventEnvelope>>,
    handle: Option<JoinHandle<Result<WorkerSummary, QueueError>>>,
    next_sequence: AtomicU64,
}

impl QueueWorker {
    /// Starts the worker thread.
    ///
    /// `connect` runs on the worker thread; the connection never leaves it.
    /// At most `capacity` envelopes wait in the queue; a capacity of zero is
    /// raised to one so `submit` never needs a receiver blocked in `recv`.
    pub fn spawn<F>(bus: Arc<EventBus>, capacity: usize, connect: F) -> Self
    where
        F: FnOnce() -> DbResult<Connection> + Send + 'static,
    {
        let capacity = capacity.max(1);
        let (sender, receiver) = sync_channel::<EventEnvelope>(capacity);
        let handle = std::thread::spawn(move || -> Result<WorkerSummary, QueueError> {
            let conn = connect().map_err(|err| {
                error!("event=queue_worker module=queue status=error error_code=connect_failed error={err}");
                QueueError::Connect(err)
            })?;
            let ctx = EventContext::new(&conn);
            let mut summary = WorkerSummary::default();
            info!("event=queue_worker module=queue status=start capacity={capacity}");

            for envelope in receiver {
                match bus.publish(&envelope.event, &ctx) {
                    Ok(_) => summary.delivered += 1,
                    Err(err) => {
                        warn!(
                            "event=queue_delivery module=queue status=error sequence={} error={}",
                            envelope.sequence, err
                        );
                        summary.faulted += 1;
                    }
                }
            }

            info!(
                "event=queue_worker module=queue status=stop delivered={} faulted={}",
                summary.delivered, summary.faulted
            );
            Ok(summary)
        });

        Self {
            sender: Some(sender),
            handle: Some(handle),
            next_sequence: AtomicU64::new(1),
        }
    }

    /// Enqueues one event without blocking. Returns its sequence number.
    pub fn submit(&self, event: DomainEvent) -> Result<u64, QueueError> {
        let sender = self.sender.as_ref().ok_or(QueueError::Closed)?;
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let envelope = EventEnvelope {
            sequence,
            enqueued_at_ms: now_ms(),
            event,
        };
        sender.try_send(envelope).map_err(|err| match err {
            TrySendError::Full(_) => QueueError::Full,
            TrySendError::Disconnected(_) => QueueError::Closed,
        })?;
        Ok(sequence)
    }

    /// Closes the queue, waits for pending envelopes and returns the summary.
    pub fn shutdown(mut self) -> Result<WorkerSummary, QueueError> {
        self.sender.take();
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| QueueError::WorkerPanicked)?,
            None => Err(QueueError::Closed),
        }
    }
}

impl Drop for QueueWorker {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
