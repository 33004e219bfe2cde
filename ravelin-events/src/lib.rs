#![deny(missing_docs)]
//! Typed append-only event stream (C1, Event Router).
//!
//! [`EventRouter`] records every [`Event`] under its session and hands
//! new subscribers a [`tokio::sync::broadcast::Receiver`]. A subscriber
//! that arrives mid-session is first replayed the small ring buffer of
//! already-appended events for that session, so it doesn't miss a burst
//! that happened before it subscribed — the router then keeps forwarding
//! new events on the same channel. Durable storage is a separate,
//! pluggable concern: every append is also handed to an
//! [`EventLogBackend`] chosen when the router is built, either the
//! in-memory no-op ([`InMemoryLogBackend`]) or the durable
//! [`RemoteLogBackend`].

mod log;

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use ravelin_core::{Event, SessionId};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

pub use log::{EventLogBackend, InMemoryLogBackend, RemoteLogBackend};

/// Default capacity of the live broadcast channel and the per-session
/// replay buffer.
const DEFAULT_CAPACITY: usize = 256;

/// Errors the event router can raise.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EventError {
    /// The durable log backend rejected the append persistently, after
    /// its internal retry budget was exhausted.
    #[error("event backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

struct SessionChannel {
    sender: broadcast::Sender<Event>,
    replay: VecDeque<Event>,
}

/// Per-session event stream, fanned out live to subscribers and mirrored
/// to a durable [`EventLogBackend`] chosen at construction.
pub struct EventRouter {
    capacity: usize,
    sessions: RwLock<HashMap<SessionId, SessionChannel>>,
    log_backend: Arc<dyn EventLogBackend>,
}

impl EventRouter {
    /// Build a router with the default replay-buffer/channel capacity
    /// and no durable backend beyond the in-memory replay buffer.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Build a router with a custom replay-buffer/channel capacity and
    /// no durable backend beyond the in-memory replay buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_backend(capacity, Arc::new(InMemoryLogBackend))
    }

    /// Build a router whose appends are durably mirrored to a remote
    /// event log service.
    pub fn with_remote_log(base_url: impl Into<String>) -> Self {
        Self::with_backend(DEFAULT_CAPACITY, Arc::new(RemoteLogBackend::new(base_url)))
    }

    /// Build a router over an arbitrary durable log backend.
    pub fn with_backend(capacity: usize, log_backend: Arc<dyn EventLogBackend>) -> Self {
        Self {
            capacity,
            sessions: RwLock::new(HashMap::new()),
            log_backend,
        }
    }

    /// Durably record an event via the configured [`EventLogBackend`],
    /// then broadcast it to any live subscribers and seed the session's
    /// replay buffer for future ones.
    ///
    /// A full replay buffer drops its oldest entry to make room; a full
    /// broadcast channel drops the oldest undelivered message for slow
    /// subscribers (`tokio::sync::broadcast`'s own lagging behavior) —
    /// both are logged at `warn` since they mean some event was lost.
    /// A durable-write failure is surfaced to the caller without
    /// touching the in-memory replay buffer or broadcasting the event.
    pub async fn append(&self, event: Event) -> Result<(), EventError> {
        self.log_backend.append(&event).await?;

        let mut sessions = self.sessions.write().await;
        let channel = sessions
            .entry(event.session_id.clone())
            .or_insert_with(|| SessionChannel {
                sender: broadcast::channel(self.capacity).0,
                replay: VecDeque::new(),
            });

        if channel.replay.len() >= self.capacity {
            channel.replay.pop_front();
            tracing::warn!(session = %event.session_id, "event replay buffer overflowed, dropping oldest");
        }
        channel.replay.push_back(event.clone());

        // No live subscribers is not an error; `send` only fails when the
        // channel has zero receivers.
        let _ = channel.sender.send(event);
        Ok(())
    }

    /// Subscribe to a session's event stream, replaying whatever is
    /// currently buffered before returning the live receiver.
    pub async fn subscribe(&self, session_id: &SessionId) -> (Vec<Event>, broadcast::Receiver<Event>) {
        let mut sessions = self.sessions.write().await;
        let channel = sessions
            .entry(session_id.clone())
            .or_insert_with(|| SessionChannel {
                sender: broadcast::channel(self.capacity).0,
                replay: VecDeque::new(),
            });
        (channel.replay.iter().cloned().collect(), channel.sender.subscribe())
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}
