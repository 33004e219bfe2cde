//! Durable storage chosen at construction time for [`crate::EventRouter`].
//!
//! [`InMemoryLogBackend`] keeps no durable copy beyond the router's own
//! replay buffer — it satisfies the in-memory half of the required pair.
//! [`RemoteLogBackend`] appends every event to a remote log keyed per
//! session over HTTP, the durable half, grounded the same way this
//! lineage's own provider crates talk to their APIs: a `reqwest::Client`
//! and JSON bodies.

use ravelin_core::{Event, SessionId};

use crate::EventError;

/// How appended events are persisted, selected once when an
/// [`crate::EventRouter`] is built.
#[async_trait::async_trait]
pub trait EventLogBackend: Send + Sync {
    /// Durably record one event. Transient failures should be retried
    /// internally up to a small bound before surfacing an error.
    async fn append(&self, event: &Event) -> Result<(), EventError>;
}

/// No-op durable store: events live only in the router's in-process
/// replay buffer and broadcast channel.
pub struct InMemoryLogBackend;

#[async_trait::async_trait]
impl EventLogBackend for InMemoryLogBackend {
    async fn append(&self, _event: &Event) -> Result<(), EventError> {
        Ok(())
    }
}

/// How many times a transient failure is retried before being surfaced
/// as `BackendUnavailable`.
const MAX_APPEND_ATTEMPTS: u32 = 3;

/// Append-only remote event log: every event is `POST`ed to
/// `{base_url}/v1/events/{session_id}`, where the remote service is
/// expected to append it to that session's durable log.
pub struct RemoteLogBackend {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteLogBackend {
    /// Point the backend at a remote event-log HTTP service, e.g.
    /// `http://localhost:6381`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn events_url(&self, session_id: &SessionId) -> String {
        format!(
            "{}/v1/events/{}",
            self.base_url.trim_end_matches('/'),
            urlencode(session_id.as_str())
        )
    }

    async fn post_once(&self, event: &Event) -> Result<(), String> {
        let response = self
            .client
            .post(self.events_url(&event.session_id))
            .json(event)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(format!("HTTP {status}: {body}"))
    }
}

#[async_trait::async_trait]
impl EventLogBackend for RemoteLogBackend {
    async fn append(&self, event: &Event) -> Result<(), EventError> {
        let mut last_err = String::new();
        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            match self.post_once(event).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    last_err = err;
                    if attempt < MAX_APPEND_ATTEMPTS {
                        tracing::warn!(
                            session = %event.session_id,
                            attempt,
                            error = %last_err,
                            "remote event log append failed, retrying"
                        );
                    }
                }
            }
        }
        Err(EventError::BackendUnavailable(last_err))
    }
}

fn urlencode(id: &str) -> String {
    let mut out = String::new();
    for byte in id.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
