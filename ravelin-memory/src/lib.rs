#![deny(missing_docs)]
//! Per-session message memory (C2, Memory Router).
//!
//! [`MemoryBackend`] is the storage capability: append a message to a
//! session's ordered log, read it back (optionally filtered to one
//! agent's messages and truncated to a token budget via
//! [`ravelin_context`]), and clear it. [`InMemoryBackend`] keeps
//! everything in a `RwLock<HashMap<..>>` for tests and single-process
//! use; [`RemoteBackend`] stores each session's log as one document on
//! a remote key/value HTTP service, the way this lineage's own provider
//! crates already reach out over HTTP for everything that isn't local
//! state.

pub mod memory;
pub mod remote;

use async_trait::async_trait;
use ravelin_core::{Message, SessionId};
use thiserror::Error;

/// Errors a memory backend can raise.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The backend's storage medium (network, in-memory lock) is
    /// unavailable.
    #[error("memory backend unavailable: {0}")]
    Unavailable(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Storage capability backing the memory router.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Append a message to its session's log, assigning the next `seq`.
    async fn append(&self, message: Message) -> Result<(), MemoryError>;

    /// Read a session's message log in insertion order, optionally
    /// filtered to messages whose `metadata.agent_name` matches
    /// `agent_name`.
    async fn get_messages(
        &self,
        session_id: &SessionId,
        agent_name: Option<&str>,
    ) -> Result<Vec<Message>, MemoryError>;

    /// Read a session's message log truncated to fit within
    /// `token_budget`, using [`ravelin_context::truncate_to_budget`].
    async fn get_messages_within_budget(
        &self,
        session_id: &SessionId,
        token_budget: u64,
        agent_name: Option<&str>,
    ) -> Result<Vec<Message>, MemoryError> {
        let messages = self.get_messages(session_id, agent_name).await?;
        Ok(ravelin_context::truncate_to_budget(messages, token_budget))
    }

    /// Drop a session's entire log.
    async fn clear(&self, session_id: &SessionId) -> Result<(), MemoryError>;
}

/// Keep only messages whose `metadata.agent_name` matches `agent_name`,
/// or all messages when `agent_name` is `None`.
pub(crate) fn filter_by_agent(messages: Vec<Message>, agent_name: Option<&str>) -> Vec<Message> {
    match agent_name {
        None => messages,
        Some(name) => messages.into_iter().filter(|m| m.agent_name() == Some(name)).collect(),
    }
}

pub use memory::InMemoryBackend;
pub use remote::RemoteBackend;
