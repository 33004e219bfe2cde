//! In-memory message backend.

use std::collections::HashMap;

use async_trait::async_trait;
use ravelin_core::{Message, SessionId};
use tokio::sync::RwLock;

use crate::{filter_by_agent, MemoryBackend, MemoryError};

/// Message backend keyed by session, backed by a `RwLock<HashMap<..>>`.
///
/// Suitable for tests, prototyping, and single-process deployments where
/// persistence across restarts is not required.
pub struct InMemoryBackend {
    sessions: RwLock<HashMap<SessionId, Vec<Message>>>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryBackend for InMemoryBackend {
    async fn append(&self, mut message: Message) -> Result<(), MemoryError> {
        let mut sessions = self.sessions.write().await;
        let log = sessions.entry(message.session_id.clone()).or_default();
        message.seq = log.len() as u64;
        log.push(message);
        Ok(())
    }

    async fn get_messages(
        &self,
        session_id: &SessionId,
        agent_name: Option<&str>,
    ) -> Result<Vec<Message>, MemoryError> {
        let sessions = self.sessions.read().await;
        let log = sessions.get(session_id).cloned().unwrap_or_default();
        Ok(filter_by_agent(log, agent_name))
    }

    async fn clear(&self, session_id: &SessionId) -> Result<(), MemoryError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ravelin_core::Role;
    use std::collections::HashMap as StdHashMap;

    fn message(session_id: &str, content: &str) -> Message {
        message_for(session_id, content, None)
    }

    fn message_for(session_id: &str, content: &str, agent_name: Option<&str>) -> Message {
        let mut metadata = StdHashMap::new();
        if let Some(name) = agent_name {
            metadata.insert("agent_name".to_string(), serde_json::json!(name));
        }
        Message {
            session_id: SessionId::new(session_id),
            role: Role::User,
            content: content.into(),
            timestamp: chrono::Utc::now(),
            seq: 0,
            metadata,
        }
    }

    #[tokio::test]
    async fn append_assigns_monotonic_seq() {
        let backend = InMemoryBackend::new();
        backend.append(message("s1", "a")).await.unwrap();
        backend.append(message("s1", "b")).await.unwrap();
        let messages = backend.get_messages(&SessionId::new("s1"), None).await.unwrap();
        assert_eq!(messages[0].seq, 0);
        assert_eq!(messages[1].seq, 1);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let backend = InMemoryBackend::new();
        backend.append(message("s1", "a")).await.unwrap();
        backend.append(message("s2", "b")).await.unwrap();
        assert_eq!(backend.get_messages(&SessionId::new("s1"), None).await.unwrap().len(), 1);
        assert_eq!(backend.get_messages(&SessionId::new("s2"), None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_removes_session_log() {
        let backend = InMemoryBackend::new();
        backend.append(message("s1", "a")).await.unwrap();
        backend.clear(&SessionId::new("s1")).await.unwrap();
        assert!(backend.get_messages(&SessionId::new("s1"), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_session_returns_empty() {
        let backend = InMemoryBackend::new();
        assert!(backend.get_messages(&SessionId::new("nope"), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_messages_filters_by_agent_name() {
        let backend = InMemoryBackend::new();
        backend.append(message_for("s1", "from a", Some("agent-a"))).await.unwrap();
        backend.append(message_for("s1", "from b", Some("agent-b"))).await.unwrap();
        backend.append(message("s1", "from nobody")).await.unwrap();

        let for_a = backend.get_messages(&SessionId::new("s1"), Some("agent-a")).await.unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].content, "from a");

        let unfiltered = backend.get_messages(&SessionId::new("s1"), None).await.unwrap();
        assert_eq!(unfiltered.len(), 3);
    }
}
