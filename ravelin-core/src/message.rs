//! Session message log entries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::SessionId;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System instructions.
    System,
    /// The human or calling application.
    User,
    /// The model.
    Assistant,
    /// A tool result, fed back to the model as an observation.
    Tool,
}

/// One entry in a session's ordered message log.
///
/// Messages within a session are totally ordered by insertion; `seq`
/// breaks ties when timestamps collide, since wall-clock time alone is
/// not a reliable ordering key at this resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The session this message belongs to.
    pub session_id: SessionId,
    /// Who authored the message.
    pub role: Role,
    /// The message body.
    pub content: String,
    /// Wall-clock time of insertion.
    pub timestamp: DateTime<Utc>,
    /// Insertion order within the session; assigned by the backend.
    pub seq: u64,
    /// Free-form metadata. Conventionally carries `agent_name` and,
    /// for tool messages, `tool_call_id`.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Message {
    /// The `metadata.agent_name` field, if present and a string.
    pub fn agent_name(&self) -> Option<&str> {
        self.metadata.get("agent_name").and_then(Value::as_str)
    }

    /// The `metadata.tool_call_id` field, if present and a string.
    pub fn tool_call_id(&self) -> Option<&str> {
        self.metadata.get("tool_call_id").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: Role) -> Message {
        Message {
            session_id: SessionId::new("s1"),
            role,
            content: "hi".into(),
            timestamp: Utc::now(),
            seq: 0,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn agent_name_absent_by_default() {
        assert_eq!(msg(Role::User).agent_name(), None);
    }

    #[test]
    fn tool_call_id_reads_metadata() {
        let mut m = msg(Role::Tool);
        m.metadata
            .insert("tool_call_id".into(), Value::String("tc_1".into()));
        assert_eq!(m.tool_call_id(), Some("tc_1"));
    }
}
