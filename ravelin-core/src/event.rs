//! The typed, append-only event taxonomy produced by the engine and the
//! background-agent control plane.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::SessionId;
use crate::tool::ErrorKind;

/// One entry on the event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Which session this event belongs to.
    pub session_id: SessionId,
    /// The agent (foreground or background) that produced it, if any.
    pub agent_name: Option<String>,
    /// Wall-clock time of emission.
    pub timestamp: DateTime<Utc>,
    /// The typed payload.
    pub payload: EventPayload,
}

impl Event {
    /// Construct an event for the current instant.
    pub fn new(session_id: SessionId, agent_name: Option<String>, payload: EventPayload) -> Self {
        Self {
            session_id,
            agent_name,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// The full set of event types the core can produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A user query arrived at the engine.
    UserMessage {
        /// The message content.
        content: String,
    },
    /// A ReAct episode started.
    AgentCall {
        /// Name of the calling agent.
        agent_name: String,
        /// Model id used for the episode.
        model: String,
    },
    /// A tool call was parsed and is about to be dispatched.
    ToolCall {
        /// The tool call's id.
        call_id: String,
        /// Tool name.
        name: String,
        /// Parsed arguments.
        arguments: Value,
    },
    /// A tool call returned.
    ToolResult {
        /// The tool call's id.
        call_id: String,
        /// Whether it succeeded.
        ok: bool,
        /// How long it took.
        duration_ms: u64,
        /// Present when `ok` is false.
        error_kind: Option<ErrorKind>,
    },
    /// A free-form observation surfaced to the caller (e.g. a compaction
    /// notice), not a terminal result.
    Observation {
        /// The observation text.
        content: String,
    },
    /// The episode reached a final answer.
    FinalAnswer {
        /// The final answer text.
        content: String,
        /// Total tokens consumed across the episode.
        tokens_used: u64,
        /// Number of steps taken.
        steps: u32,
    },
    /// The model's output did not match the action grammar.
    ParseError {
        /// The raw, unparsed model output.
        raw_output: String,
        /// Which parse attempt this was (1-indexed).
        attempt: u32,
    },
    /// A background agent's scheduled run began.
    BackgroundTaskStarted {
        /// The agent's id.
        agent_id: String,
        /// The run count this execution will become, once counted.
        run_count: u64,
    },
    /// A background agent's scheduled run finished successfully.
    BackgroundTaskCompleted {
        /// The agent's id.
        agent_id: String,
        /// How long the run took.
        duration_ms: u64,
    },
    /// A background agent's scheduled run attempt failed.
    BackgroundTaskError {
        /// The agent's id.
        agent_id: String,
        /// Which attempt (1-indexed) this was.
        attempt: u32,
        /// The classified error.
        error_kind: ErrorKind,
        /// A human-readable message.
        message: String,
    },
    /// A background agent's lifecycle state changed.
    BackgroundAgentStatus {
        /// The agent's id.
        agent_id: String,
        /// The new state, as a string (`"idle"`, `"running"`, ...).
        state: String,
        /// When the agent last ran, if ever.
        last_run_at: Option<DateTime<Utc>>,
        /// Total successful+attempted run count.
        run_count: u64,
        /// Total error count.
        error_count: u64,
    },
    /// A scheduler tick found the agent's run-lock already held.
    SkippedBusy {
        /// The agent's id.
        agent_id: String,
    },
    /// The in-memory event backend dropped events due to backpressure.
    EventDropped {
        /// How many events were dropped.
        count: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_payload_tag_matches_taxonomy() {
        let payload = EventPayload::SkippedBusy {
            agent_id: "a1".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "skipped_busy");
        assert_eq!(json["agent_id"], "a1");
    }

    #[test]
    fn event_new_stamps_current_time() {
        let before = Utc::now();
        let event = Event::new(
            SessionId::new("s1"),
            None,
            EventPayload::EventDropped { count: 1 },
        );
        assert!(event.timestamp >= before);
    }
}
