//! Tool-call vocabulary shared by the registry, facade, resolver, and engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which family of provider served a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// An in-process registered callable.
    Local,
    /// A provider reached through the remote tool facade.
    Remote,
}

/// Classification of why a tool call or episode did not succeed.
///
/// Mirrors the error kinds enumerated in the external contract: these are
/// semantic tags, not `std::error::Error` types, so they can travel inside
/// a [`ToolResultEnvelope`] and be serialized to memory/events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    /// Arguments failed schema validation.
    BadArguments,
    /// No provider (local or remote) knows this tool name.
    UnknownTool,
    /// The call exceeded its deadline.
    Timeout,
    /// The tool executed but signaled failure.
    ToolFailure,
    /// A transport/protocol error from a remote tool or LLM provider.
    ProviderError,
    /// LLM output was unparseable past the retry budget.
    ParseFailure,
    /// A budget was exceeded.
    LimitExceeded {
        /// Which budget: `"steps"`, `"requests"`, or `"tokens"`.
        limit: &'static str,
    },
    /// The memory or event backend is persistently failing.
    BackendUnavailable,
    /// A control-plane create used an id already in use.
    DuplicateId,
    /// A control-plane operation named an id that does not exist.
    NotFound,
    /// The operation was cooperatively cancelled.
    Cancelled,
}

/// A tool call parsed from model output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier unique within the owning episode.
    pub id: String,
    /// The tool's public name.
    pub name: String,
    /// Arguments, expected to match the tool's `parameters_schema`.
    pub arguments: Value,
}

/// Tool descriptor: name, docs, and schema, plus provider routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Globally unique name within its namespace.
    pub name: String,
    /// Human-readable description, shown to the model.
    pub description: String,
    /// JSON Schema for the tool's input.
    pub parameters_schema: Value,
    /// Local or remote.
    pub provider_kind: ProviderKind,
}

/// The normalized result of a tool call, regardless of which provider
/// served it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultEnvelope {
    /// The id of the [`ToolCall`] this is a result for.
    pub call_id: String,
    /// Whether the call succeeded.
    pub ok: bool,
    /// Result content (or failure message) as a string.
    pub content: String,
    /// Present when `ok` is false.
    pub error_kind: Option<ErrorKind>,
    /// How long the call took.
    pub duration_ms: u64,
    /// Which provider family served it.
    pub provider_kind: ProviderKind,
}

impl ToolResultEnvelope {
    /// Build a successful envelope.
    pub fn ok(call_id: impl Into<String>, content: impl Into<String>, duration_ms: u64, provider_kind: ProviderKind) -> Self {
        Self {
            call_id: call_id.into(),
            ok: true,
            content: content.into(),
            error_kind: None,
            duration_ms,
            provider_kind,
        }
    }

    /// Build a failing envelope.
    pub fn err(
        call_id: impl Into<String>,
        content: impl Into<String>,
        error_kind: ErrorKind,
        duration_ms: u64,
        provider_kind: ProviderKind,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            ok: false,
            content: content.into(),
            error_kind: Some(error_kind),
            duration_ms,
            provider_kind,
        }
    }
}
