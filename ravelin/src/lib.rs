#![deny(missing_docs)]
//! Wiring for the `ravelin` demo binary.
//!
//! This crate is not meant to be a reusable library surface; it exists so
//! `main.rs` can stay a thin CLI shell around [`RavelinConfig`] loading,
//! [`DemoProvider`], and [`EchoTool`], the same split `brain`'s binary
//! keeps between its `main.rs` flag parsing and the config/runtime types
//! it pulls in from elsewhere.

use std::path::Path;

use ravelin_core::{EpisodeLimits, Message, ModelConfig, Role};
use ravelin_provider::{Provider, ProviderError, TokenUsage};
use ravelin_tool::{ToolDyn, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors surfaced by the demo binary.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RavelinError {
    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A config file did not parse as JSON, or a flag was malformed.
    #[error("config error: {0}")]
    Config(String),

    /// A config file's JSON did not match [`RavelinConfig`]'s shape.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The reasoning loop itself failed or hit a limit.
    #[error(transparent)]
    React(#[from] ravelin_react::ReactError),

    /// A background-agent manager operation failed.
    #[error(transparent)]
    Agent(#[from] ravelin_agent::AgentError),
}

/// Top-level demo configuration, loaded from a JSON file or defaulted.
///
/// Mirrors the shape `brain.json` plays for the donor binary: a single
/// file holding the system instruction, model selection, and episode
/// limits for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RavelinConfig {
    /// Name recorded on messages and events for this run.
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    /// System instruction prepended to every request.
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
    /// Model selection passed to the provider.
    #[serde(default)]
    pub model_config: ModelConfig,
    /// Step/request/token budgets for the episode.
    #[serde(default)]
    pub limits: EpisodeLimits,
}

fn default_agent_name() -> String {
    "ravelin-demo".to_string()
}

fn default_system_instruction() -> String {
    "You are a helpful assistant. Use the available tools when they help \
     answer the question, and always finish with a line starting with \
     `Final Answer:`."
        .to_string()
}

impl Default for RavelinConfig {
    fn default() -> Self {
        Self {
            agent_name: default_agent_name(),
            system_instruction: default_system_instruction(),
            model_config: ModelConfig::default(),
            limits: EpisodeLimits::default(),
        }
    }
}

impl RavelinConfig {
    /// Load a config from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, RavelinError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// A deterministic, offline stand-in for a real LLM provider.
///
/// Specific provider SDKs are treated as external collaborators rather
/// than part of this runtime, so the demo binary ships this instead of a
/// vendor client: it always answers with a `Final Answer:` line built
/// from the most recent user-facing message, optionally running one
/// `echo` tool call first when the prompt contains the word `"tool"`.
/// This mirrors the `ControllerResponse`/`text_response` scripted-reply
/// style used for offline test harnesses elsewhere in this lineage,
/// promoted here from a test double to the binary's only built-in
/// provider.
pub struct DemoProvider;

impl Provider for DemoProvider {
    fn complete(
        &self,
        _model_config: &ModelConfig,
        messages: &[Message],
        _tools_hint: Option<&[ravelin_core::ToolDescriptor]>,
    ) -> impl Future<Output = Result<(String, TokenUsage), ProviderError>> + Send {
        let already_called_tool = messages.iter().any(|m| m.role == Role::Tool);
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        async move {
            let usage = TokenUsage { prompt_tokens: 32, completion_tokens: 16 };
            if !already_called_tool && last_user.to_lowercase().contains("tool") {
                let text = format!(
                    "Thought: the user asked about a tool, so I'll echo the request first.\n\
                     Action: echo\n\
                     Action Input: {{\"message\": {:?}}}",
                    last_user
                );
                return Ok((text, usage));
            }
            let text = format!("Final Answer: you said: {last_user}");
            Ok((text, usage))
        }
    }
}

/// A trivial built-in tool: returns its `message` argument unchanged.
///
/// Grounded on the same `EchoTool` shape used throughout this codebase's
/// own test suites, kept here as a real (not test-only) registered tool
/// so the demo has something to call.
pub struct EchoTool;

impl ToolDyn for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes the `message` argument back as the tool result."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "message": { "type": "string" } },
            "required": ["message"],
        })
    }

    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move { Ok(input) })
    }
}
