//! Textual action-grammar parser.
//!
//! The model is instructed to emit, per step, either a `Final Answer:`
//! or a `Thought:`/`Action:`/`Action Input:` triple. This module turns
//! that free-form text into a [`ParsedAction`] without requiring the
//! underlying LLM client to support structured function calling. It is
//! deliberately kept separate from the loop driver so an alternate
//! grammar (XML-tagged, native function calling) could be swapped in
//! without touching the engine.

use serde_json::Value;

const FINAL_ANSWER_MARKER: &str = "Final Answer:";
const ACTION_MARKER: &str = "Action:";
const ACTION_INPUT_MARKER: &str = "Action Input:";

/// One step's parsed intent.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedAction {
    /// The episode is done; this is the answer to return to the caller.
    FinalAnswer(String),
    /// A tool call, not yet assigned a call id (the engine owns that).
    ToolCall {
        /// The tool's name.
        name: String,
        /// Parsed JSON arguments.
        arguments: Value,
    },
}

/// Parse one step's raw model output.
///
/// A `Final Answer:` marker always wins over a tool call, even if both
/// appear in the same output. Returns `None` when neither a well-formed
/// final answer nor a well-formed tool call is present — the caller
/// treats that as a parse failure.
pub fn parse(raw: &str) -> Option<ParsedAction> {
    if let Some(idx) = raw.find(FINAL_ANSWER_MARKER) {
        let answer = raw[idx + FINAL_ANSWER_MARKER.len()..].trim();
        return Some(ParsedAction::FinalAnswer(answer.to_string()));
    }

    let action_idx = raw.find(ACTION_MARKER)?;
    let after_action = &raw[action_idx + ACTION_MARKER.len()..];
    let name_end = after_action.find('\n').unwrap_or(after_action.len());
    let name = after_action[..name_end].trim().to_string();
    if name.is_empty() {
        return None;
    }

    let input_idx = raw.find(ACTION_INPUT_MARKER)?;
    let after_input = &raw[input_idx + ACTION_INPUT_MARKER.len()..];

    let mut end = after_input.len();
    for marker in ["\nThought:", "\nAction:", "\nObservation:"] {
        if let Some(pos) = after_input.find(marker) {
            end = end.min(pos);
        }
    }

    let arguments: Value = serde_json::from_str(after_input[..end].trim()).ok()?;
    Some(ParsedAction::ToolCall { name, arguments })
}
