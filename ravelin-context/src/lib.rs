#![deny(missing_docs)]
//! Token estimation and context-window truncation.
//!
//! [`estimate_tokens`] is the 4-chars-per-token heuristic every other
//! crate uses to stay deterministic without a real tokenizer dependency.
//! [`truncate_to_budget`] is the sliding-window strategy the memory
//! router applies before handing a session's messages to the ReAct
//! engine: keep the first message (typically the session's opening
//! instruction), then keep as many of the most recent messages as fit.

use ravelin_core::Message;

const CHARS_PER_TOKEN: usize = 4;
/// Estimated per-message overhead (role, formatting) added on top of
/// content length, in tokens.
const MESSAGE_OVERHEAD_TOKENS: u64 = 4;

/// Estimate the token cost of a single message's content.
pub fn estimate_message_tokens(message: &Message) -> u64 {
    (message.content.len() / CHARS_PER_TOKEN) as u64 + MESSAGE_OVERHEAD_TOKENS
}

/// Estimate the cumulative token cost of a message slice.
pub fn estimate_tokens(messages: &[Message]) -> u64 {
    messages.iter().map(estimate_message_tokens).sum()
}

/// Whether `messages` exceeds `limit` tokens under [`estimate_tokens`].
pub fn exceeds_budget(messages: &[Message], limit: u64) -> bool {
    estimate_tokens(messages) > limit
}

/// Truncate `messages` to fit within `limit` tokens.
///
/// Keeps the first message unconditionally, then walks backwards from
/// the end keeping the most recent messages until the running total
/// would exceed `limit`. Returns the input unchanged if it already fits
/// or has fewer than two messages.
pub fn truncate_to_budget(messages: Vec<Message>, limit: u64) -> Vec<Message> {
    if messages.len() < 2 || !exceeds_budget(&messages, limit) {
        return messages;
    }

    let first = messages[0].clone();
    let first_tokens = estimate_message_tokens(&first);
    if first_tokens > limit {
        // Even the first message alone blows the budget; it's still kept,
        // the rest is dropped.
        return vec![first];
    }

    let mut kept = Vec::new();
    let mut running = first_tokens;
    for message in messages[1..].iter().rev() {
        let cost = estimate_message_tokens(message);
        if running + cost > limit {
            break;
        }
        running += cost;
        kept.push(message.clone());
    }

    kept.reverse();
    let mut result = vec![first];
    result.extend(kept);
    result
}
