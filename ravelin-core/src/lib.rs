#![deny(missing_docs)]
//! Shared vocabulary for the ravelin agent runtime.
//!
//! This crate carries no behavior — only the ids, message/event types,
//! tool-call envelopes, and configuration structs that every other
//! `ravelin-*` crate builds on. Keeping this vocabulary in one place
//! means the tool registry, resolver, memory router, event router, and
//! ReAct engine all agree on what a `Message`, a `ToolCall`, and an
//! `Event` look like without depending on each other.

pub mod config;
pub mod event;
pub mod id;
pub mod message;
pub mod tool;

pub use config::{EpisodeLimits, ModelConfig};
pub use event::{Event, EventPayload};
pub use id::{AgentId, SessionId};
pub use message::{Message, Role};
pub use tool::{ErrorKind, ProviderKind, ToolCall, ToolDescriptor, ToolResultEnvelope};
