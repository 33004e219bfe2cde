#![deny(missing_docs)]
//! Unified tool-call resolver (C5).
//!
//! A `ToolResolver` holds one [`ravelin_tool::ToolRegistry`] and one
//! [`ravelin_remote::RemoteFacade`] and presents a single namespace over
//! both: probe local first, then remote, and classify a name neither
//! knows about as [`ErrorKind::UnknownTool`]. Callers (the ReAct engine,
//! the background-agent runner) never need to know which provider family
//! actually served a call.

use std::time::Duration;

use ravelin_core::{ErrorKind, ProviderKind, ToolDescriptor, ToolResultEnvelope};
use ravelin_remote::RemoteFacade;
use ravelin_tool::ToolRegistry;
use serde_json::Value;

/// Composes a local registry and a remote facade behind one lookup.
pub struct ToolResolver {
    local: ToolRegistry,
    remote: RemoteFacade,
}

impl ToolResolver {
    /// Build a resolver over the given local registry and remote facade.
    pub fn new(local: ToolRegistry, remote: RemoteFacade) -> Self {
        Self { local, remote }
    }

    /// The combined set of tool descriptors visible to the model, local
    /// tools first, then remote ones discovered by the facade.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        let mut descriptors = self.local.list();
        descriptors.extend(self.remote.list());
        descriptors
    }

    /// Resolve and execute a tool call by name, trying the local registry
    /// first and falling back to the remote facade. Always returns an
    /// envelope — an unrecognized name yields one carrying
    /// [`ErrorKind::UnknownTool`] rather than a `Result::Err`, matching the
    /// normalized shape every other outcome uses.
    pub async fn execute(
        &self,
        call_id: &str,
        name: &str,
        arguments: Value,
        timeout: Duration,
    ) -> ToolResultEnvelope {
        if let Some(envelope) = self.local.execute(call_id, name, arguments.clone(), timeout).await {
            return envelope;
        }
        if let Some(envelope) = self.remote.execute(call_id, name, arguments, timeout).await {
            return envelope;
        }

        tracing::debug!(tool = name, "no provider recognizes this tool name");
        ToolResultEnvelope::err(call_id, format!("unknown tool `{name}`"), ErrorKind::UnknownTool, 0, ProviderKind::Local)
    }

    /// Access the local registry (e.g. to register built-in tools at
    /// startup).
    pub fn local_mut(&mut self) -> &mut ToolRegistry {
        &mut self.local
    }

    /// Access the remote facade (e.g. to (re)run discovery).
    pub fn remote_mut(&mut self) -> &mut RemoteFacade {
        &mut self.remote
    }
}
