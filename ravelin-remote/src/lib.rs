#![deny(missing_docs)]
//! Remote tool provider facade (C4).
//!
//! Unifies any number of out-of-process tool providers (an MCP server, a
//! sibling service speaking some other call protocol) behind one
//! [`RemoteToolProvider`] capability trait, and [`RemoteFacade`] discovers
//! and name-indexes tools across all of them so the resolver can treat a
//! remote tool exactly like a local one. The concrete wire protocol a
//! provider speaks is deliberately not this crate's concern — only the
//! list/call capability is.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ravelin_core::{ErrorKind, ProviderKind, ToolDescriptor, ToolResultEnvelope};
use serde_json::Value;
use thiserror::Error;

/// Errors a remote provider's transport can raise.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The provider could not be reached or returned a transport-level error.
    #[error("remote provider error: {0}")]
    Transport(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Capability every remote tool provider implements: list its tools, and
/// call one by name.
#[async_trait]
pub trait RemoteToolProvider: Send + Sync {
    /// A short, stable identifier for this provider (used to disambiguate
    /// name collisions across providers).
    fn provider_id(&self) -> &str;

    /// List the tools this provider currently exposes.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RemoteError>;

    /// Invoke a tool by its provider-local name.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, RemoteError>;
}

/// One entry in the facade's discovered-tool index.
struct Routed {
    provider: Arc<dyn RemoteToolProvider>,
    provider_local_name: String,
    descriptor: ToolDescriptor,
}

/// Discovers and name-indexes tools across a set of remote providers.
pub struct RemoteFacade {
    providers: Vec<Arc<dyn RemoteToolProvider>>,
    routes: HashMap<String, Routed>,
}

impl RemoteFacade {
    /// Build an empty facade.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            routes: HashMap::new(),
        }
    }

    /// Register a provider. Call [`RemoteFacade::discover`] afterward to
    /// (re)build the name index.
    pub fn add_provider(&mut self, provider: Arc<dyn RemoteToolProvider>) {
        self.providers.push(provider);
    }

    /// Re-list every provider's tools and rebuild the name index.
    ///
    /// When two providers expose the same tool name, the later one (in
    /// registration order) is indexed under `"{name}@{provider_id}"`
    /// instead of the bare name, so both remain reachable.
    pub async fn discover(&mut self) -> Result<Vec<ToolDescriptor>, RemoteError> {
        let mut routes = HashMap::new();
        let mut descriptors = Vec::new();

        for provider in &self.providers {
            let tools = provider.list_tools().await?;
            for descriptor in tools {
                let local_name = descriptor.name.clone();
                let (public_name, descriptor) = if routes.contains_key(&local_name) {
                    let qualified = format!("{}@{}", local_name, provider.provider_id());
                    let mut descriptor = descriptor;
                    descriptor.name = qualified.clone();
                    (qualified, descriptor)
                } else {
                    (local_name.clone(), descriptor)
                };

                routes.insert(
                    public_name,
                    Routed {
                        provider: Arc::clone(provider),
                        provider_local_name: local_name,
                        descriptor: descriptor.clone(),
                    },
                );
                descriptors.push(descriptor);
            }
        }

        self.routes = routes;
        Ok(descriptors)
    }

    /// Whether a tool with this (possibly provider-qualified) name is known.
    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// The descriptors discovered by the last [`RemoteFacade::discover`]
    /// call.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.routes.values().map(|routed| routed.descriptor.clone()).collect()
    }

    /// Call a discovered tool under `timeout`, returning a normalized
    /// envelope. Returns `None` if `name` was not found by the last
    /// [`RemoteFacade::discover`] call.
    pub async fn execute(
        &self,
        call_id: &str,
        name: &str,
        arguments: Value,
        timeout: Duration,
    ) -> Option<ToolResultEnvelope> {
        let routed = self.routes.get(name)?;
        let start = Instant::now();

        let outcome = tokio::time::timeout(
            timeout,
            routed.provider.call_tool(&routed.provider_local_name, arguments),
        )
        .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        Some(match outcome {
            Ok(Ok(value)) => ToolResultEnvelope::ok(call_id, value.to_string(), duration_ms, ProviderKind::Remote),
            Ok(Err(e)) => {
                tracing::debug!(tool = name, error = %e, "remote tool call failed");
                ToolResultEnvelope::err(call_id, e.to_string(), ErrorKind::ProviderError, duration_ms, ProviderKind::Remote)
            }
            Err(_) => {
                tracing::debug!(tool = name, "remote tool call timed out");
                ToolResultEnvelope::err(call_id, "remote tool call timed out", ErrorKind::Timeout, duration_ms, ProviderKind::Remote)
            }
        })
    }
}

impl Default for RemoteFacade {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    struct StubProvider {
        id: &'static str,
        tools: Vec<&'static str>,
        calls: Mutex<u32>,
    }

    impl StubProvider {
        fn new(id: &'static str, tools: Vec<&'static str>) -> Self {
            Self { id, tools, calls: Mutex::new(0) }
        }
    }

    #[async_trait]
    impl RemoteToolProvider for StubProvider {
        fn provider_id(&self) -> &str {
            self.id
        }

        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RemoteError> {
            Ok(self
                .tools
                .iter()
                .map(|name| ToolDescriptor {
                    name: name.to_string(),
                    description: "stub".into(),
                    parameters_schema: serde_json::json!({"type": "object"}),
                    provider_kind: ProviderKind::Remote,
                })
                .collect())
        }

        async fn call_tool(&self, name: &str, _arguments: Value) -> Result<Value, RemoteError> {
            *self.calls.lock().await += 1;
            Ok(serde_json::json!({ "called": name }))
        }
    }

    #[tokio::test]
    async fn discover_indexes_tools_by_name() {
        let mut facade = RemoteFacade::new();
        facade.add_provider(Arc::new(StubProvider::new("p1", vec!["search"])));
        let descriptors = facade.discover().await.unwrap();
        assert_eq!(descriptors.len(), 1);
        assert!(facade.contains("search"));
    }

    #[tokio::test]
    async fn colliding_names_qualified_by_provider() {
        let mut facade = RemoteFacade::new();
        facade.add_provider(Arc::new(StubProvider::new("p1", vec!["search"])));
        facade.add_provider(Arc::new(StubProvider::new("p2", vec!["search"])));
        facade.discover().await.unwrap();
        assert!(facade.contains("search"));
        assert!(facade.contains("search@p2"));
    }

    #[tokio::test]
    async fn execute_routes_to_correct_provider() {
        let mut facade = RemoteFacade::new();
        facade.add_provider(Arc::new(StubProvider::new("p1", vec!["search"])));
        facade.discover().await.unwrap();
        let env = facade
            .execute("c1", "search", serde_json::json!({}), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(env.ok);
        assert_eq!(env.provider_kind, ProviderKind::Remote);
    }

    #[tokio::test]
    async fn list_returns_discovered_descriptors() {
        let mut facade = RemoteFacade::new();
        facade.add_provider(Arc::new(StubProvider::new("p1", vec!["search", "fetch"])));
        facade.discover().await.unwrap();
        let mut names: Vec<_> = facade.list().into_iter().map(|d| d.name).collect();
        names.sort();
        assert_eq!(names, vec!["fetch", "search"]);
    }

    #[tokio::test]
    async fn execute_unknown_name_returns_none() {
        let facade = RemoteFacade::new();
        assert!(facade
            .execute("c1", "nope", serde_json::json!({}), Duration::from_secs(1))
            .await
            .is_none());
    }
}
