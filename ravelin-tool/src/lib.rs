#![deny(missing_docs)]
//! In-process tool catalog (Tool Registry, C3).
//!
//! Defines [`ToolDyn`], the object-safe trait every local tool
//! implements, and [`ToolRegistry`], the name-indexed map the ReAct
//! engine and the tool resolver consult. [`ToolRegistry::execute`]
//! validates arguments against the tool's declared schema, runs the
//! call under a timeout, and normalizes the outcome into a
//! [`ravelin_core::ToolResultEnvelope`] — the same envelope shape the
//! remote facade produces, so the resolver can treat both uniformly.

pub mod schema;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ravelin_core::{ErrorKind, ProviderKind, ToolDescriptor, ToolResultEnvelope};
use serde_json::Value;
use thiserror::Error;

/// Errors raised directly by a tool implementation (distinct from the
/// envelope-level `ErrorKind` classification, which the registry derives
/// from these).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool panicked or returned a domain-specific failure.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Object-safe trait every local tool implements.
///
/// Tools are stored as `Arc<dyn ToolDyn>` in [`ToolRegistry`]. A tool
/// that wraps blocking work should spawn it onto `tokio::task::spawn_blocking`
/// internally — the registry itself only knows about async futures.
/// [`BlockingTool`] does this for a plain synchronous callable.
pub trait ToolDyn: Send + Sync {
    /// The tool's unique name.
    fn name(&self) -> &str;

    /// Human-readable description, shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's input parameters.
    fn input_schema(&self) -> Value;

    /// Execute the tool with the given (already-validated) input.
    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>>;
}

/// A synchronous tool body: plain blocking computation, no `.await`.
pub trait BlockingCallable: Send + Sync {
    /// Run the callable to completion on whatever thread it's given.
    fn call(&self, input: Value) -> Result<Value, ToolError>;
}

/// Wraps a [`BlockingCallable`] into a [`ToolDyn`] that runs it on
/// `tokio::task::spawn_blocking`'s worker pool rather than on the async
/// executor, so a tool doing real blocking I/O or CPU work doesn't stall
/// other tasks sharing the runtime.
pub struct BlockingTool<F> {
    name: String,
    description: String,
    input_schema: Value,
    callable: Arc<F>,
}

impl<F: BlockingCallable + 'static> BlockingTool<F> {
    /// Wrap `callable` as a registerable blocking tool.
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value, callable: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            callable: Arc::new(callable),
        }
    }
}

impl<F: BlockingCallable + 'static> ToolDyn for BlockingTool<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }

    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        let callable = Arc::clone(&self.callable);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || callable.call(input))
                .await
                .map_err(|e| ToolError::ExecutionFailed(format!("blocking tool task panicked: {e}")))?
        })
    }
}

/// In-process name → tool map.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolDyn>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. A duplicate name overwrites the previous entry
    /// (logged at `warn`).
    pub fn register(&mut self, tool: Arc<dyn ToolDyn>) {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            tracing::warn!(tool = %name, "overwriting previously registered tool");
        }
        self.tools.insert(name, tool);
    }

    /// Look up a tool by name without executing it.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolDyn>> {
        self.tools.get(name)
    }

    /// Whether a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List descriptors for every registered tool.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|t| ToolDescriptor {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters_schema: t.input_schema(),
                provider_kind: ProviderKind::Local,
            })
            .collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate arguments, run the named tool under `timeout`, and
    /// return a normalized envelope. Returns `None` if no such tool is
    /// registered — the caller (the resolver) is expected to fall back
    /// to the remote facade in that case, per the probe-then-probe
    /// dispatch order.
    pub async fn execute(
        &self,
        call_id: &str,
        name: &str,
        arguments: Value,
        timeout: Duration,
    ) -> Option<ToolResultEnvelope> {
        let tool = self.tools.get(name)?.clone();
        let start = Instant::now();

        if let Err(reason) = schema::validate(&tool.input_schema(), &arguments) {
            tracing::debug!(tool = name, %reason, "tool arguments failed schema validation");
            return Some(ToolResultEnvelope::err(
                call_id,
                reason,
                ErrorKind::BadArguments,
                start.elapsed().as_millis() as u64,
                ProviderKind::Local,
            ));
        }

        let outcome = tokio::time::timeout(timeout, tool.call(arguments)).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        Some(match outcome {
            Ok(Ok(value)) => ToolResultEnvelope::ok(call_id, value.to_string(), duration_ms, ProviderKind::Local),
            Ok(Err(e)) => {
                tracing::debug!(tool = name, error = %e, "tool call failed");
                ToolResultEnvelope::err(call_id, e.to_string(), ErrorKind::ToolFailure, duration_ms, ProviderKind::Local)
            }
            Err(_) => {
                tracing::debug!(tool = name, "tool call timed out");
                ToolResultEnvelope::err(call_id, "tool call timed out", ErrorKind::Timeout, duration_ms, ProviderKind::Local)
            }
        })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    impl ToolDyn for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes input back"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {"msg": {"type": "string"}}, "required": ["msg"]})
        }
        fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
            Box::pin(async move { Ok(input) })
        }
    }

    struct SlowTool;

    impl ToolDyn for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }
        fn description(&self) -> &str {
            "Sleeps past any short timeout"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        fn call(&self, _input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(Value::Null)
            })
        }
    }

    struct FailTool;

    impl ToolDyn for FailTool {
        fn name(&self) -> &str {
            "fail"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        fn call(&self, _input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
            Box::pin(async { Err(ToolError::ExecutionFailed("always fails".into())) })
        }
    }

    fn registry_with(tools: Vec<Arc<dyn ToolDyn>>) -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        for t in tools {
            reg.register(t);
        }
        reg
    }

    #[tokio::test]
    async fn executes_and_returns_ok_envelope() {
        let reg = registry_with(vec![Arc::new(EchoTool)]);
        let env = reg
            .execute("c1", "echo", json!({"msg": "hi"}), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(env.ok);
        assert_eq!(env.call_id, "c1");
    }

    #[tokio::test]
    async fn unknown_tool_returns_none() {
        let reg = registry_with(vec![]);
        assert!(reg
            .execute("c1", "nope", json!({}), Duration::from_secs(1))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn bad_arguments_rejected_before_call() {
        let reg = registry_with(vec![Arc::new(EchoTool)]);
        let env = reg
            .execute("c1", "echo", json!({}), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(!env.ok);
        assert_eq!(env.error_kind, Some(ErrorKind::BadArguments));
    }

    #[tokio::test]
    async fn timeout_produces_timeout_error_kind() {
        let reg = registry_with(vec![Arc::new(SlowTool)]);
        let env = reg
            .execute("c1", "slow", json!({}), Duration::from_millis(5))
            .await
            .unwrap();
        assert!(!env.ok);
        assert_eq!(env.error_kind, Some(ErrorKind::Timeout));
    }

    #[tokio::test]
    async fn tool_failure_maps_to_tool_failure_kind() {
        let reg = registry_with(vec![Arc::new(FailTool)]);
        let env = reg
            .execute("c1", "fail", json!({}), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(!env.ok);
        assert_eq!(env.error_kind, Some(ErrorKind::ToolFailure));
        assert!(env.content.contains("always fails"));
    }

    #[test]
    fn duplicate_register_overwrites() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));
        reg.register(Arc::new(EchoTool));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn list_reports_descriptors() {
        let reg = registry_with(vec![Arc::new(EchoTool)]);
        let descriptors = reg.list();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "echo");
    }

    struct DoubleIt;

    impl BlockingCallable for DoubleIt {
        fn call(&self, input: Value) -> Result<Value, ToolError> {
            std::thread::sleep(Duration::from_millis(1));
            let n = input["n"].as_i64().ok_or_else(|| ToolError::ExecutionFailed("n must be an int".into()))?;
            Ok(json!(n * 2))
        }
    }

    #[tokio::test]
    async fn blocking_tool_runs_on_worker_pool_and_returns_result() {
        let tool = BlockingTool::new("double", "doubles n", json!({"type": "object"}), DoubleIt);
        let reg = registry_with(vec![Arc::new(tool)]);
        let env = reg
            .execute("c1", "double", json!({"n": 21}), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(env.ok);
        assert_eq!(env.content, "42");
    }
}
