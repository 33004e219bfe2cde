#![deny(missing_docs)]
//! ReAct reasoning loop (C6).
//!
//! [`ReactEngine`] drives one episode: load bounded context from memory,
//! call the provider, parse the textual action grammar out of its
//! output ([`grammar`]), dispatch a tool call through the resolver or
//! return a final answer, and repeat until a limit in
//! [`ravelin_core::EpisodeLimits`] is hit. Every step's messages and
//! events are recorded through the memory and event routers so a caller
//! can replay or observe an episode without holding a reference to the
//! engine itself.

pub mod grammar;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ravelin_core::{
    EpisodeLimits, ErrorKind, Event, EventPayload, Message, ModelConfig, Role, SessionId,
};
use ravelin_events::EventRouter;
use ravelin_memory::MemoryBackend;
use ravelin_provider::Provider;
use ravelin_resolver::ToolResolver;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use grammar::ParsedAction;

/// Errors that terminate an episode without producing a final answer.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ReactError {
    /// A budget in [`EpisodeLimits`] was exceeded.
    #[error("limit exceeded: {limit}")]
    LimitExceeded {
        /// Which budget: `"steps"`, `"requests"`, or `"tokens"`.
        limit: &'static str,
    },

    /// The model's output failed to parse past the retry budget.
    #[error("could not parse model output after {attempts} attempt(s)")]
    ParseFailure {
        /// How many consecutive parse attempts were made.
        attempts: u32,
    },

    /// The provider failed in a way the engine does not retry internally.
    #[error("provider error: {0}")]
    Provider(String),

    /// The memory or event backend failed.
    #[error("backend unavailable: {0}")]
    Backend(String),

    /// The episode was cooperatively cancelled.
    #[error("cancelled")]
    Cancelled,
}

impl ReactError {
    /// The [`ErrorKind`] this error classifies as, for callers that need
    /// to record it alongside a tool-call-shaped outcome (e.g. the
    /// background-agent runner).
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            ReactError::LimitExceeded { limit } => ErrorKind::LimitExceeded { limit },
            ReactError::ParseFailure { .. } => ErrorKind::ParseFailure,
            ReactError::Provider(_) => ErrorKind::ProviderError,
            ReactError::Backend(_) => ErrorKind::BackendUnavailable,
            ReactError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// One episode's request: who is asking, what model to use, and what the
/// budgets are.
pub struct EpisodeRequest {
    /// The session this episode's messages and events are recorded under.
    pub session_id: SessionId,
    /// Name of the calling agent, recorded on messages and events.
    pub agent_name: String,
    /// The user's query that starts the episode.
    pub user_query: String,
    /// System instructions prepended to every reasoning call. Not
    /// persisted to the message log itself — it is reconstructed for
    /// every call so it never competes with the truncation window.
    pub system_instruction: String,
    /// Model selection and sampling parameters.
    pub model_config: ModelConfig,
    /// Budgets bounding this episode.
    pub limits: EpisodeLimits,
}

/// The outcome of a successfully completed episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeOutcome {
    /// The final answer text.
    pub content: String,
    /// Total tokens consumed across every request the episode made.
    pub tokens_used: u64,
    /// Number of reasoning steps taken.
    pub steps: u32,
}

/// Drives ReAct episodes over a resolver, a memory backend, an event
/// router, and a provider.
pub struct ReactEngine<P: Provider> {
    provider: P,
    resolver: ToolResolver,
    memory: Arc<dyn MemoryBackend>,
    events: Arc<EventRouter>,
    next_call_id: AtomicU64,
}

impl<P: Provider> ReactEngine<P> {
    /// Build an engine over the given provider, resolver, memory backend,
    /// and event router.
    pub fn new(
        provider: P,
        resolver: ToolResolver,
        memory: Arc<dyn MemoryBackend>,
        events: Arc<EventRouter>,
    ) -> Self {
        Self {
            provider,
            resolver,
            memory,
            events,
            next_call_id: AtomicU64::new(1),
        }
    }

    fn next_call_id(&self) -> String {
        format!("tc_{}", self.next_call_id.fetch_add(1, Ordering::Relaxed))
    }

    async fn record(&self, message: Message) -> Result<(), ReactError> {
        self.memory
            .append(message)
            .await
            .map_err(|e| ReactError::Backend(e.to_string()))
    }

    async fn emit(&self, request: &EpisodeRequest, payload: EventPayload) {
        let event = Event::new(request.session_id.clone(), Some(request.agent_name.clone()), payload);
        if let Err(err) = self.events.append(event).await {
            tracing::warn!(error = %err, "failed to record event");
        }
    }

    fn user_message(&self, request: &EpisodeRequest) -> Message {
        Message {
            session_id: request.session_id.clone(),
            role: Role::User,
            content: request.user_query.clone(),
            timestamp: chrono::Utc::now(),
            seq: 0,
            metadata: [("agent_name".to_string(), serde_json::json!(request.agent_name))]
                .into_iter()
                .collect(),
        }
    }

    fn system_message(&self, request: &EpisodeRequest) -> Message {
        Message {
            session_id: request.session_id.clone(),
            role: Role::System,
            content: request.system_instruction.clone(),
            timestamp: chrono::Utc::now(),
            seq: 0,
            metadata: Default::default(),
        }
    }

    /// Run one episode to completion, returning its final answer or the
    /// error that terminated it.
    ///
    /// `cancel` is checked at every suspension point (before a provider
    /// call, before a tool call) so a caller can cooperatively abort a
    /// long-running episode.
    pub async fn run(
        &self,
        request: EpisodeRequest,
        cancel: &CancellationToken,
    ) -> Result<EpisodeOutcome, ReactError> {
        self.emit(
            &request,
            EventPayload::AgentCall {
                agent_name: request.agent_name.clone(),
                model: request.model_config.model_id.clone(),
            },
        )
        .await;
        self.emit(
            &request,
            EventPayload::UserMessage {
                content: request.user_query.clone(),
            },
        )
        .await;
        self.record(self.user_message(&request)).await?;

        let mut steps: u32 = 0;
        let mut requests: u32 = 0;
        let mut tokens_used: u64 = 0;
        let mut parse_attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ReactError::Cancelled);
            }

            steps += 1;
            if steps > request.limits.max_steps {
                return Err(ReactError::LimitExceeded { limit: "steps" });
            }

            let mut context = self
                .memory
                .get_messages_within_budget(&request.session_id, request.limits.max_context_tokens, None)
                .await
                .map_err(|e| ReactError::Backend(e.to_string()))?;
            context.insert(0, self.system_message(&request));

            let tools = self.resolver.list();

            requests += 1;
            if requests > request.limits.request_limit {
                return Err(ReactError::LimitExceeded { limit: "requests" });
            }

            let completion = tokio::select! {
                _ = cancel.cancelled() => return Err(ReactError::Cancelled),
                result = self.provider.complete(&request.model_config, &context, Some(&tools)) => result,
            };

            let (raw_output, usage) = completion.map_err(|e| ReactError::Provider(e.to_string()))?;
            tokens_used += usage.total();
            if tokens_used > request.limits.total_tokens_limit {
                return Err(ReactError::LimitExceeded { limit: "tokens" });
            }

            match grammar::parse(&raw_output) {
                Some(ParsedAction::FinalAnswer(content)) => {
                    let assistant_msg = self.assistant_message(&request, &raw_output);
                    self.record(assistant_msg).await?;
                    self.emit(
                        &request,
                        EventPayload::FinalAnswer {
                            content: content.clone(),
                            tokens_used,
                            steps,
                        },
                    )
                    .await;
                    return Ok(EpisodeOutcome {
                        content,
                        tokens_used,
                        steps,
                    });
                }
                Some(ParsedAction::ToolCall { name, arguments }) => {
                    parse_attempts = 0;
                    self.record(self.assistant_message(&request, &raw_output)).await?;

                    let call_id = self.next_call_id();
                    self.emit(
                        &request,
                        EventPayload::ToolCall {
                            call_id: call_id.clone(),
                            name: name.clone(),
                            arguments: arguments.clone(),
                        },
                    )
                    .await;

                    if cancel.is_cancelled() {
                        return Err(ReactError::Cancelled);
                    }
                    let envelope = self
                        .resolver
                        .execute(&call_id, &name, arguments, request.limits.tool_call_timeout)
                        .await;

                    self.emit(
                        &request,
                        EventPayload::ToolResult {
                            call_id: call_id.clone(),
                            ok: envelope.ok,
                            duration_ms: envelope.duration_ms,
                            error_kind: envelope.error_kind.clone(),
                        },
                    )
                    .await;

                    self.record(self.tool_message(&request, &call_id, &envelope.content))
                        .await?;
                    // A failing tool call (unknown tool, bad arguments, timeout,
                    // tool failure) is an observation the model reasons over on
                    // the next step, not an episode-terminating error.
                }
                None => {
                    parse_attempts += 1;
                    self.emit(
                        &request,
                        EventPayload::ParseError {
                            raw_output: raw_output.clone(),
                            attempt: parse_attempts,
                        },
                    )
                    .await;
                    if parse_attempts > request.limits.parse_retry_budget {
                        return Err(ReactError::ParseFailure {
                            attempts: parse_attempts,
                        });
                    }
                    self.record(self.assistant_message(&request, &raw_output)).await?;
                    self.record(self.corrective_message(&request)).await?;
                }
            }
        }
    }

    fn assistant_message(&self, request: &EpisodeRequest, content: &str) -> Message {
        Message {
            session_id: request.session_id.clone(),
            role: Role::Assistant,
            content: content.to_string(),
            timestamp: chrono::Utc::now(),
            seq: 0,
            metadata: [("agent_name".to_string(), serde_json::json!(request.agent_name))]
                .into_iter()
                .collect(),
        }
    }

    fn tool_message(&self, request: &EpisodeRequest, call_id: &str, content: &str) -> Message {
        Message {
            session_id: request.session_id.clone(),
            role: Role::Tool,
            content: content.to_string(),
            timestamp: chrono::Utc::now(),
            seq: 0,
            metadata: [("tool_call_id".to_string(), serde_json::json!(call_id))]
                .into_iter()
                .collect(),
        }
    }

    fn corrective_message(&self, request: &EpisodeRequest) -> Message {
        Message {
            session_id: request.session_id.clone(),
            role: Role::User,
            content: "Your last response did not match the expected format. Respond with either \
                      `Thought:`/`Action:`/`Action Input:` or `Final Answer:`."
                .to_string(),
            timestamp: chrono::Utc::now(),
            seq: 0,
            metadata: Default::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ravelin_core::{ProviderKind, ToolDescriptor};
    use ravelin_memory::InMemoryBackend;
    use ravelin_provider::{ProviderError, TokenUsage};
    use ravelin_remote::RemoteFacade;
    use ravelin_tool::{ToolDyn, ToolError, ToolRegistry};
    use serde_json::{json, Value};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    struct ScriptedProvider {
        replies: Mutex<Vec<&'static str>>,
        usage_per_call: TokenUsage,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<&'static str>) -> Self {
            Self {
                replies: Mutex::new(replies),
                usage_per_call: TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                },
            }
        }
    }

    impl Provider for ScriptedProvider {
        async fn complete(
            &self,
            _model_config: &ModelConfig,
            _messages: &[Message],
            _tools_hint: Option<&[ToolDescriptor]>,
        ) -> Result<(String, TokenUsage), ProviderError> {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(ProviderError::RequestFailed("script exhausted".into()));
            }
            Ok((replies.remove(0).to_string(), self.usage_per_call))
        }
    }

    struct EchoTool;

    impl ToolDyn for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
            Box::pin(async move { Ok(input) })
        }
    }

    fn test_request(limits: EpisodeLimits) -> EpisodeRequest {
        EpisodeRequest {
            session_id: SessionId::new("s1"),
            agent_name: "tester".into(),
            user_query: "what is 2+2?".into(),
            system_instruction: "You are a helpful assistant.".into(),
            model_config: ModelConfig::default(),
            limits,
        }
    }

    fn engine(provider: ScriptedProvider) -> ReactEngine<ScriptedProvider> {
        let mut local = ToolRegistry::new();
        local.register(std::sync::Arc::new(EchoTool));
        let resolver = ToolResolver::new(local, RemoteFacade::new());
        let memory: Arc<dyn MemoryBackend> = Arc::new(InMemoryBackend::new());
        let events = Arc::new(EventRouter::new());
        ReactEngine::new(provider, resolver, memory, events)
    }

    #[tokio::test]
    async fn simple_final_answer_completes_immediately() {
        let engine = engine(ScriptedProvider::new(vec!["Thought: easy\nFinal Answer: 4"]));
        let outcome = engine
            .run(test_request(EpisodeLimits::default()), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.content, "4");
        assert_eq!(outcome.steps, 1);
    }

    #[tokio::test]
    async fn tool_call_then_final_answer() {
        let engine = engine(ScriptedProvider::new(vec![
            "Thought: need echo\nAction: echo\nAction Input: {\"x\": 1}",
            "Thought: got it\nFinal Answer: done",
        ]));
        let outcome = engine
            .run(test_request(EpisodeLimits::default()), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.content, "done");
        assert_eq!(outcome.steps, 2);
    }

    #[tokio::test]
    async fn unknown_tool_call_does_not_abort_episode() {
        let engine = engine(ScriptedProvider::new(vec![
            "Thought: try\nAction: nonexistent\nAction Input: {}",
            "Thought: give up\nFinal Answer: fallback",
        ]));
        let outcome = engine
            .run(test_request(EpisodeLimits::default()), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.content, "fallback");
    }

    #[tokio::test]
    async fn max_steps_exceeded_terminates_episode() {
        let mut limits = EpisodeLimits::default();
        limits.max_steps = 1;
        let engine = engine(ScriptedProvider::new(vec![
            "Thought: loop\nAction: echo\nAction Input: {}",
            "Thought: loop\nAction: echo\nAction Input: {}",
        ]));
        let err = engine
            .run(test_request(limits), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReactError::LimitExceeded { limit: "steps" }));
    }

    #[tokio::test]
    async fn total_tokens_limit_terminates_episode() {
        let mut limits = EpisodeLimits::default();
        limits.total_tokens_limit = 10;
        let engine = engine(ScriptedProvider::new(vec!["Final Answer: too slow"]));
        let err = engine
            .run(test_request(limits), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReactError::LimitExceeded { limit: "tokens" }));
    }

    #[tokio::test]
    async fn parse_failure_past_retry_budget_terminates_episode() {
        let mut limits = EpisodeLimits::default();
        limits.parse_retry_budget = 1;
        let engine = engine(ScriptedProvider::new(vec![
            "rambling with no structure",
            "still rambling",
            "rambling again",
        ]));
        let err = engine
            .run(test_request(limits), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReactError::ParseFailure { attempts: 2 }));
    }

    #[tokio::test]
    async fn parse_failure_within_retry_budget_recovers() {
        let limits = EpisodeLimits::default();
        let engine = engine(ScriptedProvider::new(vec![
            "rambling with no structure",
            "Final Answer: recovered",
        ]));
        let outcome = engine
            .run(test_request(limits), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.content, "recovered");
    }

    #[tokio::test]
    async fn provider_error_maps_to_provider_variant() {
        let engine = engine(ScriptedProvider::new(vec![]));
        let err = engine
            .run(test_request(EpisodeLimits::default()), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReactError::Provider(_)));
    }

    #[tokio::test]
    async fn cancellation_is_observed_before_the_first_request() {
        let engine = engine(ScriptedProvider::new(vec!["Final Answer: unreachable"]));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = engine
            .run(test_request(EpisodeLimits::default()), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ReactError::Cancelled));
    }
}
