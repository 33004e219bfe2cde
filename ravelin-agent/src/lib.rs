#![deny(missing_docs)]
//! Background agent (C7), scheduler (C8), and control-plane manager (C9).
//!
//! [`BackgroundAgentManager`] owns a table of agents, each driven by its
//! own `tokio::spawn`ed tick loop ([`record::AgentRecord`]). The loop's
//! `tokio::time::interval` ticks on its own schedule, independent of how
//! long a run takes: each tick spawns the run on its own task rather than
//! awaiting it inline, so a tick landing while the previous run still
//! holds the run-lock reaches `try_lock`, fails, and is reported as
//! `SkippedBusy` instead of being silently absorbed by a sequential
//! await. Runs for one agent are still strictly serial — the run-lock
//! ensures at most one executes at a time — while different agents run
//! freely concurrently. The manager's own map lock and a record's
//! run-lock are never held at the same time by one call path: a run
//! drops the run-lock guard before touching the map, matching the donor
//! orchestration crates' dispatch-by-id registry pattern generalized
//! with a scheduler loop (no direct donor grounding existed for the
//! interval/retry logic itself).

mod record;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ravelin_core::{AgentId, ErrorKind, EpisodeLimits, Event, EventPayload, ModelConfig};
use ravelin_events::EventRouter;
use ravelin_provider::Provider;
use ravelin_react::{EpisodeRequest, ReactEngine};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use record::AgentRecord;

/// Errors from the control plane.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AgentError {
    /// `create_agent` named an id already in use.
    #[error("agent `{0}` already exists")]
    DuplicateId(String),

    /// An operation named an id with no matching record.
    #[error("agent `{0}` not found")]
    NotFound(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl AgentError {
    /// The [`ErrorKind`] this error classifies as.
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            AgentError::DuplicateId(_) => ErrorKind::DuplicateId,
            AgentError::NotFound(_) => ErrorKind::NotFound,
            AgentError::Other(_) => ErrorKind::BackendUnavailable,
        }
    }
}

/// The query and free-form metadata a background agent's episode runs
/// with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// The query passed to the ReAct engine as the episode's user query.
    pub query: String,
    /// Free-form metadata carried alongside the query; not interpreted
    /// by the scheduler itself.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Configuration for one background agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundAgentConfig {
    /// System instructions for every run's episode.
    pub system_instruction: String,
    /// Model selection for every run's episode.
    pub model_config: ModelConfig,
    /// The query (and metadata) each run's episode is given.
    pub task_config: TaskConfig,
    /// Budgets bounding each run's episode.
    #[serde(default)]
    pub limits: EpisodeLimits,
    /// Seconds between the starts of consecutive successful runs.
    pub interval_seconds: u64,
    /// How many additional attempts are made after a run fails, before
    /// giving up and recording `last_error`.
    pub max_retries: u32,
    /// Delay between retry attempts.
    pub retry_delay_seconds: u64,
}

/// A patch applied by `update_config`; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackgroundAgentConfigPatch {
    /// Replace `system_instruction`.
    pub system_instruction: Option<String>,
    /// Replace `model_config`.
    pub model_config: Option<ModelConfig>,
    /// Replace `task_config`.
    pub task_config: Option<TaskConfig>,
    /// Replace `limits`.
    pub limits: Option<EpisodeLimits>,
    /// Replace `interval_seconds`; reschedules at or before the next tick.
    pub interval_seconds: Option<u64>,
    /// Replace `max_retries`.
    pub max_retries: Option<u32>,
    /// Replace `retry_delay_seconds`.
    pub retry_delay_seconds: Option<u64>,
}

/// Lifecycle state of a background agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Registered but the manager hasn't been `start()`ed yet.
    Pending,
    /// Scheduled and waiting for its next tick.
    Idle,
    /// A run is in flight.
    Running,
    /// Scheduling suspended; an in-flight run still finishes.
    Paused,
    /// The most recent run exhausted its retries without succeeding.
    Error,
    /// Terminal: deregistered and awaiting record removal.
    Deleted,
}

/// A point-in-time snapshot of one agent's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    /// The agent's id.
    pub agent_id: AgentId,
    /// Current lifecycle state.
    pub state: AgentState,
    /// Total run attempts started.
    pub run_count: u64,
    /// Total runs that exhausted their retries without succeeding.
    pub error_count: u64,
    /// When the most recent run started, if any.
    pub last_run_at: Option<DateTime<Utc>>,
    /// The most recent terminal error message, if any.
    pub last_error: Option<String>,
}

type AgentTable = Arc<Mutex<HashMap<AgentId, Arc<AgentRecord>>>>;

/// Owns every background agent's record and tick loop.
pub struct BackgroundAgentManager<P: Provider + 'static> {
    engine: Arc<ReactEngine<P>>,
    events: Arc<EventRouter>,
    agents: AgentTable,
    started: AtomicBool,
    shutdown: CancellationToken,
}

impl<P: Provider + 'static> BackgroundAgentManager<P> {
    /// Build a manager driving episodes through the given engine, using
    /// `events` for its own control-plane notifications (agent status,
    /// task lifecycle).
    pub fn new(engine: Arc<ReactEngine<P>>, events: Arc<EventRouter>) -> Self {
        Self {
            engine,
            events,
            agents: Arc::new(Mutex::new(HashMap::new())),
            started: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    /// Register a new agent. Schedules it immediately if `start()` has
    /// already been called; otherwise it waits in `Pending` until it is.
    pub async fn create_agent(&self, agent_id: AgentId, config: BackgroundAgentConfig) -> Result<(), AgentError> {
        let mut agents = self.agents.lock().await;
        if agents.contains_key(&agent_id) {
            return Err(AgentError::DuplicateId(agent_id.to_string()));
        }

        let started = self.started.load(Ordering::SeqCst);
        let initial_state = if started { AgentState::Idle } else { AgentState::Pending };
        let record = Arc::new(AgentRecord::new(agent_id.clone(), config, initial_state, &self.shutdown));

        if started {
            self.spawn_tick_loop(Arc::clone(&record));
        }
        agents.insert(agent_id, record);
        Ok(())
    }

    /// Apply a partial update. Reschedules at or before the next tick if
    /// `interval_seconds` changed. Has no effect on an in-flight run,
    /// which completes with the configuration it started with.
    pub async fn update_config(&self, agent_id: &AgentId, patch: BackgroundAgentConfigPatch) -> Result<(), AgentError> {
        let record = self.get_record(agent_id).await?;
        let mut config = record.config.write().await;
        if let Some(v) = patch.system_instruction {
            config.system_instruction = v;
        }
        if let Some(v) = patch.model_config {
            config.model_config = v;
        }
        if let Some(v) = patch.task_config {
            config.task_config = v;
        }
        if let Some(v) = patch.limits {
            config.limits = v;
        }
        if let Some(v) = patch.max_retries {
            config.max_retries = v;
        }
        if let Some(v) = patch.retry_delay_seconds {
            config.retry_delay_seconds = v;
        }
        if let Some(v) = patch.interval_seconds {
            config.interval_seconds = v;
            let _ = record.interval_tx.send(v);
        }
        Ok(())
    }

    /// Suspend scheduling. Does not cancel an in-flight run; the agent
    /// reaches `Paused` when that run ends.
    pub async fn pause(&self, agent_id: &AgentId) -> Result<(), AgentError> {
        let record = self.get_record(agent_id).await?;
        let mut state = record.state.write().await;
        match *state {
            AgentState::Running => record.pause_requested.store(true, Ordering::SeqCst),
            AgentState::Deleted => {}
            _ => *state = AgentState::Paused,
        }
        Ok(())
    }

    /// Resume scheduling for a paused agent.
    pub async fn resume(&self, agent_id: &AgentId) -> Result<(), AgentError> {
        let record = self.get_record(agent_id).await?;
        record.pause_requested.store(false, Ordering::SeqCst);
        let mut state = record.state.write().await;
        if *state == AgentState::Paused {
            *state = AgentState::Idle;
        }
        Ok(())
    }

    /// Mark an agent deleted. Deregisters it from the scheduler; if a
    /// run is in flight the episode is cancelled cooperatively and the
    /// record is removed once the run-lock is released (by the tick
    /// loop itself), not before.
    pub async fn delete_agent(&self, agent_id: &AgentId) -> Result<(), AgentError> {
        let record = self.get_record(agent_id).await?;
        *record.state.write().await = AgentState::Deleted;
        record.delete_requested.store(true, Ordering::SeqCst);
        record.cancel.cancel();

        // If nothing is running, the run-lock is free: remove now rather
        // than waiting for a tick that may be a long interval away. If a
        // run is in flight, `run_once` performs the removal itself once
        // the run-lock is released.
        if record.run_lock.try_lock().is_ok() {
            self.agents.lock().await.remove(agent_id);
        }
        Ok(())
    }

    /// A snapshot of one agent's status.
    pub async fn status(&self, agent_id: &AgentId) -> Result<AgentStatus, AgentError> {
        let record = self.get_record(agent_id).await?;
        Ok(record.snapshot().await)
    }

    /// A snapshot of every registered agent's status.
    pub async fn list(&self) -> Vec<AgentStatus> {
        let agents = self.agents.lock().await;
        let mut out = Vec::with_capacity(agents.len());
        for record in agents.values() {
            out.push(record.snapshot().await);
        }
        out
    }

    /// Start the control plane: every `Pending` agent transitions to
    /// `Idle` and gets a tick loop. Idempotent.
    pub async fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let agents = self.agents.lock().await;
        for record in agents.values() {
            let mut state = record.state.write().await;
            if *state == AgentState::Pending {
                *state = AgentState::Idle;
                drop(state);
                self.spawn_tick_loop(Arc::clone(record));
            }
        }
    }

    /// Shut down the control plane: cancel every agent's cancellation
    /// token (cooperatively stopping any in-flight run at its next
    /// suspension point, and stopping the tick loops), then wait for
    /// every tick loop to exit.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handles: Vec<_> = {
            let mut agents = self.agents.lock().await;
            let handles = agents
                .values()
                .filter_map(|record| record.tick_handle.lock().unwrap().take())
                .collect();
            agents.clear();
            handles
        };
        for handle in handles {
            let _ = handle.await;
        }
    }

    async fn get_record(&self, agent_id: &AgentId) -> Result<Arc<AgentRecord>, AgentError> {
        self.agents
            .lock()
            .await
            .get(agent_id)
            .cloned()
            .ok_or_else(|| AgentError::NotFound(agent_id.to_string()))
    }

    fn spawn_tick_loop(&self, record: Arc<AgentRecord>) {
        let engine = Arc::clone(&self.engine);
        let events = Arc::clone(&self.events);
        let agents = Arc::clone(&self.agents);
        let mut interval_rx = record.interval_rx.clone();

        fn ticker_for(seconds: u64) -> tokio::time::Interval {
            let mut ticker = tokio::time::interval(Duration::from_secs(seconds.max(1)));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker
        }

        let handle = tokio::spawn(async move {
            let mut ticker = ticker_for(*interval_rx.borrow_and_update());
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = record.cancel.cancelled() => break,
                    changed = interval_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        ticker = ticker_for(*interval_rx.borrow_and_update());
                        continue;
                    }
                }
                // Fire the run on its own task so the ticker keeps its own
                // schedule regardless of how long the run takes: a tick
                // that lands while the previous run still holds the
                // run-lock must still reach `try_lock` and be reported as
                // `SkippedBusy`, not be silently absorbed by a sequential
                // await here.
                let engine = Arc::clone(&engine);
                let events = Arc::clone(&events);
                let agents = Arc::clone(&agents);
                let record = Arc::clone(&record);
                tokio::spawn(async move {
                    run_once(&engine, &events, &agents, &record).await;
                });
            }
        });
        *record.tick_handle.lock().unwrap() = Some(handle);
    }
}

async fn run_once<P: Provider + 'static>(
    engine: &Arc<ReactEngine<P>>,
    events: &Arc<EventRouter>,
    agents: &AgentTable,
    record: &Arc<AgentRecord>,
) {
    {
        let state = *record.state.read().await;
        if matches!(state, AgentState::Paused | AgentState::Deleted) {
            return;
        }
    }

    let guard = match record.run_lock.try_lock() {
        Ok(guard) => guard,
        Err(_) => {
            emit(
                events,
                record,
                EventPayload::SkippedBusy {
                    agent_id: record.agent_id.to_string(),
                },
            )
            .await;
            return;
        }
    };

    *record.state.write().await = AgentState::Running;
    let run_count = record.run_count.fetch_add(1, Ordering::SeqCst) + 1;
    emit(
        events,
        record,
        EventPayload::BackgroundTaskStarted {
            agent_id: record.agent_id.to_string(),
            run_count,
        },
    )
    .await;
    emit_status(events, record, AgentState::Running).await;

    let config = record.config.read().await.clone();
    let started_at = std::time::Instant::now();
    let mut succeeded = false;

    for attempt in 1..=config.max_retries + 1 {
        if record.cancel.is_cancelled() {
            break;
        }

        let request = EpisodeRequest {
            session_id: record.agent_id.session_id(),
            agent_name: record.agent_id.to_string(),
            user_query: config.task_config.query.clone(),
            system_instruction: config.system_instruction.clone(),
            model_config: config.model_config.clone(),
            limits: config.limits.clone(),
        };

        match engine.run(request, &record.cancel).await {
            Ok(_outcome) => {
                succeeded = true;
                emit(
                    events,
                    record,
                    EventPayload::BackgroundTaskCompleted {
                        agent_id: record.agent_id.to_string(),
                        duration_ms: started_at.elapsed().as_millis() as u64,
                    },
                )
                .await;
                break;
            }
            Err(err) => {
                emit(
                    events,
                    record,
                    EventPayload::BackgroundTaskError {
                        agent_id: record.agent_id.to_string(),
                        attempt,
                        error_kind: err.error_kind(),
                        message: err.to_string(),
                    },
                )
                .await;

                if attempt <= config.max_retries && !record.cancel.is_cancelled() {
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_secs(config.retry_delay_seconds)) => {}
                        _ = record.cancel.cancelled() => {}
                    }
                } else {
                    record.error_count.fetch_add(1, Ordering::SeqCst);
                    *record.last_error.write().await = Some(err.to_string());
                }
            }
        }
    }

    *record.last_run_at.write().await = Some(Utc::now());

    let deleted = record.delete_requested.load(Ordering::SeqCst);
    let next_state = if deleted {
        AgentState::Deleted
    } else if record.pause_requested.swap(false, Ordering::SeqCst) {
        AgentState::Paused
    } else if !succeeded {
        AgentState::Error
    } else {
        AgentState::Idle
    };
    *record.state.write().await = next_state;
    emit_status(events, record, next_state).await;

    // Release the run-lock before touching the map-level lock, never
    // both at once.
    drop(guard);
    if deleted {
        agents.lock().await.remove(&record.agent_id);
    }
}

async fn emit(events: &Arc<EventRouter>, record: &Arc<AgentRecord>, payload: EventPayload) {
    let event = Event::new(record.agent_id.session_id(), Some(record.agent_id.to_string()), payload);
    if let Err(err) = events.append(event).await {
        tracing::warn!(error = %err, agent_id = %record.agent_id, "failed to record background-agent event");
    }
}

async fn emit_status(events: &Arc<EventRouter>, record: &Arc<AgentRecord>, state: AgentState) {
    let status = record.snapshot().await;
    emit(
        events,
        record,
        EventPayload::BackgroundAgentStatus {
            agent_id: record.agent_id.to_string(),
            state: format!("{state:?}").to_lowercase(),
            last_run_at: status.last_run_at,
            run_count: status.run_count,
            error_count: status.error_count,
        },
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ravelin_memory::InMemoryBackend;
    use ravelin_provider::{ProviderError, TokenUsage};
    use ravelin_remote::RemoteFacade;
    use ravelin_resolver::ToolResolver;
    use ravelin_tool::ToolRegistry;
    use std::sync::atomic::AtomicU32;

    struct CountingProvider {
        calls: AtomicU32,
        fail_first_n: u32,
    }

    impl CountingProvider {
        fn new(fail_first_n: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_first_n,
            }
        }
    }

    impl Provider for CountingProvider {
        async fn complete(
            &self,
            _model_config: &ModelConfig,
            _messages: &[ravelin_core::Message],
            _tools_hint: Option<&[ravelin_core::ToolDescriptor]>,
        ) -> Result<(String, TokenUsage), ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first_n {
                return Err(ProviderError::RequestFailed("flaky".into()));
            }
            Ok(("Final Answer: ok".to_string(), TokenUsage::default()))
        }
    }

    fn test_config(interval_seconds: u64, max_retries: u32) -> BackgroundAgentConfig {
        BackgroundAgentConfig {
            system_instruction: "be helpful".into(),
            model_config: ModelConfig::default(),
            task_config: TaskConfig {
                query: "ping".into(),
                metadata: serde_json::Value::Null,
            },
            limits: EpisodeLimits::default(),
            interval_seconds,
            max_retries,
            retry_delay_seconds: 0,
        }
    }

    fn build_manager(provider: CountingProvider) -> BackgroundAgentManager<CountingProvider> {
        let resolver = ToolResolver::new(ToolRegistry::new(), RemoteFacade::new());
        let memory = Arc::new(InMemoryBackend::new());
        let events = Arc::new(EventRouter::new());
        let engine = Arc::new(ReactEngine::new(provider, resolver, memory, events.clone()));
        BackgroundAgentManager::new(engine, events)
    }

    #[tokio::test]
    async fn create_agent_before_start_is_pending() {
        let manager = build_manager(CountingProvider::new(0));
        let agent_id = AgentId::new("a1");
        manager.create_agent(agent_id.clone(), test_config(60, 0)).await.unwrap();
        let status = manager.status(&agent_id).await.unwrap();
        assert_eq!(status.state, AgentState::Pending);
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let manager = build_manager(CountingProvider::new(0));
        let agent_id = AgentId::new("a1");
        manager.create_agent(agent_id.clone(), test_config(60, 0)).await.unwrap();
        let err = manager.create_agent(agent_id, test_config(60, 0)).await.unwrap_err();
        assert!(matches!(err, AgentError::DuplicateId(_)));
    }

    #[tokio::test]
    async fn unknown_agent_operations_return_not_found() {
        let manager = build_manager(CountingProvider::new(0));
        let agent_id = AgentId::new("ghost");
        assert!(matches!(manager.status(&agent_id).await, Err(AgentError::NotFound(_))));
        assert!(matches!(manager.pause(&agent_id).await, Err(AgentError::NotFound(_))));
    }

    #[tokio::test]
    async fn pause_then_resume_on_idle_agent_is_a_no_op() {
        let manager = build_manager(CountingProvider::new(0));
        let agent_id = AgentId::new("a1");
        manager.create_agent(agent_id.clone(), test_config(60, 0)).await.unwrap();
        manager.start().await;
        manager.pause(&agent_id).await.unwrap();
        assert_eq!(manager.status(&agent_id).await.unwrap().state, AgentState::Paused);
        manager.resume(&agent_id).await.unwrap();
        let status = manager.status(&agent_id).await.unwrap();
        assert_eq!(status.state, AgentState::Idle);
        assert_eq!(status.run_count, 0);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn run_once_drives_an_episode_to_completion() {
        let manager = build_manager(CountingProvider::new(0));
        let agent_id = AgentId::new("a1");
        manager.create_agent(agent_id.clone(), test_config(3600, 0)).await.unwrap();
        let record = manager.get_record(&agent_id).await.unwrap();
        run_once(&manager.engine, &manager.events, &manager.agents, &record).await;
        let status = manager.status(&agent_id).await.unwrap();
        assert_eq!(status.state, AgentState::Idle);
        assert_eq!(status.run_count, 1);
        assert_eq!(status.error_count, 0);
    }

    #[tokio::test]
    async fn run_once_retries_then_succeeds() {
        let manager = build_manager(CountingProvider::new(2));
        let agent_id = AgentId::new("a1");
        manager.create_agent(agent_id.clone(), test_config(3600, 3)).await.unwrap();
        let record = manager.get_record(&agent_id).await.unwrap();
        run_once(&manager.engine, &manager.events, &manager.agents, &record).await;
        let status = manager.status(&agent_id).await.unwrap();
        assert_eq!(status.state, AgentState::Idle);
        assert_eq!(status.error_count, 0);
    }

    #[tokio::test]
    async fn run_once_exhausting_retries_lands_in_error_state() {
        let manager = build_manager(CountingProvider::new(99));
        let agent_id = AgentId::new("a1");
        manager.create_agent(agent_id.clone(), test_config(3600, 1)).await.unwrap();
        let record = manager.get_record(&agent_id).await.unwrap();
        run_once(&manager.engine, &manager.events, &manager.agents, &record).await;
        let status = manager.status(&agent_id).await.unwrap();
        assert_eq!(status.state, AgentState::Error);
        assert_eq!(status.error_count, 1);
        assert!(status.last_error.is_some());
    }

    #[tokio::test]
    async fn concurrent_run_once_is_skipped_as_busy() {
        let manager = build_manager(CountingProvider::new(0));
        let agent_id = AgentId::new("a1");
        manager.create_agent(agent_id.clone(), test_config(3600, 0)).await.unwrap();
        let record = manager.get_record(&agent_id).await.unwrap();
        let _guard = record.run_lock.try_lock().unwrap();
        run_once(&manager.engine, &manager.events, &manager.agents, &record).await;
        // Held externally, so the agent never transitioned out of Idle.
        let status = manager.status(&agent_id).await.unwrap();
        assert_eq!(status.run_count, 0);
    }

    #[tokio::test]
    async fn delete_agent_removes_record_when_idle() {
        let manager = build_manager(CountingProvider::new(0));
        let agent_id = AgentId::new("a1");
        manager.create_agent(agent_id.clone(), test_config(60, 0)).await.unwrap();
        manager.start().await;
        manager.delete_agent(&agent_id).await.unwrap();
        assert!(matches!(manager.status(&agent_id).await, Err(AgentError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_agent_during_run_is_finalized_by_run_once() {
        let manager = build_manager(CountingProvider::new(0));
        let agent_id = AgentId::new("a1");
        manager.create_agent(agent_id.clone(), test_config(3600, 0)).await.unwrap();
        let record = manager.get_record(&agent_id).await.unwrap();

        // Simulate "currently running" by holding the run-lock ourselves.
        let guard = record.run_lock.try_lock().unwrap();
        manager.delete_agent(&agent_id).await.unwrap();
        // Still present: the run-lock was held, so delete_agent could not
        // remove it immediately.
        assert!(manager.status(&agent_id).await.is_ok());
        drop(guard);

        run_once(&manager.engine, &manager.events, &manager.agents, &record).await;
        assert!(matches!(manager.status(&agent_id).await, Err(AgentError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_config_changes_interval_without_resetting_counters() {
        let manager = build_manager(CountingProvider::new(0));
        let agent_id = AgentId::new("a1");
        manager.create_agent(agent_id.clone(), test_config(60, 0)).await.unwrap();
        manager
            .update_config(
                &agent_id,
                BackgroundAgentConfigPatch {
                    interval_seconds: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let record = manager.get_record(&agent_id).await.unwrap();
        assert_eq!(record.config.read().await.interval_seconds, 5);
        assert_eq!(manager.status(&agent_id).await.unwrap().run_count, 0);
        manager.shutdown().await;
    }
}
