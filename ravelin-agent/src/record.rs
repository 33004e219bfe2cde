//! Per-agent internal state: the run-lock, the live config, and the
//! counters a [`crate::AgentStatus`] snapshot is read from.

use chrono::{DateTime, Utc};
use ravelin_core::AgentId;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{AgentState, BackgroundAgentConfig};

/// Everything the manager and scheduler share about one background agent.
///
/// The run-lock (`run_lock`) and the agent's own fields are updated
/// together but never while the manager's top-level map lock is held —
/// see the module doc on [`crate::BackgroundAgentManager`].
pub(crate) struct AgentRecord {
    pub(crate) agent_id: AgentId,
    pub(crate) config: RwLock<BackgroundAgentConfig>,
    pub(crate) state: RwLock<AgentState>,
    pub(crate) run_count: AtomicU64,
    pub(crate) error_count: AtomicU64,
    pub(crate) last_run_at: RwLock<Option<DateTime<Utc>>>,
    pub(crate) last_error: RwLock<Option<String>>,
    /// Non-reentrant; held for the whole duration of a run.
    pub(crate) run_lock: Mutex<()>,
    /// Cancelled on `delete_agent` or manager shutdown; checked at every
    /// suspension point inside the ReAct episode.
    pub(crate) cancel: CancellationToken,
    /// Set when `pause` arrives while a run is in flight; applied when
    /// the run ends instead of interrupting it.
    pub(crate) pause_requested: AtomicBool,
    /// Set when `delete_agent` arrives while a run is in flight; the
    /// record is removed from the manager's map once the run-lock is
    /// released, not before.
    pub(crate) delete_requested: AtomicBool,
    /// The scheduler tick loop reads the current interval from this
    /// receiver before every sleep, so `update_config` takes effect at
    /// or before the next tick without tearing down the loop.
    pub(crate) interval_rx: watch::Receiver<u64>,
    pub(crate) interval_tx: watch::Sender<u64>,
    /// The scheduler tick loop's handle, so shutdown/delete can await its
    /// exit after signaling cancellation.
    pub(crate) tick_handle: StdMutex<Option<JoinHandle<()>>>,
}

impl AgentRecord {
    pub(crate) fn new(
        agent_id: AgentId,
        config: BackgroundAgentConfig,
        initial_state: AgentState,
        parent_cancel: &CancellationToken,
    ) -> Self {
        let (interval_tx, interval_rx) = watch::channel(config.interval_seconds);
        Self {
            agent_id,
            config: RwLock::new(config),
            state: RwLock::new(initial_state),
            run_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            last_run_at: RwLock::new(None),
            last_error: RwLock::new(None),
            run_lock: Mutex::new(()),
            cancel: parent_cancel.child_token(),
            pause_requested: AtomicBool::new(false),
            delete_requested: AtomicBool::new(false),
            interval_tx,
            interval_rx,
            tick_handle: StdMutex::new(None),
        }
    }

    pub(crate) async fn snapshot(&self) -> crate::AgentStatus {
        crate::AgentStatus {
            agent_id: self.agent_id.clone(),
            state: *self.state.read().await,
            run_count: self.run_count.load(Ordering::SeqCst),
            error_count: self.error_count.load(Ordering::SeqCst),
            last_run_at: *self.last_run_at.read().await,
            last_error: self.last_error.read().await.clone(),
        }
    }
}
