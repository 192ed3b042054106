//! Per-agent result state.
//!
//! [`ResultStore`] owns every [`AgentRunState`]. The orchestrator writes to
//! it; presentation code reads snapshots or subscribes to changes.

use crate::models::{AgentId, AgentOutcome, AgentRunState};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Full store contents, ordered by agent.
pub type StoreSnapshot = BTreeMap<AgentId, AgentRunState>;

/// Shared handle to the per-agent state. Clones see the same state.
#[derive(Debug, Clone)]
pub struct ResultStore {
    states: Arc<watch::Sender<StoreSnapshot>>,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore {
    pub fn new() -> Self {
        let (states, _) = watch::channel(StoreSnapshot::new());
        Self {
            states: Arc::new(states),
        }
    }

    /// Replace the state of `agent`.
    pub fn set(&self, agent: AgentId, state: AgentRunState) {
        self.states.send_modify(|states| {
            states.insert(agent, state);
        });
    }

    /// Current state of `agent`; absent agents read as the default state.
    #[allow(dead_code)] // Readers mostly take a snapshot
    pub fn get(&self, agent: AgentId) -> AgentRunState {
        self.states.borrow().get(&agent).cloned().unwrap_or_default()
    }

    /// Clear the state of every agent in `agents`.
    pub fn reset(&self, agents: &[AgentId]) {
        self.states.send_modify(|states| {
            for agent in agents {
                states.remove(agent);
            }
        });
    }

    /// Flag `agent` as in flight, keeping its previous result.
    pub fn mark_running(&self, agent: AgentId) {
        self.states.send_modify(|states| {
            states.entry(agent).or_default().is_running = true;
        });
    }

    /// Write the settled result of `agent` and clear its running flag.
    pub fn settle(&self, agent: AgentId, outcome: AgentOutcome, error: Option<String>) {
        self.set(
            agent,
            AgentRunState {
                is_running: false,
                result: Some(outcome),
                error,
                settled_at: Some(Utc::now()),
            },
        );
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.states.borrow().clone()
    }

    /// Returns true if any agent is in flight.
    #[allow(dead_code)]
    pub fn any_running(&self) -> bool {
        self.states.borrow().values().any(|s| s.is_running)
    }

    /// Receiver notified on every write.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.states.subscribe()
    }
}
