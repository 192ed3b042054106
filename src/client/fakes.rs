//! Scripted in-memory transport (testing only).
//!
//! Replies are configured per agent; every call is recorded together with
//! the result store as it looked when the call was dispatched.

use crate::client::AgentTransport;
use crate::error::TransportError;
use crate::models::{AdjudicationPayload, AgentId, Artifact};
use crate::store::{ResultStore, StoreSnapshot};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Scripted reply for one agent.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with this JSON body.
    Body(Value),
    /// Fail at the transport level.
    Fail,
}

/// One recorded transport call.
#[derive(Debug, Clone)]
pub struct Call {
    pub agent: AgentId,
    pub payload: Option<AdjudicationPayload>,
    /// Store contents at dispatch time, when a store is observed.
    pub snapshot: Option<StoreSnapshot>,
}

#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<AgentId, Reply>>,
    calls: Mutex<Vec<Call>>,
    observed: Option<ResultStore>,
    hold_first: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, agent: AgentId, reply: Reply) -> Self {
        self.set_reply(agent, reply);
        self
    }

    /// Record a store snapshot on every call.
    pub fn observing(mut self, store: ResultStore) -> Self {
        self.observed = Some(store);
        self
    }

    /// Block the first call: notify `started`, then wait for `release`.
    pub fn holding_first_call(self, started: Arc<Notify>, release: Arc<Notify>) -> Self {
        *self.hold_first.lock().unwrap() = Some((started, release));
        self
    }

    pub fn set_reply(&self, agent: AgentId, reply: Reply) {
        self.replies.lock().unwrap().insert(agent, reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_agents(&self) -> Vec<AgentId> {
        self.calls().into_iter().map(|c| c.agent).collect()
    }

    /// Payload of the most recent adjudicator call.
    pub fn last_payload(&self) -> Option<AdjudicationPayload> {
        self.calls().into_iter().rev().find_map(|c| c.payload)
    }

    async fn respond(
        &self,
        agent: AgentId,
        payload: Option<AdjudicationPayload>,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(Call {
            agent,
            payload,
            snapshot: self.observed.as_ref().map(ResultStore::snapshot),
        });

        let hold = self.hold_first.lock().unwrap().take();
        if let Some((started, release)) = hold {
            started.notify_one();
            release.notified().await;
        }

        let reply = self.replies.lock().unwrap().get(&agent).cloned();
        match reply.unwrap_or_else(|| default_reply(agent)) {
            Reply::Body(body) => Ok(body),
            Reply::Fail => Err(TransportError::Connect("scripted".to_string())),
        }
    }
}

fn default_reply(agent: AgentId) -> Reply {
    if agent.is_adjudicator() {
        Reply::Body(json!({"verdict": "CLEAR", "confidence_score": 90, "analysis": "fine"}))
    } else {
        Reply::Body(json!({"analysis": "ok", "risk_score": 10}))
    }
}

#[async_trait]
impl AgentTransport for ScriptedTransport {
    async fn analyze(&self, agent: AgentId, _artifact: &Artifact) -> Result<Value, TransportError> {
        self.respond(agent, None).await
    }

    async fn adjudicate(&self, payload: &AdjudicationPayload) -> Result<Value, TransportError> {
        self.respond(AgentId::Justice, Some(payload.clone())).await
    }
}
