//! Phase state machine for one full investigation.
//!
//! `Idle -> RunningAgent(0..n) -> Aggregating -> RunningJustice -> Completed`.
//! Transitions only move forward; a failed agent advances like a successful
//! one.

use crate::models::{AdjudicationPayload, AgentId, AnalysisResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Where a full investigation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum InvestigationPhase {
    Idle,
    RunningAgent { index: usize, agent: AgentId },
    Aggregating,
    RunningJustice,
    Completed,
}

impl InvestigationPhase {
    fn rank(&self) -> (u8, usize) {
        match self {
            InvestigationPhase::Idle => (0, 0),
            InvestigationPhase::RunningAgent { index, .. } => (1, *index),
            InvestigationPhase::Aggregating => (2, 0),
            InvestigationPhase::RunningJustice => (3, 0),
            InvestigationPhase::Completed => (4, 0),
        }
    }

    /// Returns true if `next` lies strictly ahead of `self`.
    pub fn can_advance_to(&self, next: &InvestigationPhase) -> bool {
        next.rank() > self.rank()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InvestigationPhase::Completed)
    }
}

impl fmt::Display for InvestigationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvestigationPhase::Idle => write!(f, "idle"),
            InvestigationPhase::RunningAgent { index, agent } => {
                write!(f, "running {} (#{})", agent, index + 1)
            }
            InvestigationPhase::Aggregating => write!(f, "aggregating"),
            InvestigationPhase::RunningJustice => write!(f, "running justice"),
            InvestigationPhase::Completed => write!(f, "completed"),
        }
    }
}

/// Transient state of one full investigation.
///
/// Holds the accumulator of primary results used to build the adjudication
/// payload. The result store stays the source of truth.
pub struct InvestigationRun<'a> {
    phase: &'a watch::Sender<InvestigationPhase>,
    current: InvestigationPhase,
    completed: BTreeMap<AgentId, AnalysisResult>,
}

impl<'a> InvestigationRun<'a> {
    /// Begin a run, publishing `Idle`.
    pub fn start(phase: &'a watch::Sender<InvestigationPhase>) -> Self {
        phase.send_replace(InvestigationPhase::Idle);
        Self {
            phase,
            current: InvestigationPhase::Idle,
            completed: BTreeMap::new(),
        }
    }

    /// Move to `next` and publish it.
    pub fn advance(&mut self, next: InvestigationPhase) {
        if !self.current.can_advance_to(&next) {
            warn!("Backward phase transition {} -> {}", self.current, next);
            debug_assert!(false, "phase moved backward: {} -> {}", self.current, next);
        }
        debug!("Phase {} -> {}", self.current, next);
        self.current = next;
        self.phase.send_replace(next);
    }

    /// Remember a primary agent's settled result.
    pub fn record(&mut self, agent: AgentId, result: AnalysisResult) {
        self.completed.insert(agent, result);
    }

    /// Payload for the adjudicator, from the accumulated results.
    pub fn adjudication_payload(&self) -> AdjudicationPayload {
        AdjudicationPayload::build(|agent| {
            self.completed
                .get(&agent)
                .map(|result| result.analysis_text.as_str())
        })
    }
}
