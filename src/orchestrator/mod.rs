//! Investigation orchestration.
//!
//! [`InvestigationOrchestrator`] runs the primary agents one after another,
//! then hands their results to the adjudicator. A failing agent is replaced
//! by a placeholder result and never stops the sequence.

pub mod phase;

pub use phase::{InvestigationPhase, InvestigationRun};

use crate::agent::registry;
use crate::client::{AgentInput, AnalysisClient};
use crate::error::InvestigationError;
use crate::models::{
    AdjudicationPayload, AgentId, AgentOutcome, AgentRunState, AnalysisResult, Artifact,
    VerdictResult,
};
use crate::store::ResultStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default pause between primary agents.
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// Result of a full investigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvestigationSummary {
    /// Stored verdict (the placeholder if the adjudicator failed).
    pub verdict: VerdictResult,
    /// Agents whose stored result is a placeholder, in run order.
    pub failed_agents: Vec<AgentId>,
}

/// Held while a run is in flight; releases the busy flag on drop.
struct RunGuard<'a> {
    busy: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(busy: &'a AtomicBool) -> Result<Self, InvestigationError> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { busy })
            .map_err(|_| InvestigationError::AlreadyRunning)
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Drives full investigations and single-agent re-runs.
///
/// Only one run (full or single-agent) may be in flight at a time; a second
/// request is rejected with [`InvestigationError::AlreadyRunning`].
pub struct InvestigationOrchestrator {
    client: AnalysisClient,
    store: ResultStore,
    pacing: Duration,
    busy: AtomicBool,
    phase: watch::Sender<InvestigationPhase>,
}

impl InvestigationOrchestrator {
    pub fn new(client: AnalysisClient, pacing: Duration) -> Self {
        Self::with_store(client, ResultStore::new(), pacing)
    }

    /// Orchestrator writing into an existing store.
    pub fn with_store(client: AnalysisClient, store: ResultStore, pacing: Duration) -> Self {
        let (phase, _) = watch::channel(InvestigationPhase::Idle);
        Self {
            client,
            store,
            pacing,
            busy: AtomicBool::new(false),
            phase,
        }
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Phase of the current (or last) full investigation.
    pub fn phase(&self) -> InvestigationPhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<InvestigationPhase> {
        self.phase.subscribe()
    }

    /// Returns true while any run is in flight.
    #[allow(dead_code)] // Polled by embedders and tests
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run every primary agent in registry order, then the adjudicator.
    ///
    /// Always reaches [`InvestigationPhase::Completed`] once started. Agent
    /// N+1 is dispatched only after agent N's result is in the store.
    pub async fn run_full_investigation(
        &self,
        artifact: Option<&Artifact>,
    ) -> Result<InvestigationSummary, InvestigationError> {
        let artifact = artifact.ok_or(InvestigationError::MissingArtifact)?;
        let _guard = RunGuard::acquire(&self.busy)?;

        info!(
            "Starting investigation of {} ({} bytes)",
            artifact.file_name(),
            artifact.bytes().len()
        );

        let mut run = InvestigationRun::start(&self.phase);
        self.store.reset(&AgentId::ALL);
        let mut failed_agents = Vec::new();

        for (index, &agent) in registry::primary_agents().iter().enumerate() {
            run.advance(InvestigationPhase::RunningAgent { index, agent });

            let (outcome, degraded) = self.invoke(agent, AgentInput::Artifact(artifact)).await;
            if degraded {
                failed_agents.push(agent);
            }
            if let Some(result) = outcome.as_analysis() {
                run.record(agent, result.clone());
            }

            self.pace().await;
        }

        run.advance(InvestigationPhase::Aggregating);
        let payload = run.adjudication_payload();

        run.advance(InvestigationPhase::RunningJustice);
        let justice = registry::adjudicator();
        let (outcome, degraded) = self
            .invoke(justice, AgentInput::Adjudication(&payload))
            .await;
        if degraded {
            failed_agents.push(justice);
        }

        run.advance(InvestigationPhase::Completed);

        let verdict = outcome
            .as_verdict()
            .cloned()
            .unwrap_or_else(VerdictResult::connection_failed);
        info!(
            "Investigation complete: verdict {} ({}% confidence)",
            verdict.verdict, verdict.confidence_score
        );

        Ok(InvestigationSummary {
            verdict,
            failed_agents,
        })
    }

    /// Re-run exactly one agent, leaving every other agent's state alone.
    ///
    /// The adjudicator reads the current store contents, not the results of
    /// the last full run.
    pub async fn run_single_agent(
        &self,
        agent: AgentId,
        artifact: Option<&Artifact>,
    ) -> Result<AgentOutcome, InvestigationError> {
        if agent.is_adjudicator() {
            let _guard = RunGuard::acquire(&self.busy)?;
            info!("Re-running {}", agent);

            let snapshot = self.store.snapshot();
            let payload = AdjudicationPayload::build(|primary| {
                snapshot
                    .get(&primary)
                    .and_then(AgentRunState::analysis)
                    .map(|result| result.analysis_text.as_str())
            });

            let (outcome, _) = self.invoke(agent, AgentInput::Adjudication(&payload)).await;
            Ok(outcome)
        } else {
            let artifact = artifact.ok_or(InvestigationError::MissingArtifact)?;
            let _guard = RunGuard::acquire(&self.busy)?;
            info!("Re-running {}", agent);

            let (outcome, _) = self.invoke(agent, AgentInput::Artifact(artifact)).await;
            Ok(outcome)
        }
    }

    /// Call one agent and settle its result in the store.
    ///
    /// Returns the stored outcome and whether it is a placeholder.
    async fn invoke(&self, agent: AgentId, input: AgentInput<'_>) -> (AgentOutcome, bool) {
        self.store.mark_running(agent);
        debug!("Dispatching {}", agent);

        let (outcome, error) = match self.client.run_agent(agent, input).await {
            Ok(outcome) => {
                info!("Agent {} finished", agent);
                (outcome, None)
            }
            Err(err) => {
                warn!("{}; storing placeholder result", err);
                (degraded_outcome(agent), Some(err.cause.to_string()))
            }
        };

        let degraded = error.is_some();
        self.store.settle(agent, outcome.clone(), error);
        (outcome, degraded)
    }

    async fn pace(&self) {
        if !self.pacing.is_zero() {
            debug!("Pacing for {:?}", self.pacing);
            tokio::time::sleep(self.pacing).await;
        }
    }
}

/// Placeholder stored when `agent`'s call failed.
fn degraded_outcome(agent: AgentId) -> AgentOutcome {
    if agent.is_adjudicator() {
        VerdictResult::connection_failed().into()
    } else {
        AnalysisResult::failed().into()
    }
}
