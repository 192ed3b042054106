//! Analysis service client.
//!
//! [`AnalysisClient`] performs one request for one agent through an
//! [`AgentTransport`] and normalizes the response into a canonical result.

#[cfg(test)]
pub mod fakes;
pub mod normalize;
pub mod transport;

pub use transport::{AgentTransport, HttpTransport};

use crate::agent::registry;
use crate::config::ServiceConfig;
use crate::error::{AgentError, AgentFailure};
use crate::models::{AdjudicationPayload, AgentId, AgentOutcome, AnalysisResult, Artifact, VerdictResult};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Input for one agent call.
#[derive(Debug, Clone, Copy)]
pub enum AgentInput<'a> {
    /// The uploaded document, for primary agents.
    Artifact(&'a Artifact),
    /// The aggregate of primary results, for the adjudicator.
    Adjudication(&'a AdjudicationPayload),
}

/// Client for the remote analysis service.
#[derive(Clone)]
pub struct AnalysisClient {
    transport: Arc<dyn AgentTransport>,
}

impl AnalysisClient {
    pub fn new(transport: Arc<dyn AgentTransport>) -> Self {
        Self { transport }
    }

    /// Client over HTTP using the service settings.
    pub fn http(config: &ServiceConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Run `agent` on `input` and return its normalized result.
    pub async fn run_agent(
        &self,
        agent: AgentId,
        input: AgentInput<'_>,
    ) -> Result<AgentOutcome, AgentError> {
        match input {
            AgentInput::Artifact(artifact) => self.analyze(agent, artifact).await.map(Into::into),
            AgentInput::Adjudication(payload) if agent.is_adjudicator() => {
                self.adjudicate(payload).await.map(Into::into)
            }
            AgentInput::Adjudication(_) => Err(AgentError::new(
                agent,
                AgentFailure::InputMismatch {
                    expected: "artifact",
                },
            )),
        }
    }

    /// Upload the artifact to a primary agent.
    pub async fn analyze(
        &self,
        agent: AgentId,
        artifact: &Artifact,
    ) -> Result<AnalysisResult, AgentError> {
        if agent.is_adjudicator() {
            return Err(AgentError::new(
                agent,
                AgentFailure::InputMismatch {
                    expected: "adjudication payload",
                },
            ));
        }

        let body = self
            .transport
            .analyze(agent, artifact)
            .await
            .map_err(|e| AgentError::new(agent, e))?;
        debug!("Agent {} responded: {}", agent, body);

        Ok(normalize::normalize_analysis(&body))
    }

    /// Ask the adjudicator for a verdict over the payload.
    pub async fn adjudicate(
        &self,
        payload: &AdjudicationPayload,
    ) -> Result<VerdictResult, AgentError> {
        let agent = registry::adjudicator();

        let body = self
            .transport
            .adjudicate(payload)
            .await
            .map_err(|e| AgentError::new(agent, e))?;
        debug!("Agent {} responded: {}", agent, body);

        Ok(normalize::normalize_verdict(&body))
    }
}
