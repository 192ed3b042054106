//! Error types for the investigation core.
//!
//! Transport and response errors are recovered by the orchestrator into
//! degraded results; only [`InvestigationError`] ever reaches the caller.

use crate::models::{AgentId, VerdictResult};
use thiserror::Error;

/// Failure of a single request against the analysis service.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response within the configured per-request timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The service could not be reached.
    #[error("cannot connect to analysis service at {0}")]
    Connect(String),

    /// The service answered with a non-success status.
    #[error("analysis service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not JSON.
    #[error("response body is not valid JSON: {0}")]
    InvalidBody(String),

    /// Any other request failure.
    #[error("request failed: {0}")]
    Request(String),
}

/// Why an agent call produced no result.
#[derive(Debug, Error)]
pub enum AgentFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The input variant does not fit the agent (artifact vs. payload).
    #[error("agent expects {expected} input")]
    InputMismatch { expected: &'static str },
}

/// A failed call for one agent.
#[derive(Debug, Error)]
#[error("agent {agent} failed: {cause}")]
pub struct AgentError {
    pub agent: AgentId,
    #[source]
    pub cause: AgentFailure,
}

impl AgentError {
    pub fn new(agent: AgentId, cause: impl Into<AgentFailure>) -> Self {
        Self {
            agent,
            cause: cause.into(),
        }
    }
}

/// Adjudicator text that should have held a JSON verdict but did not.
#[derive(Debug, Error)]
#[error("malformed adjudicator response: {reason}")]
pub struct MalformedResponse {
    pub raw: String,
    pub reason: String,
}

impl MalformedResponse {
    /// The `ERROR` verdict carrying the raw text.
    pub fn into_verdict(self) -> VerdictResult {
        VerdictResult::error(self.raw)
    }
}

/// Errors surfaced to callers of the orchestrator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvestigationError {
    /// A primary agent needs the artifact and none was provided.
    #[error("no artifact provided: upload a file first")]
    MissingArtifact,

    /// Another investigation or agent run is still in flight.
    #[error("an investigation is already in progress")]
    AlreadyRunning,
}
