//! Data models for the investigation.
//!
//! This module contains the core data structures shared by the client,
//! the result store, the orchestrator and the report generator.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Placeholder sent to the adjudicator for an agent without a result.
pub const NO_DATA: &str = "No Data";

/// Analysis text stored when a primary agent call fails.
pub const ANALYSIS_FAILED: &str = "Analysis Failed.";

/// Analysis text stored when the adjudicator call fails.
pub const CONNECTION_FAILED: &str = "Connection Failed.";

/// Verdict used whenever the adjudicator produced nothing usable.
pub const ERROR_VERDICT: &str = "ERROR";

/// Identifier of one analysis agent.
///
/// Declaration order is registry order, so the derived `Ord` sorts agents
/// the way they run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AgentId {
    /// Revenue anomalies and creative accounting
    Accountant,
    /// Toxic clauses and liability traps
    Legal,
    /// Claims versus industry reality
    Skeptic,
    /// Litigation and compliance red flags
    Bloodhound,
    /// Final adjudication over all primary agents
    Justice,
}

impl AgentId {
    /// Every agent, primary agents first.
    pub const ALL: [AgentId; 5] = [
        AgentId::Accountant,
        AgentId::Legal,
        AgentId::Skeptic,
        AgentId::Bloodhound,
        AgentId::Justice,
    ];

    /// Lowercase name, also used as the remote endpoint slug.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Accountant => "accountant",
            AgentId::Legal => "legal",
            AgentId::Skeptic => "skeptic",
            AgentId::Bloodhound => "bloodhound",
            AgentId::Justice => "justice",
        }
    }

    /// Returns true for the adjudication agent.
    pub fn is_adjudicator(&self) -> bool {
        matches!(self, AgentId::Justice)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk-scored narrative produced by a primary agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Narrative analysis (usually Markdown).
    pub analysis_text: String,
    /// Risk score, 0 to 100.
    pub risk_score: u8,
}

impl AnalysisResult {
    pub fn new(analysis_text: impl Into<String>, risk_score: u8) -> Self {
        Self {
            analysis_text: analysis_text.into(),
            risk_score: risk_score.min(100),
        }
    }

    /// Placeholder stored when the agent call failed.
    pub fn failed() -> Self {
        Self::new(ANALYSIS_FAILED, 0)
    }

    /// Risk level bucket for the score.
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }
}

/// Final verdict produced by the adjudicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictResult {
    /// Verdict label, e.g. `BUY`, `HOLD`, `GUILTY` or `ERROR`.
    pub verdict: String,
    /// Confidence, 0 to 100.
    pub confidence_score: u8,
    /// Reasoning behind the verdict.
    pub analysis_text: String,
}

impl VerdictResult {
    pub fn new(verdict: impl Into<String>, confidence_score: u8, analysis_text: impl Into<String>) -> Self {
        Self {
            verdict: verdict.into(),
            confidence_score: confidence_score.min(100),
            analysis_text: analysis_text.into(),
        }
    }

    /// `ERROR` verdict carrying whatever text the service returned.
    pub fn error(analysis_text: impl Into<String>) -> Self {
        Self::new(ERROR_VERDICT, 0, analysis_text)
    }

    /// Placeholder stored when the adjudicator call failed.
    pub fn connection_failed() -> Self {
        Self::error(CONNECTION_FAILED)
    }

    pub fn is_error(&self) -> bool {
        self.verdict == ERROR_VERDICT
    }
}

/// Canonical result of one agent call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AgentOutcome {
    Analysis(AnalysisResult),
    Verdict(VerdictResult),
}

impl AgentOutcome {
    pub fn as_analysis(&self) -> Option<&AnalysisResult> {
        match self {
            AgentOutcome::Analysis(result) => Some(result),
            AgentOutcome::Verdict(_) => None,
        }
    }

    pub fn as_verdict(&self) -> Option<&VerdictResult> {
        match self {
            AgentOutcome::Verdict(verdict) => Some(verdict),
            AgentOutcome::Analysis(_) => None,
        }
    }
}

impl From<AnalysisResult> for AgentOutcome {
    fn from(result: AnalysisResult) -> Self {
        AgentOutcome::Analysis(result)
    }
}

impl From<VerdictResult> for AgentOutcome {
    fn from(verdict: VerdictResult) -> Self {
        AgentOutcome::Verdict(verdict)
    }
}

/// Per-agent state held by the result store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRunState {
    /// A request for this agent is in flight.
    pub is_running: bool,
    /// Last settled result, if any.
    pub result: Option<AgentOutcome>,
    /// Cause of failure when `result` is a degraded placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the result was last written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<DateTime<Utc>>,
}

impl AgentRunState {
    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.result.as_ref().and_then(AgentOutcome::as_analysis)
    }

    pub fn verdict(&self) -> Option<&VerdictResult> {
        self.result.as_ref().and_then(AgentOutcome::as_verdict)
    }

    /// Returns true if the stored result is a locally synthesized placeholder.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// The uploaded document under investigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    file_name: String,
    bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read an artifact from disk. Content is not inspected.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read artifact: {}", path.display()))?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self::new(file_name, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// JSON body sent to the adjudicator: one analysis text per primary agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjudicationPayload {
    pub accountant_analysis: String,
    pub legal_analysis: String,
    pub skeptic_analysis: String,
    pub bloodhound_analysis: String,
}

impl AdjudicationPayload {
    /// Build the payload from a lookup of each primary agent's analysis text.
    ///
    /// Missing or empty texts become [`NO_DATA`].
    pub fn build<'a, F>(lookup: F) -> Self
    where
        F: Fn(AgentId) -> Option<&'a str>,
    {
        let field = |agent: AgentId| match lookup(agent) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => NO_DATA.to_string(),
        };

        Self {
            accountant_analysis: field(AgentId::Accountant),
            legal_analysis: field(AgentId::Legal),
            skeptic_analysis: field(AgentId::Skeptic),
            bloodhound_analysis: field(AgentId::Bloodhound),
        }
    }

    /// The field carrying `agent`'s analysis; `None` for the adjudicator.
    #[allow(dead_code)] // Field lookup by agent
    pub fn field(&self, agent: AgentId) -> Option<&str> {
        match agent {
            AgentId::Accountant => Some(&self.accountant_analysis),
            AgentId::Legal => Some(&self.legal_analysis),
            AgentId::Skeptic => Some(&self.skeptic_analysis),
            AgentId::Bloodhound => Some(&self.bloodhound_analysis),
            AgentId::Justice => None,
        }
    }
}

/// Risk bucket derived from a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Below 25
    Low,
    /// 25 to 49
    Medium,
    /// 50 to 74
    High,
    /// 75 and above
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=24 => RiskLevel::Low,
            25..=49 => RiskLevel::Medium,
            50..=74 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    /// Returns an emoji representation of the level.
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🟠",
            RiskLevel::Critical => "🔴",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
            RiskLevel::Critical => write!(f, "Critical"),
        }
    }
}

/// One primary agent's section of the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReport {
    pub id: AgentId,
    pub name: String,
    pub title: String,
    /// Stored result (the placeholder when the call failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    /// Failure cause for degraded results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentReport {
    /// Returns true if the agent produced a real (non-degraded) analysis.
    pub fn succeeded(&self) -> bool {
        self.result.is_some() && self.error.is_none()
    }
}

/// Summary statistics over the primary agents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    /// Agents with a real analysis.
    pub analyzed: usize,
    /// Agents whose result is a failure placeholder.
    pub failed: usize,
    /// Mean risk score over analyzed agents.
    pub mean_risk: f64,
    /// Agent with the highest risk score, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_risk_agent: Option<AgentId>,
    pub highest_risk_score: u8,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl RiskSummary {
    /// Creates a summary from the per-agent report sections.
    ///
    /// Degraded placeholders count as failures, not as zero-risk analyses.
    pub fn from_agents(agents: &[AgentReport]) -> Self {
        let mut summary = Self::default();
        let mut total: u32 = 0;

        for agent in agents {
            if agent.error.is_some() {
                summary.failed += 1;
                continue;
            }
            let Some(result) = &agent.result else {
                continue;
            };

            summary.analyzed += 1;
            total += u32::from(result.risk_score);

            match result.risk_level() {
                RiskLevel::Low => summary.low += 1,
                RiskLevel::Medium => summary.medium += 1,
                RiskLevel::High => summary.high += 1,
                RiskLevel::Critical => summary.critical += 1,
            }

            if summary.highest_risk_agent.is_none() || result.risk_score > summary.highest_risk_score {
                summary.highest_risk_agent = Some(agent.id);
                summary.highest_risk_score = result.risk_score;
            }
        }

        if summary.analyzed > 0 {
            summary.mean_risk = f64::from(total) / summary.analyzed as f64;
        }

        summary
    }
}

/// Metadata about the investigation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Name of the investigated file.
    pub file_name: String,
    /// Base URL of the analysis service.
    pub service_url: String,
    /// Date and time of the investigation.
    pub analysis_date: DateTime<Utc>,
    /// Number of agents with a stored result.
    pub agents_run: usize,
    /// Number of agents whose result is degraded.
    pub agents_failed: usize,
    /// Duration of the investigation in seconds.
    pub duration_seconds: f64,
}

/// The complete investigation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// Adjudicator verdict, if the adjudicator ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<VerdictResult>,
    /// Failure cause when the verdict is a placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict_error: Option<String>,
    /// Primary agents in registry order.
    pub agents: Vec<AgentReport>,
    pub summary: RiskSummary,
}
