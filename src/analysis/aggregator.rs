//! Result aggregation and statistics.
//!
//! This module turns a result store snapshot into per-agent report sections
//! and computes summary statistics over them.

use crate::agent::{definition, primary_agents};
use crate::models::{AgentId, AgentReport, RiskLevel, RiskSummary};
use crate::store::StoreSnapshot;

/// Build report sections for the primary agents, in run order.
///
/// Agents without a stored result still get a section with no result.
pub fn agent_reports(snapshot: &StoreSnapshot) -> Vec<AgentReport> {
    primary_agents()
        .iter()
        .map(|&id| {
            let def = definition(id);
            let state = snapshot.get(&id);
            let result = state.and_then(|s| s.analysis()).cloned();

            AgentReport {
                id,
                name: def.name.to_string(),
                title: def.title.to_string(),
                risk_level: result.as_ref().map(|r| r.risk_level()),
                result,
                error: state.and_then(|s| s.error.clone()),
            }
        })
        .collect()
}

/// Agents (primary or adjudicator) whose stored result is degraded.
pub fn failed_agents(snapshot: &StoreSnapshot) -> Vec<AgentId> {
    snapshot
        .iter()
        .filter(|(_, state)| state.is_degraded())
        .map(|(&id, _)| id)
        .collect()
}

/// Sort sections by risk score (highest first). Sections without a real
/// analysis go last.
pub fn sort_by_risk(agents: &mut [AgentReport]) {
    agents.sort_by_key(|a| {
        std::cmp::Reverse(if a.succeeded() {
            a.result.as_ref().map(|r| u16::from(r.risk_score) + 1)
        } else {
            None
        })
    });
}

/// Sections with a real analysis at or above `level`.
pub fn agents_at_or_above(agents: &[AgentReport], level: RiskLevel) -> Vec<&AgentReport> {
    agents
        .iter()
        .filter(|a| a.succeeded() && a.risk_level.is_some_and(|l| l >= level))
        .collect()
}

/// Generate a text summary of risk statistics.
pub fn generate_summary_text(summary: &RiskSummary) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "Agents analyzed: {} (failed: {})",
        summary.analyzed, summary.failed
    ));
    if summary.analyzed > 0 {
        lines.push(format!("Mean risk: {:.1}", summary.mean_risk));
    }
    if let Some(agent) = summary.highest_risk_agent {
        lines.push(format!(
            "Highest risk: {} ({})",
            definition(agent).title,
            summary.highest_risk_score
        ));
    }
    lines.push(format!(
        "- {} Critical: {}",
        RiskLevel::Critical.emoji(),
        summary.critical
    ));
    lines.push(format!("- {} High: {}", RiskLevel::High.emoji(), summary.high));
    lines.push(format!(
        "- {} Medium: {}",
        RiskLevel::Medium.emoji(),
        summary.medium
    ));
    lines.push(format!("- {} Low: {}", RiskLevel::Low.emoji(), summary.low));

    lines.join("\n")
}
