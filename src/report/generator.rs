//! Markdown report generation.
//!
//! This module builds the investigation report from the result store and
//! renders it as Markdown or JSON.

use crate::agent::{adjudicator, definition};
use crate::analysis::{agent_reports, failed_agents, sort_by_risk};
use crate::models::{AgentReport, Report, ReportMetadata, RiskLevel, RiskSummary, VerdictResult};
use crate::store::StoreSnapshot;
use anyhow::Result;
use chrono::Utc;

/// Build a report from the settled store contents.
pub fn build_report(
    snapshot: &StoreSnapshot,
    file_name: &str,
    service_url: &str,
    duration_seconds: f64,
) -> Report {
    let agents = agent_reports(snapshot);
    let summary = RiskSummary::from_agents(&agents);
    let justice = snapshot.get(&adjudicator());

    let metadata = ReportMetadata {
        file_name: file_name.to_string(),
        service_url: service_url.to_string(),
        analysis_date: Utc::now(),
        agents_run: snapshot.values().filter(|s| s.result.is_some()).count(),
        agents_failed: failed_agents(snapshot).len(),
        duration_seconds,
    };

    Report {
        metadata,
        verdict: justice.and_then(|s| s.verdict()).cloned(),
        verdict_error: justice.and_then(|s| s.error.clone()),
        agents,
        summary,
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Veritas Investigation Report\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(&report.metadata));

    // Table of contents
    output.push_str(&generate_table_of_contents(report));

    // Verdict
    output.push_str(&generate_verdict_section(
        report.verdict.as_ref(),
        report.verdict_error.as_deref(),
    ));

    // Summary section
    output.push_str(&generate_summary_section(&report.summary, &report.agents));

    // Findings by agent
    output.push_str(&generate_findings_section(&report.agents));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Document:** `{}`\n", metadata.file_name));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Service:** `{}`\n", metadata.service_url));
    section.push_str(&format!("- **Agents Run:** {}\n", metadata.agents_run));
    if metadata.agents_failed > 0 {
        section.push_str(&format!("- **Agents Failed:** {}\n", metadata.agents_failed));
    }
    section.push_str(&format!(
        "- **Investigation Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn anchor(agent: &AgentReport) -> String {
    agent.title.replace(' ', "-").to_lowercase()
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Verdict](#verdict)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [Findings by Agent](#findings-by-agent)\n");

    for agent in &report.agents {
        toc.push_str(&format!("  - [{}](#{})\n", agent.title, anchor(agent)));
    }

    toc.push('\n');

    toc
}

/// Generate the verdict section.
fn generate_verdict_section(verdict: Option<&VerdictResult>, error: Option<&str>) -> String {
    let mut section = String::new();

    section.push_str("## Verdict\n\n");

    let Some(verdict) = verdict else {
        section.push_str(&format!(
            "*{} has not issued a verdict.*\n\n",
            definition(adjudicator()).title
        ));
        return section;
    };

    section.push_str(&format!(
        "> ⚖️ **{}** | Confidence: {}%\n\n",
        verdict.verdict, verdict.confidence_score
    ));

    if let Some(cause) = error {
        section.push_str(&format!("> ⚠️ **Adjudication failed:** {}\n\n", cause));
    }

    if !verdict.analysis_text.is_empty() {
        section.push_str(&verdict.analysis_text);
        section.push_str("\n\n");
    }

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &RiskSummary, agents: &[AgentReport]) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    // Level breakdown
    section.push_str("### Risk Level Breakdown\n\n");
    section.push_str(&format!(
        "| {} Critical | {} High | {} Medium | {} Low | **Mean Risk** |\n",
        RiskLevel::Critical.emoji(),
        RiskLevel::High.emoji(),
        RiskLevel::Medium.emoji(),
        RiskLevel::Low.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | **{:.1}** |\n\n",
        summary.critical, summary.high, summary.medium, summary.low, summary.mean_risk
    ));

    // Ranking
    let mut ranked = agents.to_vec();
    sort_by_risk(&mut ranked);

    section.push_str("### Risk Ranking\n\n");
    section.push_str("| Agent | Risk | Level |\n");
    section.push_str("|:---|:---:|:---:|\n");

    for agent in &ranked {
        let (score, level) = match (&agent.result, agent.risk_level) {
            (Some(result), Some(level)) if agent.succeeded() => (
                result.risk_score.to_string(),
                format!("{} {}", level.emoji(), level),
            ),
            _ if agent.error.is_some() => ("-".to_string(), "⚠️ Failed".to_string()),
            _ => ("-".to_string(), "Not run".to_string()),
        };
        section.push_str(&format!("| {} | {} | {} |\n", agent.title, score, level));
    }
    section.push('\n');

    section
}

/// Generate the per-agent findings section.
fn generate_findings_section(agents: &[AgentReport]) -> String {
    let mut section = String::new();

    section.push_str("## Findings by Agent\n\n");

    for agent in agents {
        section.push_str(&generate_agent_block(agent));
    }

    section
}

/// Generate a single agent block.
fn generate_agent_block(agent: &AgentReport) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {} {{#{}}}\n\n", agent.title, anchor(agent)));

    match (&agent.result, &agent.error) {
        (_, Some(cause)) => {
            block.push_str(&format!("> ⚠️ **Analysis failed:** {}\n\n", cause));
        }
        (Some(result), None) => {
            let level = result.risk_level();
            block.push_str(&format!(
                "*Agent: {} | Risk: {} ({} {})*\n\n",
                agent.id,
                result.risk_score,
                level.emoji(),
                level
            ));
            if !result.analysis_text.is_empty() {
                block.push_str(&result.analysis_text);
                block.push_str("\n\n");
            }
        }
        (None, None) => {
            block.push_str("*Not run.*\n\n");
        }
    }

    block.push_str("---\n\n");

    block
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by Veritas*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentId, AgentRunState, AnalysisResult};

    fn settled(outcome: impl Into<crate::models::AgentOutcome>, error: Option<&str>) -> AgentRunState {
        AgentRunState {
            is_running: false,
            result: Some(outcome.into()),
            error: error.map(String::from),
            settled_at: Some(Utc::now()),
        }
    }

    fn create_test_snapshot() -> StoreSnapshot {
        let mut snapshot = StoreSnapshot::new();
        snapshot.insert(
            AgentId::Accountant,
            settled(AnalysisResult::new("Revenue recognition looks aggressive.", 62), None),
        );
        snapshot.insert(
            AgentId::Legal,
            settled(AnalysisResult::new("No pending litigation.", 10), None),
        );
        snapshot.insert(
            AgentId::Skeptic,
            settled(AnalysisResult::failed(), Some("connection refused")),
        );
        snapshot.insert(
            AgentId::Bloodhound,
            settled(AnalysisResult::new("Related-party transfers found.", 88), None),
        );
        snapshot.insert(
            AgentId::Justice,
            settled(VerdictResult::new("HIGH RISK", 81, "Weighing all findings."), None),
        );
        snapshot
    }

    fn create_test_report() -> Report {
        build_report(&create_test_snapshot(), "annual.pdf", "http://127.0.0.1:8000", 12.5)
    }

    #[test]
    fn test_build_report() {
        let report = create_test_report();

        assert_eq!(report.metadata.agents_run, 5);
        assert_eq!(report.metadata.agents_failed, 1);
        assert_eq!(report.agents.len(), 4);
        assert_eq!(report.verdict.as_ref().unwrap().verdict, "HIGH RISK");
        assert!(report.verdict_error.is_none());
        assert_eq!(report.summary.analyzed, 3);
        assert_eq!(report.summary.highest_risk_agent, Some(AgentId::Bloodhound));
    }

    #[test]
    fn test_build_report_without_verdict() {
        let mut snapshot = create_test_snapshot();
        snapshot.remove(&AgentId::Justice);

        let report = build_report(&snapshot, "annual.pdf", "http://x", 1.0);
        assert!(report.verdict.is_none());

        let markdown = generate_markdown_report(&report);
        assert!(markdown.contains("The Chief Justice has not issued a verdict."));
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Veritas Investigation Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Verdict"));
        assert!(markdown.contains("**HIGH RISK** | Confidence: 81%"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("## Findings by Agent"));
        assert!(markdown.contains("Related-party transfers found."));
        assert!(markdown.contains("**Analysis failed:** connection refused"));
    }

    #[test]
    fn test_risk_ranking_order() {
        let markdown = generate_markdown_report(&create_test_report());
        let ranking = markdown
            .split("### Risk Ranking")
            .nth(1)
            .and_then(|rest| rest.split("## Findings").next())
            .unwrap();

        let bloodhound = ranking.find("The Bloodhound").unwrap();
        let accountant = ranking.find("The Forensic Accountant").unwrap();
        let skeptic = ranking.find("The Competitive Skeptic").unwrap();
        assert!(bloodhound < accountant);
        assert!(accountant < skeptic);
        assert!(ranking.contains("⚠️ Failed"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let metadata = ReportMetadata {
            file_name: "annual.pdf".to_string(),
            service_url: "http://127.0.0.1:8000".to_string(),
            analysis_date: Utc::now(),
            agents_run: 5,
            agents_failed: 2,
            duration_seconds: 30.0,
        };

        let section = generate_metadata_section(&metadata);

        assert!(section.contains("annual.pdf"));
        assert!(section.contains("http://127.0.0.1:8000"));
        assert!(section.contains("Agents Failed:** 2"));
        assert!(section.contains("30.0s"));
    }

    #[test]
    fn test_degraded_verdict_shows_cause() {
        let section = generate_verdict_section(
            Some(&VerdictResult::connection_failed()),
            Some("request timed out after 120s"),
        );

        assert!(section.contains("**ERROR** | Confidence: 0%"));
        assert!(section.contains("request timed out after 120s"));
        assert!(section.contains("Connection Failed."));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"file_name\""));
        assert!(json.contains("\"verdict\""));
        assert!(json.contains("\"risk_score\": 88"));
    }
}
