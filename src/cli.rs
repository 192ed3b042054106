//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{AgentId, RiskLevel};
use clap::Parser;
use std::path::PathBuf;

/// Veritas - multi-agent document investigation
///
/// Four analysis agents review the document one after another, then the
/// chief justice weighs their findings and issues a verdict.
///
/// Examples:
///   veritas --file annual_report.pdf
///   veritas --file annual_report.pdf --rerun skeptic,justice
///   veritas --file annual_report.pdf --agent legal --format json
///   veritas --file annual_report.pdf --fail-on high
///   veritas --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Document to investigate
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Run only this agent instead of the full investigation
    #[arg(short, long, value_name = "AGENT")]
    pub agent: Option<AgentId>,

    /// Agents to re-run after the full investigation (comma-separated)
    ///
    /// Example: --rerun skeptic,justice
    #[arg(long, value_name = "AGENTS", value_delimiter = ',', conflicts_with = "agent")]
    pub rerun: Vec<AgentId>,

    /// Analysis service base URL
    ///
    /// Overrides `service.base_url` from .veritas.toml.
    #[arg(long, value_name = "URL", env = "VERITAS_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Pause between primary agents in milliseconds
    #[arg(long, value_name = "MS")]
    pub pacing_ms: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .veritas.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Fail if any agent's risk is at or above this level
    ///
    /// Exit code 2 when the threshold is reached. Values: low, medium, high, critical
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .veritas.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Risk level for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl FailOnLevel {
    pub fn risk_level(self) -> RiskLevel {
        match self {
            FailOnLevel::Low => RiskLevel::Low,
            FailOnLevel::Medium => RiskLevel::Medium,
            FailOnLevel::High => RiskLevel::High,
            FailOnLevel::Critical => RiskLevel::Critical,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    ///
    /// A missing --file is not rejected here; the orchestrator reports it.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.service_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Service URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.agent.is_some() && !self.rerun.is_empty() {
            return Err("Cannot use both --agent and --rerun".to_string());
        }

        if let Some(ref path) = self.file {
            if !path.exists() {
                return Err(format!("File does not exist: {}", path.display()));
            }
            if !path.is_file() {
                return Err(format!("Path is not a file: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
