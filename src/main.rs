//! Veritas - multi-agent document investigation
//!
//! A CLI tool that uploads a document to a panel of remote analysis agents,
//! runs them one after another, and asks an adjudicating agent for a final
//! verdict over their findings.
//!
//! Exit codes:
//!   0 - Success (no agent above threshold, or no --fail-on set)
//!   1 - Runtime error (missing file, bad config, run already in flight, etc.)
//!   2 - An agent's risk is at or above the --fail-on threshold

mod agent;
mod analysis;
mod cli;
mod client;
mod config;
mod error;
mod models;
mod orchestrator;
mod progress;
mod report;
mod store;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use client::AnalysisClient;
use config::{Config, CONFIG_FILE};
use models::Artifact;
use orchestrator::{InvestigationOrchestrator, InvestigationPhase};
use progress::ProgressDisplay;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args)?;

    info!("Veritas v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_investigation(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Investigation failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .veritas.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the service URL, timeout, and pacing.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the investigation workflow. Returns exit code (0 or 2).
async fn run_investigation(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    // Read the document up front; a missing one is reported by the orchestrator
    let artifact = match args.file {
        Some(ref path) => Some(Artifact::from_path(path).await?),
        None => None,
    };

    println!("🔍 Veritas investigation");
    if let Some(ref artifact) = artifact {
        println!(
            "   Document: {} ({} bytes)",
            artifact.file_name(),
            artifact.bytes().len()
        );
    }
    println!("   Service: {}", config.service.base_url);
    println!("   Timeout: {}s", config.service.timeout_seconds);
    if args.agent.is_none() {
        println!("   Pacing: {}ms", config.investigation.pacing_ms);
    }

    let client = AnalysisClient::http(&config.service)?;
    let orchestrator = InvestigationOrchestrator::new(client, config.investigation.pacing());

    let phase_log = spawn_phase_logger(&orchestrator);
    let progress = (!args.quiet).then(|| ProgressDisplay::spawn(orchestrator.store().subscribe()));

    println!();
    let outcome = match args.agent {
        Some(agent) => {
            info!("Running single agent: {}", agent);
            orchestrator
                .run_single_agent(agent, artifact.as_ref())
                .await
                .map(|_| ())
                .map_err(anyhow::Error::from)
        }
        None => run_full(&orchestrator, artifact.as_ref(), &args).await,
    };

    if let Some(progress) = progress {
        progress.finish().await;
    }
    phase_log.abort();
    outcome?;
    debug!("Final phase: {}", orchestrator.phase());

    // Build the report
    println!("\n📝 Generating report...");

    let duration = start_time.elapsed().as_secs_f64();
    let snapshot = orchestrator.store().snapshot();
    let file_name = artifact
        .as_ref()
        .map(|a| a.file_name().to_string())
        .unwrap_or_default();
    let report = report::build_report(&snapshot, &file_name, &config.service.base_url, duration);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 Investigation Summary:");
    if let Some(ref verdict) = report.verdict {
        println!(
            "   Verdict: {} ({}% confidence)",
            verdict.verdict, verdict.confidence_score
        );
        if verdict.is_error() {
            println!("   ⚠️  The adjudicator did not return a usable verdict");
        }
    }
    for line in analysis::generate_summary_text(&report.summary).lines() {
        println!("   {}", line);
    }
    let failed = analysis::failed_agents(&snapshot);
    if !failed.is_empty() {
        let names: Vec<_> = failed.iter().map(|a| a.as_str()).collect();
        println!("   Degraded agents: {}", names.join(", "));
    }
    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Investigation complete! Report saved to: {}",
        output_path.display()
    );

    // Check --fail-on threshold
    if let Some(fail_level) = args.fail_on {
        let above = analysis::agents_at_or_above(&report.agents, fail_level.risk_level());

        if !above.is_empty() {
            eprintln!(
                "\n⛔ {} agent(s) at or above {:?} risk. Failing (exit code 2).",
                above.len(),
                fail_level
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Full investigation followed by any requested re-runs.
async fn run_full(
    orchestrator: &InvestigationOrchestrator,
    artifact: Option<&Artifact>,
    args: &Args,
) -> Result<()> {
    let summary = orchestrator.run_full_investigation(artifact).await?;
    if !summary.failed_agents.is_empty() {
        warn!(
            "{} agent(s) degraded: {:?}",
            summary.failed_agents.len(),
            summary.failed_agents
        );
    }

    for &agent in &args.rerun {
        info!("Re-running {}", agent);
        orchestrator.run_single_agent(agent, artifact).await?;
    }

    Ok(())
}

/// Log phase transitions of full investigations at debug level.
fn spawn_phase_logger(orchestrator: &InvestigationOrchestrator) -> tokio::task::JoinHandle<()> {
    let mut phases = orchestrator.subscribe_phase();
    tokio::spawn(async move {
        while phases.changed().await.is_ok() {
            let phase: InvestigationPhase = *phases.borrow_and_update();
            debug!("Investigation phase: {}", phase);
            if phase.is_terminal() {
                break;
            }
        }
    })
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
