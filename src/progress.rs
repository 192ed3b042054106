//! Terminal progress display.
//!
//! Observes the result store and renders one spinner line for the agent in
//! flight plus a summary line whenever an agent settles.

use crate::agent::definition;
use crate::models::{AgentId, AgentRunState, RiskLevel};
use crate::store::StoreSnapshot;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// A change between two store snapshots worth showing.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started(AgentId),
    Settled(AgentId, AgentRunState),
}

/// Events implied by moving from `previous` to `current`.
///
/// An agent settles when its `settled_at` stamp changes, so re-running an
/// agent with an identical result is still reported.
pub fn diff(previous: &StoreSnapshot, current: &StoreSnapshot) -> Vec<ProgressEvent> {
    let mut events = Vec::new();

    for (&agent, state) in current {
        let before = previous.get(&agent);

        if state.is_running && !before.is_some_and(|b| b.is_running) {
            events.push(ProgressEvent::Started(agent));
        }

        if !state.is_running
            && state.settled_at.is_some()
            && state.settled_at != before.and_then(|b| b.settled_at)
        {
            events.push(ProgressEvent::Settled(agent, state.clone()));
        }
    }

    events
}

/// One-line summary of a settled agent.
pub fn describe(agent: AgentId, state: &AgentRunState) -> String {
    let title = definition(agent).title;

    if let Some(ref cause) = state.error {
        return format!("   ⚠️  {}: failed ({})", title, cause);
    }

    if let Some(verdict) = state.verdict() {
        return format!(
            "   ⚖️  {}: {} ({}% confidence)",
            title, verdict.verdict, verdict.confidence_score
        );
    }

    match state.analysis() {
        Some(result) => {
            let level = RiskLevel::from_score(result.risk_score);
            format!(
                "   {} {}: risk {} ({})",
                level.emoji(),
                title,
                result.risk_score,
                level
            )
        }
        None => format!("   {}: no result", title),
    }
}

/// Spinner bound to a store subscription.
pub struct ProgressDisplay {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ProgressDisplay {
    /// Start rendering changes from `states`.
    pub fn spawn(mut states: watch::Receiver<StoreSnapshot>) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message("Waiting for agents...");

        let (shutdown, mut stop) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut previous = states.borrow_and_update().clone();

            loop {
                let done = tokio::select! {
                    changed = states.changed() => changed.is_err(),
                    _ = &mut stop => true,
                };

                let current = states.borrow_and_update().clone();
                for event in diff(&previous, &current) {
                    match event {
                        ProgressEvent::Started(agent) => {
                            pb.set_message(format!("{} is analyzing...", definition(agent).title));
                        }
                        ProgressEvent::Settled(agent, state) => {
                            debug!("{} settled", agent);
                            pb.println(describe(agent, &state));
                        }
                    }
                }
                previous = current;

                if done {
                    break;
                }
            }

            pb.finish_and_clear();
        });

        Self { shutdown, task }
    }

    /// Flush pending changes and remove the spinner.
    pub async fn finish(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            debug!("Progress display task ended abnormally: {}", e);
        }
    }
}
