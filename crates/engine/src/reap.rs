// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reaper: staged, non-destructive shutdown of a worker.
//!
//! The cascade is an explicit state machine (Detecting, Interrupting,
//! Exiting, Killing, CleaningWorkspace, ClosingTracker, Committing), each
//! step bounded by the grace interval and falling through to the next on
//! failure. The registry is mutated last: if anything earlier dies partway,
//! the agent stays active and a later reap retries from scratch.

use crate::config::{Config, CLOSE_REASON};
use fm_adapters::session::{SessionError, WindowManager};
use fm_adapters::tracker::TrackerGateway;
use fm_core::{AgentStatus, CompletionRecord};
use fm_storage::{Registry, RegistryError};
use thiserror::Error;

/// Exit command understood by the agent backend.
const EXIT_COMMAND: &str = "/exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapStage {
    Detecting,
    Interrupting,
    Exiting,
    Killing,
    CleaningWorkspace,
    ClosingTracker,
    Committing,
}

impl std::fmt::Display for ReapStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReapStage::Detecting => "detecting",
            ReapStage::Interrupting => "interrupting",
            ReapStage::Exiting => "exiting",
            ReapStage::Killing => "killing",
            ReapStage::CleaningWorkspace => "cleaning-workspace",
            ReapStage::ClosingTracker => "closing-tracker",
            ReapStage::Committing => "committing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ReapError {
    #[error("agent '{0}' not found in registry")]
    AgentNotFound(String),
    /// Steps 1-4 exhausted their timeouts with processes still live
    #[error("processes in window {window_id} survived the shutdown cascade; re-run with --force to reap anyway")]
    Stuck { window_id: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, Copy)]
pub struct ReapOptions {
    /// Accept `failed` status instead of erroring when processes survive
    pub force: bool,
    /// Delete the workspace directory after the window is gone
    pub ephemeral_workspace: bool,
    /// Close linked tracker issues (abandon skips this)
    pub close_issues: bool,
    /// Terminal status when the cascade had to force its way through
    pub target_status: AgentStatus,
}

impl Default for ReapOptions {
    fn default() -> Self {
        Self {
            force: false,
            ephemeral_workspace: false,
            close_issues: true,
            target_status: AgentStatus::Completed,
        }
    }
}

/// What the cascade did, stage by stage.
#[derive(Debug, Default)]
pub struct ReapReport {
    /// (stage, succeeded) in execution order
    pub stages: Vec<(ReapStage, bool)>,
    pub status: AgentStatus,
    pub issues_closed: Vec<String>,
    pub workspace_cleaned: bool,
    pub warnings: Vec<String>,
}

impl ReapReport {
    fn record(&mut self, stage: ReapStage, ok: bool) {
        self.stages.push((stage, ok));
    }
}

/// Run the shutdown cascade for an agent.
pub async fn reap<W, T>(
    cfg: &Config,
    windows: &W,
    tracker: &T,
    registry: &mut Registry,
    agent_id: &str,
    opts: ReapOptions,
) -> Result<ReapReport, ReapError>
where
    W: WindowManager,
    T: TrackerGateway,
{
    let agent = registry
        .find(agent_id)
        .cloned()
        .ok_or_else(|| ReapError::AgentNotFound(agent_id.to_string()))?;
    let window_id = agent.window_id.clone();
    let mut report = ReapReport {
        status: opts.target_status,
        ..Default::default()
    };

    // 1. Detect live processes under the window. A gone window means gone
    // processes.
    let mut alive = windows
        .has_active_processes(&window_id)
        .await
        .unwrap_or(false);
    report.record(ReapStage::Detecting, true);
    let mut forced = false;

    if alive {
        // 2. Graceful interrupt
        let _ = windows.send_key(&window_id, "C-c").await;
        tokio::time::sleep(cfg.reap_grace).await;
        alive = windows
            .has_active_processes(&window_id)
            .await
            .unwrap_or(false);
        report.record(ReapStage::Interrupting, !alive);
    }

    if alive {
        // 3. Backend exit command
        let _ = windows.send_literal(&window_id, EXIT_COMMAND).await;
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        let _ = windows.send_key(&window_id, "Enter").await;
        tokio::time::sleep(cfg.reap_grace).await;
        alive = windows
            .has_active_processes(&window_id)
            .await
            .unwrap_or(false);
        report.record(ReapStage::Exiting, !alive);
    }

    if alive {
        if !opts.force {
            return Err(ReapError::Stuck { window_id });
        }
        forced = true;
        report
            .warnings
            .push(format!("processes in {window_id} killed forcibly"));
    }

    // 4. Forced window kill, keeping the session alive
    let kill_ok = kill_window_preserving_session(windows, &agent.window, &window_id).await;
    report.record(ReapStage::Killing, kill_ok);

    // 5. Ephemeral workspace cleanup, only after the window is gone
    if opts.ephemeral_workspace {
        let workspace = agent.workspace_dir();
        let cleaned = std::fs::remove_dir_all(&workspace).is_ok();
        if !cleaned {
            report
                .warnings
                .push(format!("could not remove workspace {}", workspace.display()));
        }
        report.workspace_cleaned = cleaned;
        report.record(ReapStage::CleaningWorkspace, cleaned);
    }

    // 6. Close linked issues; failures are warnings, never errors
    if opts.close_issues {
        let db = agent.beads_db_path.as_deref();
        let linked: Vec<String> = agent.linked_issues().iter().map(|s| s.to_string()).collect();
        for (index, issue) in linked.iter().enumerate() {
            // Phase verification applies only to the primary; the rest close
            // unconditionally in the success path.
            if index == 0 && !opts.force {
                match tracker.has_phase_complete(issue, db).await {
                    Ok(true) => {}
                    Ok(false) => {
                        report.warnings.push(format!(
                            "issue '{issue}' left open: no 'Phase: Complete' reported"
                        ));
                        continue;
                    }
                    Err(e) => {
                        report
                            .warnings
                            .push(format!("issue '{issue}' left open: {e}"));
                        continue;
                    }
                }
            }
            match tracker.close_issue(issue, CLOSE_REASON, db).await {
                Ok(()) => report.issues_closed.push(issue.clone()),
                Err(e) => report
                    .warnings
                    .push(format!("failed to close issue '{issue}': {e}")),
            }
        }
        report.record(ReapStage::ClosingTracker, report.warnings.is_empty());
    }

    // 7. Registry last: a crash before this point leaves the agent active
    // and a later reap retries from scratch.
    let status = if forced && !kill_ok {
        AgentStatus::Failed
    } else {
        opts.target_status
    };
    let completion = CompletionRecord {
        workspace_cleaned: opts.ephemeral_workspace.then_some(report.workspace_cleaned),
        notes: None,
        issues_closed: (!report.issues_closed.is_empty()).then(|| report.issues_closed.clone()),
    };
    registry.update(&agent.id, |a| {
        a.set_status(status);
        a.completion = Some(completion);
    })?;
    report.status = status;
    report.record(ReapStage::Committing, true);

    tracing::info!(
        agent = %agent.id,
        status = %status,
        issues_closed = report.issues_closed.len(),
        "agent reaped"
    );
    Ok(report)
}

/// Kill a window by id, creating a filler window first when it is the last
/// one in its session. Sessions must outlive individual workers.
async fn kill_window_preserving_session<W: WindowManager>(
    windows: &W,
    window_label: &str,
    window_id: &str,
) -> bool {
    let session = match windows.session_of_window(window_id).await {
        Ok(s) => s,
        // Window already gone: fall back to the recorded label
        Err(_) => window_label.split(':').next().unwrap_or("").to_string(),
    };
    if !session.is_empty() {
        if let Ok(listing) = windows.list_windows(&session).await {
            let window_present = listing.iter().any(|w| w.id == window_id);
            if window_present && listing.len() == 1 {
                let cwd = std::env::temp_dir();
                if let Err(e) = windows.new_window(&session, "main", &cwd, &[]).await {
                    tracing::warn!(session = %session, error = %e, "filler window failed");
                }
            }
            if !window_present {
                // Nothing to kill; the reconciler's signal was right
                return true;
            }
        }
    }
    windows.kill_window(window_id).await.is_ok()
}

#[cfg(test)]
#[path = "reap_tests.rs"]
mod tests;
