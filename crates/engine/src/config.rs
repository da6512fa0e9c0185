// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration: paths, session naming, env markers, timeouts.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// The orchestrator's own pinned session. Worker sessions are per-project.
pub const ORCHESTRATOR_SESSION: &str = "orchestrator";

/// Env var that marks a process as running inside a worker window.
pub const WORKER_CONTEXT_ENV: &str = "FM_CONTEXT";
pub const WORKER_CONTEXT_VALUE: &str = "worker";

/// Env vars exposing the workspace and project to the agent.
pub const WORKSPACE_ENV: &str = "FM_WORKSPACE";
pub const PROJECT_DIR_ENV: &str = "FM_PROJECT_DIR";

/// File the supervisor materializes into each workspace.
pub const SPAWN_CONTEXT_FILE: &str = "SPAWN_CONTEXT.md";

/// Canonical reason used when the reaper closes linked issues.
pub const CLOSE_REASON: &str = "Resolved via fm complete";

/// Session name for a project's worker pool.
pub fn workers_session_name(project: &str) -> String {
    format!("workers-{project}")
}

/// Whether a session belongs to the orchestrator's purview: its own pinned
/// session or any per-project worker pool.
pub fn is_supervised_session(session: &str) -> bool {
    session == ORCHESTRATOR_SESSION || session.starts_with("workers-")
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Global orchestrator home, conventionally `~/.orch`
    pub home: PathBuf,
    /// Where session-manager configs are materialized, `~/.tmuxinator`
    pub session_config_dir: PathBuf,
    /// Agent backend command launched in each worker window
    pub agent_command: String,
    /// Prefix workspace names with the spawn date
    pub date_prefix: bool,
    /// Upper bound for workspace slugs
    pub max_slug_len: usize,
    /// Readiness polling: attempts and pause between captures
    pub ready_attempts: u32,
    pub ready_poll: Duration,
    /// Grace interval between reap cascade steps
    pub reap_grace: Duration,
    /// Daemon bounds
    pub max_concurrent_agents: usize,
    pub required_label: String,
    pub poll_interval: Duration,
}

impl Config {
    /// Configuration rooted at an explicit home directory.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let session_config_dir = home
            .parent()
            .map(|p| p.join(".tmuxinator"))
            .unwrap_or_else(|| PathBuf::from(".tmuxinator"));
        Self {
            home,
            session_config_dir,
            agent_command: "claude".to_string(),
            date_prefix: true,
            max_slug_len: fm_core::DEFAULT_SLUG_LEN,
            ready_attempts: 20,
            ready_poll: Duration::from_millis(500),
            reap_grace: Duration::from_secs(5),
            max_concurrent_agents: 3,
            required_label: "triage:ready".to_string(),
            poll_interval: Duration::from_secs(60),
        }
    }

    /// Configuration rooted at `~/.orch`.
    pub fn load() -> Self {
        let home = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".orch");
        Self::with_home(home)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.home.join("agent-registry.json")
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.home.join("errors.jsonl")
    }

    pub fn focus_path(&self) -> PathBuf {
        self.home.join("focus.json")
    }

    pub fn skills_dir(&self) -> PathBuf {
        self.home.join("skills")
    }

    /// Project-relative workspace path for an agent.
    pub fn workspace_rel(&self, name: &str) -> String {
        format!(".orch/workspace/{name}")
    }

    /// Absolute workspace directory for an agent.
    pub fn workspace_dir(&self, project_dir: &Path, name: &str) -> PathBuf {
        project_dir.join(".orch").join("workspace").join(name)
    }

    /// Whether the calling environment already carries the worker marker.
    /// Workers must not spawn workers.
    pub fn caller_is_worker(&self) -> bool {
        std::env::var(WORKER_CONTEXT_ENV)
            .map(|v| v == WORKER_CONTEXT_VALUE)
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
