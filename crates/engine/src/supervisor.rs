// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Window supervisor: launch an agent inside a fresh window of a per-project
//! session and confirm readiness.
//!
//! Ordering is load-bearing: window creation precedes the SpawnContext write,
//! which precedes process launch, which precedes the caller's registry append.
//! On failure, later steps are not attempted and earlier side effects are
//! left for the reconciler to surface (a window with no registry entry is an
//! orphan, not corruption).

use crate::config::{
    workers_session_name, Config, ORCHESTRATOR_SESSION, PROJECT_DIR_ENV, SPAWN_CONTEXT_FILE,
    WORKER_CONTEXT_ENV, WORKER_CONTEXT_VALUE, WORKSPACE_ENV,
};
use crate::planner::SpawnPlan;
use fm_adapters::session::{SessionError, WindowManager};
use thiserror::Error;

/// Signals that the agent backend's interactive banner is up.
const READY_MARKERS: &[&str] = &["? for shortcuts", "Welcome to Claude", "│ >"];

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("failed to write spawn context: {0}")]
    ContextWrite(std::io::Error),
    #[error("agent in window {window_id} not ready after {attempts} capture attempts")]
    NotReady { window_id: String, attempts: u32 },
}

/// A successfully launched worker window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedWindow {
    pub session: String,
    /// Human-readable `session:name` label
    pub window: String,
    /// Opaque stable id from the multiplexer
    pub window_id: String,
}

/// Launch a planned agent. See module docs for the ordering contract.
pub async fn launch<W: WindowManager>(
    cfg: &Config,
    windows: &W,
    plan: &SpawnPlan,
) -> Result<LaunchedWindow, SpawnError> {
    let session = workers_session_name(&plan.project);
    ensure_session(cfg, windows, &session, plan).await?;

    // 1. Window, named after the workspace
    let workspace_dir = plan.project_dir.join(&plan.workspace_rel);
    std::fs::create_dir_all(&workspace_dir).map_err(SpawnError::ContextWrite)?;
    let env = worker_env(plan, &workspace_dir);
    let window_id = windows
        .new_window(&session, &plan.workspace_name, &workspace_dir, &env)
        .await?;

    // 2. SpawnContext, write-once, before the agent can possibly read it
    std::fs::write(workspace_dir.join(SPAWN_CONTEXT_FILE), &plan.context)
        .map_err(SpawnError::ContextWrite)?;

    // 3. Agent process
    windows
        .send_literal(&window_id, &cfg.agent_command)
        .await?;
    windows.send_key(&window_id, "Enter").await?;

    // 4. Readiness
    wait_ready(cfg, windows, &window_id).await?;

    // 5. Client-switch hint; strictly best-effort
    follow_hint(windows, &session).await;

    tracing::info!(
        session = %session,
        window_id = %window_id,
        workspace = %plan.workspace_name,
        "agent launched"
    );

    Ok(LaunchedWindow {
        window: format!("{session}:{}", plan.workspace_name),
        session,
        window_id,
    })
}

/// Idempotently ensure the per-project workers session exists.
///
/// A tmuxinator-style config is materialized once for human reuse (existing
/// configs are never overwritten); the session itself is created directly.
async fn ensure_session<W: WindowManager>(
    cfg: &Config,
    windows: &W,
    session: &str,
    plan: &SpawnPlan,
) -> Result<(), SpawnError> {
    materialize_session_config(cfg, session, plan);
    if !windows.session_exists(session).await? {
        windows.new_session(session, &plan.project_dir).await?;
    }
    Ok(())
}

/// Write `~/.tmuxinator/<session>.yml` if absent. Failures are logged and
/// ignored; the config is a convenience, not a dependency.
fn materialize_session_config(cfg: &Config, session: &str, plan: &SpawnPlan) {
    let path = cfg.session_config_dir.join(format!("{session}.yml"));
    if path.exists() {
        return;
    }
    let content = format!(
        "name: {session}\nroot: {root}\nstartup_window: servers\nwindows:\n  - servers:\n",
        root = plan.project_dir.display()
    );
    if let Err(e) = std::fs::create_dir_all(&cfg.session_config_dir)
        .and_then(|_| std::fs::write(&path, content))
    {
        tracing::warn!(path = %path.display(), error = %e, "could not write session config");
    }
}

fn worker_env(plan: &SpawnPlan, workspace_dir: &std::path::Path) -> Vec<(String, String)> {
    vec![
        (
            WORKER_CONTEXT_ENV.to_string(),
            WORKER_CONTEXT_VALUE.to_string(),
        ),
        (
            WORKSPACE_ENV.to_string(),
            workspace_dir.to_string_lossy().to_string(),
        ),
        (
            PROJECT_DIR_ENV.to_string(),
            plan.project_dir.to_string_lossy().to_string(),
        ),
    ]
}

/// Poll window output until the backend's ready banner shows up.
async fn wait_ready<W: WindowManager>(
    cfg: &Config,
    windows: &W,
    window_id: &str,
) -> Result<(), SpawnError> {
    for attempt in 0..cfg.ready_attempts {
        if attempt > 0 {
            tokio::time::sleep(cfg.ready_poll).await;
        }
        // Capture may transiently fail while the window boots
        let Ok(output) = windows.capture_output(window_id, 50).await else {
            continue;
        };
        if READY_MARKERS.iter().any(|m| output.contains(m)) {
            return Ok(());
        }
    }
    Err(SpawnError::NotReady {
        window_id: window_id.to_string(),
        attempts: cfg.ready_attempts,
    })
}

/// Nudge any client attached to the orchestrator session toward the worker
/// pool so a watching human follows the new window. Never fatal.
async fn follow_hint<W: WindowManager>(windows: &W, session: &str) {
    let clients = windows
        .list_clients(ORCHESTRATOR_SESSION)
        .await
        .unwrap_or_default();
    for client in clients {
        if let Err(e) = windows.switch_client(&client, session).await {
            tracing::debug!(client = %client, error = %e, "client switch hint failed");
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
