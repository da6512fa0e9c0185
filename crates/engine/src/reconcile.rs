// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciler: align the registry with observed window state.
//!
//! Window enumeration must cover the orchestrator session plus every
//! `workers-*` session before any agent may be declared gone; a partial
//! enumeration aborts the cycle rather than risk marking live workers
//! completed. The cycle is idempotent and writes nothing when it aborts.

use crate::config::is_supervised_session;
use crate::workspace::extract_phase_from_file;
use fm_adapters::session::{SessionError, WindowManager};
use fm_core::comment::phase_complete;
use fm_core::AgentRecord;
use fm_storage::{ArtifactCheck, Registry, RegistryError};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A session listing failed mid-cycle; no decisions were made
    #[error("window enumeration incomplete, aborting cycle: {0}")]
    Enumeration(#[source] SessionError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// What one reconcile cycle did.
#[derive(Debug, Default, PartialEq)]
pub struct ReconcileReport {
    pub completed: Vec<String>,
    pub abandoned: Vec<String>,
    pub orphan_windows: Vec<String>,
    /// How many live windows were observed across supervised sessions
    pub windows_observed: usize,
}

/// Artifact disposition for an agent whose window vanished.
fn check_artifact(agent: &AgentRecord) -> ArtifactCheck {
    let Some(path) = agent.primary_artifact_path() else {
        return ArtifactCheck::NoArtifact;
    };
    match extract_phase_from_file(&path) {
        Some(phase) if phase_complete(&phase) => ArtifactCheck::Complete,
        // Missing artifact or non-complete phase: the worker left work behind
        _ => ArtifactCheck::Incomplete,
    }
}

/// Run one reconcile cycle.
pub async fn reconcile<W: WindowManager>(
    windows: &W,
    registry: &mut Registry,
) -> Result<ReconcileReport, ReconcileError> {
    let sessions = windows
        .list_sessions()
        .await
        .map_err(ReconcileError::Enumeration)?;

    let mut observed: HashSet<String> = HashSet::new();
    for session in sessions.iter().filter(|s| is_supervised_session(s)) {
        // Any failure aborts: deciding agents are gone from a partial view
        // would complete live workers.
        let listing = windows
            .list_windows(session)
            .await
            .map_err(ReconcileError::Enumeration)?;
        observed.extend(listing.into_iter().map(|w| w.id));
    }

    let outcome = registry.reconcile(&observed, &check_artifact)?;

    for id in &outcome.completed {
        tracing::info!(agent = %id, "window gone, agent completed");
    }
    for id in &outcome.abandoned {
        tracing::warn!(agent = %id, "window gone with incomplete artifact, agent abandoned");
    }
    for window in &outcome.orphan_windows {
        tracing::debug!(window = %window, "window not claimed by any active agent");
    }

    Ok(ReconcileReport {
        completed: outcome.completed,
        abandoned: outcome.abandoned,
        orphan_windows: outcome.orphan_windows,
        windows_observed: observed.len(),
    })
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
