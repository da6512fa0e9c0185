// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registry records.
//!
//! An agent is a single supervised worker: one tmux window, one workspace
//! directory, zero or more linked tracker issues. The registry file owns these
//! records on disk; everything else works on short-lived copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Lifecycle status of an agent.
///
/// Transitions are monotonic: `active` moves to exactly one of the terminal
/// states and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Active,
    Completed,
    Abandoned,
    Failed,
}

impl AgentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AgentStatus::Active)
    }

    /// Whether a transition from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: AgentStatus) -> bool {
        matches!(self, AgentStatus::Active) && next.is_terminal()
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Active => write!(f, "active"),
            AgentStatus::Completed => write!(f, "completed"),
            AgentStatus::Abandoned => write!(f, "abandoned"),
            AgentStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Structured record populated when an agent is reaped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// True iff the reaper removed the workspace directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_cleaned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Tracker issues the reaper closed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_closed: Option<Vec<String>>,
}

/// A single supervised worker as persisted in the registry.
///
/// `workspace` is always a path relative to `project_dir`. `window` is the
/// human-readable `session:name` label; `window_id` is the multiplexer's
/// opaque stable identifier and is never reused for a different agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub task: String,
    pub project: String,
    pub project_dir: PathBuf,
    pub workspace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_artifact: Option<PathBuf>,
    pub window: String,
    pub window_id: String,
    pub status: AgentStatus,
    pub spawned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminated_at: Option<DateTime<Utc>>,
    /// Primary linked tracker issue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beads_id: Option<String>,
    /// Full linkage in declaration order (first element is the primary)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beads_ids: Option<Vec<String>>,
    /// Cross-project tracker database, when the issues live elsewhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beads_db_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<CompletionRecord>,
}

impl AgentRecord {
    /// Create a fresh active record. `spawned_at` and `updated_at` are both
    /// stamped with the current time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        task: impl Into<String>,
        project: impl Into<String>,
        project_dir: impl Into<PathBuf>,
        workspace: impl Into<String>,
        window: impl Into<String>,
        window_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            task: task.into(),
            project: project.into(),
            project_dir: project_dir.into(),
            workspace: workspace.into(),
            skill: None,
            primary_artifact: None,
            window: window.into(),
            window_id: window_id.into(),
            status: AgentStatus::Active,
            spawned_at: now,
            updated_at: now,
            completed_at: None,
            terminated_at: None,
            beads_id: None,
            beads_ids: None,
            beads_db_path: None,
            completion: None,
        }
    }

    /// Primary linked issue, if any. The primary is the only issue whose
    /// phase is consulted for completion gating.
    pub fn primary_issue(&self) -> Option<&str> {
        self.beads_id
            .as_deref()
            .or_else(|| self.beads_ids.as_ref().and_then(|v| v.first()).map(String::as_str))
    }

    /// All linked issues in declaration order, primary first.
    pub fn linked_issues(&self) -> Vec<&str> {
        if let Some(ids) = &self.beads_ids {
            ids.iter().map(String::as_str).collect()
        } else {
            self.beads_id.as_deref().into_iter().collect()
        }
    }

    /// Absolute workspace directory.
    pub fn workspace_dir(&self) -> PathBuf {
        self.project_dir.join(&self.workspace)
    }

    /// Resolve the primary artifact against the project directory when the
    /// recorded path is relative.
    pub fn primary_artifact_path(&self) -> Option<PathBuf> {
        self.primary_artifact.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                self.project_dir.join(p)
            }
        })
    }

    /// Bump `updated_at` without changing anything else.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Transition to a terminal status, bumping `updated_at` and stamping
    /// `completed_at` or `terminated_at` as appropriate. Returns false (and
    /// changes nothing) for a disallowed transition.
    pub fn set_status(&mut self, status: AgentStatus) -> bool {
        if !self.status.can_transition_to(status) {
            return false;
        }
        let now = Utc::now();
        self.status = status;
        self.updated_at = now;
        match status {
            AgentStatus::Completed => self.completed_at = Some(now),
            AgentStatus::Abandoned | AgentStatus::Failed => self.terminated_at = Some(now),
            AgentStatus::Active => {}
        }
        true
    }

    /// Whether the workspace path stays under the project directory.
    ///
    /// Absolute workspace paths and `..` traversal are rejected; symlinks are
    /// deliberately not followed here.
    pub fn workspace_is_contained(&self) -> bool {
        let ws = Path::new(&self.workspace);
        !ws.is_absolute()
            && !ws
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
