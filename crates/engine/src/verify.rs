// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Verifier: decide whether a worker may be marked complete.
//!
//! Seven gates, evaluated in order, first failure wins. The verifier never
//! mutates state; the reaper acts on its verdict. Infrastructure failures
//! (tracker unreachable) are errors; semantic failures land in the report.

use crate::config::Config;
use crate::skills::load_skill;
use crate::workspace::{extract_phase_from_file, parse_workspace_file, WorkspaceDoc};
use fm_adapters::tracker::{TrackerError, TrackerGateway};
use fm_adapters::vcs::{filter_excluded, Vcs};
use fm_core::comment::phase_complete;
use fm_core::{AgentRecord, AgentStatus, Deliverable, DeliverableKind};
use fm_storage::Registry;
use std::fmt;
use std::path::{Path, PathBuf};

/// Files the clean-tree gate ignores; the tracker database syncs itself
/// out-of-band.
const CLEAN_TREE_EXCLUSIONS: &[&str] = &[".beads/"];

/// A verification gate failure, in gate order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyFailure {
    AgentNotFound {
        id: String,
    },
    PhaseNotComplete {
        issue: String,
        current: Option<String>,
    },
    WorkspaceMissing {
        path: PathBuf,
    },
    InvestigationIncomplete {
        path: PathBuf,
        phase: Option<String>,
    },
    MissingDeliverable {
        kind: DeliverableKind,
    },
    PendingActions {
        items: Vec<String>,
    },
    TestsFailing {
        summary: String,
    },
    WorkNotCommitted {
        details: String,
    },
}

impl fmt::Display for VerifyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyFailure::AgentNotFound { id } => {
                write!(f, "agent '{id}' not found in registry (or not active)")
            }
            VerifyFailure::PhaseNotComplete { issue, current } => write!(
                f,
                "issue '{issue}' has not reported 'Phase: Complete' (current phase: {})",
                current.as_deref().unwrap_or("none")
            ),
            VerifyFailure::WorkspaceMissing { path } => {
                write!(f, "workspace file not found: {}", path.display())
            }
            VerifyFailure::InvestigationIncomplete { path, phase } => write!(
                f,
                "investigation artifact {} is not complete (phase: {})",
                path.display(),
                phase.as_deref().unwrap_or("none")
            ),
            VerifyFailure::MissingDeliverable { kind } => {
                write!(f, "missing deliverable: {kind}")
            }
            VerifyFailure::PendingActions { items } => {
                write!(f, "next-actions incomplete: {}", items.join("; "))
            }
            VerifyFailure::TestsFailing { summary } => write!(f, "tests failing: {summary}"),
            VerifyFailure::WorkNotCommitted { details } => {
                write!(f, "work not committed: {details}")
            }
        }
    }
}

/// Operator switches for individual gates.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions {
    /// Force flag: trust commits over reported phase
    pub skip_phase_check: bool,
    /// Pre-existing failures block completion otherwise
    pub skip_test_check: bool,
    /// Local-only repositories cannot push
    pub skip_push_check: bool,
}

/// The verifier's structured verdict.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerifyReport {
    pub passed: bool,
    pub errors: Vec<VerifyFailure>,
    pub warnings: Vec<String>,
}

impl VerifyReport {
    fn fail(failure: VerifyFailure, warnings: Vec<String>) -> Self {
        Self {
            passed: false,
            errors: vec![failure],
            warnings,
        }
    }
}

/// Run the verification gates for an agent.
pub async fn verify<T, V>(
    cfg: &Config,
    tracker: &T,
    vcs: &V,
    registry: &Registry,
    agent_id: &str,
    opts: VerifyOptions,
) -> Result<VerifyReport, TrackerError>
where
    T: TrackerGateway,
    V: Vcs,
{
    let mut warnings = Vec::new();

    // Gate 1: agent exists and is active
    let Some(agent) = registry.find(agent_id).filter(|a| a.status == AgentStatus::Active)
    else {
        return Ok(VerifyReport::fail(
            VerifyFailure::AgentNotFound {
                id: agent_id.to_string(),
            },
            warnings,
        ));
    };

    // Gate 2: primary issue phase
    if !opts.skip_phase_check {
        if let Some(primary) = agent.primary_issue() {
            let phase = tracker
                .latest_phase(primary, agent.beads_db_path.as_deref())
                .await?;
            if !phase.as_deref().is_some_and(phase_complete) {
                return Ok(VerifyReport::fail(
                    VerifyFailure::PhaseNotComplete {
                        issue: primary.to_string(),
                        current: phase,
                    },
                    warnings,
                ));
            }
        }
    }

    let skill = agent
        .skill
        .as_deref()
        .and_then(|name| match load_skill(&cfg.skills_dir(), name) {
            Ok(skill) => Some(skill),
            Err(e) => {
                warnings.push(format!("skill metadata unavailable: {e}"));
                None
            }
        });

    // Gate 3: workspace presence / investigation artifact. The workspace
    // path must stay under the project directory; paths are joined verbatim,
    // never canonicalized, so a symlinked escape is not followed.
    let workspace_file = agent.workspace_dir().join("WORKSPACE.md");
    if !agent.workspace_is_contained() {
        return Ok(VerifyReport::fail(
            VerifyFailure::WorkspaceMissing {
                path: workspace_file,
            },
            warnings,
        ));
    }
    let mut doc: Option<WorkspaceDoc> = None;
    if let Some(artifact) = agent.primary_artifact_path() {
        if !artifact.exists() {
            return Ok(VerifyReport::fail(
                VerifyFailure::InvestigationIncomplete {
                    path: artifact,
                    phase: None,
                },
                warnings,
            ));
        }
        let phase = extract_phase_from_file(&artifact);
        if !phase.as_deref().is_some_and(phase_complete) {
            return Ok(VerifyReport::fail(
                VerifyFailure::InvestigationIncomplete {
                    path: artifact,
                    phase,
                },
                warnings,
            ));
        }
    } else if skill
        .as_ref()
        .is_some_and(|s| s.manifest.declares(DeliverableKind::Workspace))
    {
        match parse_workspace_file(&workspace_file) {
            Some(parsed) => doc = Some(parsed),
            None => {
                return Ok(VerifyReport::fail(
                    VerifyFailure::WorkspaceMissing {
                        path: workspace_file,
                    },
                    warnings,
                ));
            }
        }
    } else {
        doc = parse_workspace_file(&workspace_file);
    }

    // Gate 4: required deliverables
    if let Some(skill) = &skill {
        for deliverable in skill.manifest.required_deliverables() {
            if !deliverable_exists(vcs, agent, deliverable).await {
                return Ok(VerifyReport::fail(
                    VerifyFailure::MissingDeliverable {
                        kind: deliverable.kind,
                    },
                    warnings,
                ));
            }
        }
    }

    // Gates 5 and 6 read the workspace document when one exists
    if let Some(doc) = &doc {
        let pending = doc.pending_actions();
        if !pending.is_empty() {
            return Ok(VerifyReport::fail(
                VerifyFailure::PendingActions {
                    items: pending.iter().map(|i| i.text.clone()).collect(),
                },
                warnings,
            ));
        }
        if !opts.skip_test_check {
            if let Some(results) = &doc.test_results {
                if !results.passed {
                    return Ok(VerifyReport::fail(
                        VerifyFailure::TestsFailing {
                            summary: results.summary.clone(),
                        },
                        warnings,
                    ));
                }
            }
        }
    }

    // Gate 7: clean, pushed working tree
    if vcs.is_repo(&agent.project_dir).await {
        if let Some(details) = committed_check(vcs, agent, opts.skip_push_check).await {
            return Ok(VerifyReport::fail(
                VerifyFailure::WorkNotCommitted { details },
                warnings,
            ));
        }
        match vcs.has_commit_mentioning(&agent.project_dir, &agent.id).await {
            Ok(true) => {}
            Ok(false) => warnings.push(format!(
                "no commits reference workspace '{}'; agent may not have committed work",
                agent.id
            )),
            Err(e) => warnings.push(format!("commit check failed: {e}")),
        }
    } else {
        warnings.push("project is not a git repository; skipping commit checks".to_string());
    }

    Ok(VerifyReport {
        passed: true,
        errors: Vec::new(),
        warnings,
    })
}

/// Uncommitted or unpushed work, as a printable detail string.
async fn committed_check<V: Vcs>(
    vcs: &V,
    agent: &AgentRecord,
    skip_push_check: bool,
) -> Option<String> {
    let dir = &agent.project_dir;
    match vcs.status_porcelain(dir).await {
        Ok(lines) => {
            let remaining = filter_excluded(&lines, CLEAN_TREE_EXCLUSIONS);
            if !remaining.is_empty() {
                return Some(format!(
                    "uncommitted changes:\n  {}",
                    remaining.join("\n  ")
                ));
            }
        }
        Err(e) => return Some(format!("git status failed: {e}")),
    }
    if !skip_push_check {
        let branch = match vcs.current_branch(dir).await {
            Ok(b) => b,
            Err(e) => return Some(format!("git branch check failed: {e}")),
        };
        match vcs.unpushed_count(dir, &branch).await {
            Ok(Some(n)) if n > 0 => {
                return Some(format!("{n} unpushed commit(s) on {branch}"));
            }
            // No upstream is fine: local-only repository
            _ => {}
        }
    }
    None
}

async fn deliverable_exists<V: Vcs>(
    vcs: &V,
    agent: &AgentRecord,
    deliverable: &Deliverable,
) -> bool {
    let name = &agent.id;
    match deliverable.kind {
        DeliverableKind::Commits => vcs
            .has_commit_mentioning(&agent.project_dir, name)
            .await
            .unwrap_or(false),
        DeliverableKind::Workspace => agent.workspace_dir().join("WORKSPACE.md").exists(),
        DeliverableKind::Investigation => {
            if let Some(artifact) = agent.primary_artifact_path() {
                return artifact.exists();
            }
            if !deliverable.path.is_empty() {
                return agent
                    .project_dir
                    .join(deliverable.resolve(name, name))
                    .exists();
            }
            find_markdown(
                &agent.project_dir.join(".orch").join("investigations"),
                name,
            )
        }
        DeliverableKind::Decision | DeliverableKind::Knowledge => {
            let path = if deliverable.path.is_empty() {
                let subdir = match deliverable.kind {
                    DeliverableKind::Decision => "decisions",
                    _ => "knowledge",
                };
                agent
                    .project_dir
                    .join(".orch")
                    .join(subdir)
                    .join(format!("{name}.md"))
            } else {
                agent.project_dir.join(deliverable.resolve(name, name))
            };
            path.exists()
        }
    }
}

/// Recursive search for `<name>.md` under a directory (investigations are
/// filed into per-kind subdirectories).
fn find_markdown(root: &Path, name: &str) -> bool {
    let target = format!("{name}.md");
    let Ok(entries) = std::fs::read_dir(root) else {
        return false;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            if find_markdown(&path, name) {
                return true;
            }
        } else if entry.file_name().to_string_lossy() == target {
            return true;
        }
    }
    false
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
