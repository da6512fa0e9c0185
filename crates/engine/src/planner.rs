// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn planner: turn a spawn request into an immutable plan.
//!
//! Planning is always pre-launch and side-effect free: no registry, tracker,
//! or filesystem mutation happens here. A rejected plan leaves the world
//! exactly as it was.

use crate::config::Config;
use crate::context::{build_spawn_context, ContextSpec};
use crate::quality::{check_context, QualityReport};
use crate::skill_filter::filter_skill_phases;
use crate::skills::{load_skill, Skill, SkillError};
use fm_adapters::tracker::{TrackerError, TrackerGateway};
use fm_adapters::vcs::Vcs;
use fm_core::{slug, Deliverable, Issue};
use std::path::PathBuf;
use thiserror::Error;

pub use crate::skill_filter::ImplMode;

/// Errors that reject a plan before anything is launched.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("issue '{id}' is closed; pass --allow-closed to spawn anyway")]
    ClosedIssue { id: String },
    #[error("issue '{id}' not found in tracker")]
    IssueNotFound { id: String },
    #[error("refusing to spawn: FM_CONTEXT marks this process as a worker, and workers may not spawn workers")]
    WorkerContext,
    #[error("git state check failed: {0}")]
    GitState(String),
    #[error(transparent)]
    Skill(#[from] SkillError),
    #[error(transparent)]
    Tracker(TrackerError),
}

/// A spawn request as it arrives from the CLI or daemon.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub task: String,
    pub project: String,
    pub project_dir: PathBuf,
    pub skill: Option<String>,
    /// Tracker issues in command order; the first is the primary
    pub issues: Vec<String>,
    pub phases: Option<Vec<String>>,
    pub mode: ImplMode,
    pub validation: Option<String>,
    pub investigation_type: Option<String>,
    /// Human-attended mode; recorded in the plan, not enforced here
    pub interactive: bool,
    /// Operator override for spawning against a closed issue
    pub allow_closed: bool,
    /// Skip git preconditions (non-repo scratch projects)
    pub skip_git_check: bool,
    pub db_path: Option<PathBuf>,
}

impl SpawnRequest {
    pub fn new(
        task: impl Into<String>,
        project: impl Into<String>,
        project_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            task: task.into(),
            project: project.into(),
            project_dir: project_dir.into(),
            skill: None,
            issues: Vec::new(),
            phases: None,
            mode: ImplMode::default(),
            validation: None,
            investigation_type: None,
            interactive: false,
            allow_closed: false,
            skip_git_check: false,
            db_path: None,
        }
    }
}

/// The immutable output of planning.
#[derive(Debug, Clone)]
pub struct SpawnPlan {
    pub workspace_name: String,
    pub project: String,
    pub project_dir: PathBuf,
    /// Relative to `project_dir`
    pub workspace_rel: String,
    pub task: String,
    pub deliverables: Vec<Deliverable>,
    /// Skill with phase-filtered content
    pub skill: Option<Skill>,
    /// The composed SpawnContext text, write-once at launch
    pub context: String,
    /// Linked issues, primary first
    pub issues: Vec<String>,
    pub db_path: Option<PathBuf>,
    pub interactive: bool,
    pub quality: QualityReport,
}

impl SpawnPlan {
    pub fn primary_issue(&self) -> Option<&str> {
        self.issues.first().map(String::as_str)
    }

    /// Whether the workspace should be deleted at reap time.
    pub fn ephemeral_workspace(&self) -> bool {
        self.skill
            .as_ref()
            .is_some_and(|s| s.manifest.ephemeral_workspace)
    }
}

/// Build a spawn plan. Pre-launch failures only; no side effects.
pub async fn plan<T, V>(
    cfg: &Config,
    tracker: &T,
    vcs: &V,
    req: &SpawnRequest,
) -> Result<SpawnPlan, PlanError>
where
    T: TrackerGateway,
    V: Vcs,
{
    // Workers must not spawn workers
    if cfg.caller_is_worker() {
        return Err(PlanError::WorkerContext);
    }

    if !req.skip_git_check {
        git_preflight(vcs, req).await?;
    }

    let issues = resolve_issues(tracker, req).await?;

    let workspace_name = derive_workspace_name(cfg, req, issues.first());

    let skill = match &req.skill {
        Some(name) => {
            let mut skill = load_skill(&cfg.skills_dir(), name)?;
            if skill.manifest.feature_style {
                skill.content =
                    filter_skill_phases(&skill.content, req.phases.as_deref(), req.mode);
            }
            Some(skill)
        }
        None => None,
    };

    let deliverables: Vec<Deliverable> = skill
        .as_ref()
        .map(|s| s.manifest.deliverables.clone())
        .unwrap_or_default();

    let task = effective_task(req, issues.first());
    let issue_ids: Vec<String> = issues.iter().map(|i| i.id.clone()).collect();
    let workspace_rel = cfg.workspace_rel(&workspace_name);

    let context = build_spawn_context(&ContextSpec {
        task: &task,
        project_dir: &req.project_dir,
        workspace_name: &workspace_name,
        workspace_rel: &workspace_rel,
        deliverables: &deliverables,
        issues: &issue_ids,
        skill: skill.as_ref(),
        phases: req.phases.as_deref(),
        mode: req.mode,
        validation: req.validation.as_deref(),
        investigation_type: req.investigation_type.as_deref(),
    });
    let quality = check_context(&context);
    for warning in &quality.warnings {
        tracing::warn!(
            severity = %warning.severity,
            workspace = %workspace_name,
            "{}",
            warning.message
        );
    }

    Ok(SpawnPlan {
        workspace_name,
        project: req.project.clone(),
        project_dir: req.project_dir.clone(),
        workspace_rel,
        task,
        deliverables,
        skill,
        context,
        issues: issue_ids,
        db_path: req.db_path.clone(),
        interactive: req.interactive,
        quality,
    })
}

/// Main-branch-only workflow: on main/master, clean tree, best-effort pull.
async fn git_preflight<V: Vcs>(vcs: &V, req: &SpawnRequest) -> Result<(), PlanError> {
    let dir = &req.project_dir;
    if !vcs.is_repo(dir).await {
        return Err(PlanError::GitState(format!(
            "{} is not a git repository",
            dir.display()
        )));
    }
    let branch = vcs
        .current_branch(dir)
        .await
        .map_err(|e| PlanError::GitState(e.to_string()))?;
    if branch != "main" && branch != "master" {
        return Err(PlanError::GitState(format!(
            "not on main branch (currently on '{branch}'); switch to main or master before spawning"
        )));
    }
    let dirty = vcs
        .status_porcelain(dir)
        .await
        .map_err(|e| PlanError::GitState(e.to_string()))?;
    if !dirty.is_empty() {
        return Err(PlanError::GitState(format!(
            "uncommitted changes detected; commit or stash before spawning:\n  {}",
            dirty.join("\n  ")
        )));
    }
    vcs.pull(dir, &branch)
        .await
        .map_err(|e| PlanError::GitState(e.to_string()))
}

/// Query every requested issue; reject the whole plan on the first closed or
/// missing one.
async fn resolve_issues<T: TrackerGateway>(
    tracker: &T,
    req: &SpawnRequest,
) -> Result<Vec<Issue>, PlanError> {
    let mut issues = Vec::with_capacity(req.issues.len());
    for id in &req.issues {
        let issue = tracker
            .get_issue(id, req.db_path.as_deref())
            .await
            .map_err(|e| match e {
                TrackerError::IssueNotFound(id) => PlanError::IssueNotFound { id },
                other => PlanError::Tracker(other),
            })?;
        if issue.status.is_closed() && !req.allow_closed {
            return Err(PlanError::ClosedIssue { id: id.clone() });
        }
        issues.push(issue);
    }
    Ok(issues)
}

fn effective_task(req: &SpawnRequest, primary: Option<&Issue>) -> String {
    if !req.task.trim().is_empty() {
        return req.task.clone();
    }
    primary.map(|i| i.title.clone()).unwrap_or_default()
}

fn derive_workspace_name(cfg: &Config, req: &SpawnRequest, primary: Option<&Issue>) -> String {
    let now = chrono::Utc::now();
    let mut base = slug::workspace_slug(&req.task, cfg.max_slug_len);
    if base.is_empty() {
        if let Some(issue) = primary {
            base = slug::workspace_slug(&issue.title, cfg.max_slug_len);
        }
    }
    if base.is_empty() {
        // Timestamp fallback never gets the date prefix on top
        return slug::fallback_slug(now);
    }
    if cfg.date_prefix {
        slug::date_prefixed(&base, now)
    } else {
        base
    }
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
