// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The spawn flow: plan, annotate the tracker, launch, register.
//!
//! Tracker issues move to in_progress *before* the window launches; a crash
//! in between leaves an in_progress issue with no agent, which the next
//! reconcile pass surfaces as an orphan rather than rewinding the tracker.
//! The registry append is last: the supervisor never half-mutates it.

use crate::config::Config;
use crate::planner::{plan, PlanError, SpawnPlan, SpawnRequest};
use crate::quality::QualityReport;
use crate::supervisor::{launch, SpawnError};
use fm_adapters::session::WindowManager;
use fm_adapters::tracker::{TrackerError, TrackerGateway};
use fm_adapters::vcs::Vcs;
use fm_core::{AgentMetadata, AgentRecord};
use fm_storage::{Registry, RegistryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpawnFlowError {
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

/// What a successful spawn produced.
#[derive(Debug)]
pub struct SpawnOutcome {
    pub agent: AgentRecord,
    pub quality: QualityReport,
}

/// Plan and execute one spawn end to end.
pub async fn spawn_agent<W, T, V>(
    cfg: &Config,
    windows: &W,
    tracker: &T,
    vcs: &V,
    registry: &mut Registry,
    req: &SpawnRequest,
) -> Result<SpawnOutcome, SpawnFlowError>
where
    W: WindowManager,
    T: TrackerGateway,
    V: Vcs,
{
    let plan = plan(cfg, tracker, vcs, req).await?;
    spawn_planned(cfg, windows, tracker, registry, plan).await
}

/// Execute a plan that was already built (the daemon pre-plans).
pub async fn spawn_planned<W, T>(
    cfg: &Config,
    windows: &W,
    tracker: &T,
    registry: &mut Registry,
    plan: SpawnPlan,
) -> Result<SpawnOutcome, SpawnFlowError>
where
    W: WindowManager,
    T: TrackerGateway,
{
    // Tracker first: issues are in_progress before any window exists
    for issue in &plan.issues {
        tracker
            .update_status(issue, "in_progress", plan.db_path.as_deref())
            .await?;
    }

    let launched = launch(cfg, windows, &plan).await?;

    let mut agent = AgentRecord::new(
        plan.workspace_name.clone(),
        plan.task.clone(),
        plan.project.clone(),
        plan.project_dir.clone(),
        plan.workspace_rel.clone(),
        launched.window.clone(),
        launched.window_id.clone(),
    );
    agent.skill = plan.skill.as_ref().map(|s| s.manifest.name.clone());
    agent.beads_id = plan.issues.first().cloned();
    if plan.issues.len() > 1 {
        agent.beads_ids = Some(plan.issues.clone());
    }
    agent.beads_db_path = plan.db_path.clone();

    registry.register(agent.clone())?;

    // Locate-from-tracker metadata; losing it degrades nothing critical
    if let Some(primary) = plan.primary_issue() {
        let meta = AgentMetadata {
            agent_id: agent.id.clone(),
            window_id: agent.window_id.clone(),
            skill: agent.skill.clone(),
            project_dir: Some(agent.project_dir.clone()),
        };
        if let Err(e) = tracker
            .add_agent_metadata(primary, &meta, plan.db_path.as_deref())
            .await
        {
            tracing::warn!(issue = primary, error = %e, "could not post agent metadata");
        }
    }

    Ok(SpawnOutcome {
        agent,
        quality: plan.quality,
    })
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
