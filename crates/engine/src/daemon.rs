// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon loop: poll the tracker, rank, spawn within the concurrency bound.
//!
//! The daemon only fills slots left over after explicit spawns; it never
//! preempts, and the focus configuration reorders its queue without ever
//! affecting correctness.

use crate::config::Config;
use crate::planner::SpawnRequest;
use crate::spawn::spawn_agent;
use fm_adapters::session::WindowManager;
use fm_adapters::tracker::TrackerGateway;
use fm_adapters::vcs::Vcs;
use fm_core::Issue;
use fm_storage::{FocusConfig, Registry};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub project: String,
    pub project_dir: std::path::PathBuf,
    pub dry_run: bool,
}

/// Stats for one polling cycle.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DaemonStats {
    pub issues_found: usize,
    pub spawned: usize,
    pub skipped_at_limit: usize,
    pub failures: usize,
}

/// Rank ready issues by focus score, stable within equal scores.
fn prioritize(issues: &mut [Issue], focus: &FocusConfig, project: &str) {
    if !focus.enabled || !focus.has_priorities() {
        return;
    }
    issues.sort_by_key(|i| {
        std::cmp::Reverse(focus.score(project, &i.labels, i.issue_type.as_deref()))
    });
}

/// Run one daemon cycle: list ready issues, rank, spawn into free slots.
pub async fn run_cycle<W, T, V>(
    cfg: &Config,
    windows: &W,
    tracker: &T,
    vcs: &V,
    registry: &mut Registry,
    opts: &DaemonOptions,
) -> DaemonStats
where
    W: WindowManager,
    T: TrackerGateway,
    V: Vcs,
{
    let mut stats = DaemonStats::default();

    let mut ready = match tracker.list_ready(Some(&cfg.required_label), None).await {
        Ok(issues) => issues,
        Err(e) => {
            tracing::warn!(error = %e, "ready poll failed, skipping cycle");
            return stats;
        }
    };
    stats.issues_found = ready.len();
    if ready.is_empty() {
        return stats;
    }

    let focus = FocusConfig::load(&cfg.focus_path());
    prioritize(&mut ready, &focus, &opts.project);

    // Explicit spawns outrank the daemon: only leftover slots are filled
    let active = registry.list_active().len();
    let slots = cfg.max_concurrent_agents.saturating_sub(active);
    if slots == 0 {
        stats.skipped_at_limit = ready.len();
        tracing::info!(
            active,
            max = cfg.max_concurrent_agents,
            "at agent limit, skipping spawn"
        );
        return stats;
    }

    for issue in ready.iter().take(slots) {
        if opts.dry_run {
            tracing::info!(issue = %issue.id, title = %issue.title, "[dry-run] would spawn");
            stats.spawned += 1;
            continue;
        }
        let mut req = SpawnRequest::new("", opts.project.clone(), opts.project_dir.clone());
        req.issues = vec![issue.id.clone()];
        match spawn_agent(cfg, windows, tracker, vcs, registry, &req).await {
            Ok(outcome) => {
                tracing::info!(issue = %issue.id, agent = %outcome.agent.id, "daemon spawned agent");
                stats.spawned += 1;
            }
            Err(e) => {
                tracing::warn!(issue = %issue.id, error = %e, "daemon spawn failed");
                stats.failures += 1;
            }
        }
    }
    stats.skipped_at_limit = ready.len().saturating_sub(slots);
    stats
}

/// Run the polling loop until cancelled.
pub async fn run<W, T, V>(
    cfg: &Config,
    windows: &W,
    tracker: &T,
    vcs: &V,
    registry_path: &Path,
    opts: &DaemonOptions,
) where
    W: WindowManager,
    T: TrackerGateway,
    V: Vcs,
{
    tracing::info!(
        interval = ?cfg.poll_interval,
        max_concurrent = cfg.max_concurrent_agents,
        label = %cfg.required_label,
        "work daemon started"
    );
    loop {
        // A fresh registry view each cycle keeps merge conflicts short
        let mut registry = Registry::open(registry_path);
        let stats = run_cycle(cfg, windows, tracker, vcs, &mut registry, opts).await;
        if stats.spawned > 0 || stats.failures > 0 {
            tracing::info!(
                found = stats.issues_found,
                spawned = stats.spawned,
                failures = stats.failures,
                skipped = stats.skipped_at_limit,
                "cycle finished"
            );
        }
        tokio::time::sleep(cfg.poll_interval).await;
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
