// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end lifecycle scenarios over the fake adapters.

use crate::prelude::Rig;
use fm_adapters::WindowManager;
use fm_core::{AgentStatus, IssueStatus};
use fm_engine::planner::SpawnRequest;
use fm_engine::{complete_agent, reconcile, spawn_agent, CompleteOptions};

#[tokio::test]
async fn single_issue_happy_path() {
    let mut rig = Rig::new();
    rig.all_windows_ready();
    rig.tracker.add_issue("svc-abc", "Add retry to webhook dispatcher");

    // Spawn from the issue
    let mut req = SpawnRequest::new(
        "Add retry to webhook dispatcher",
        "svc",
        &rig.project_dir,
    );
    req.issues = vec!["svc-abc".to_string()];
    let outcome = spawn_agent(
        &rig.cfg,
        &rig.windows,
        &rig.tracker,
        &rig.vcs,
        &mut rig.registry,
        &req,
    )
    .await
    .unwrap();

    assert_eq!(outcome.agent.id, "add-retry-to-webhook-dispatcher");
    assert_eq!(
        rig.tracker.issue_status("svc-abc"),
        Some(IssueStatus::InProgress)
    );
    let context = std::fs::read_to_string(
        rig.project_dir
            .join(".orch/workspace/add-retry-to-webhook-dispatcher/SPAWN_CONTEXT.md"),
    )
    .unwrap();
    assert!(context.contains("BEADS PROGRESS TRACKING"));
    assert!(context.contains("svc-abc"));

    // Worker reports progress, then completion, and commits its work
    rig.tracker.post_comment("svc-abc", "Phase: Implementing - retry loop");
    rig.tracker.post_comment("svc-abc", "Phase: Complete - retry shipped");
    rig.vcs
        .add_commit_message("add-retry-to-webhook-dispatcher: add retry");

    let outcome = complete_agent(
        &rig.cfg,
        &rig.windows,
        &rig.tracker,
        &rig.vcs,
        &mut rig.registry,
        "add-retry-to-webhook-dispatcher",
        CompleteOptions::default(),
    )
    .await
    .unwrap();

    assert!(outcome.succeeded());
    assert_eq!(
        rig.tracker.issue_status("svc-abc"),
        Some(IssueStatus::Closed)
    );
    let agent = rig
        .reload_registry()
        .find("add-retry-to-webhook-dispatcher")
        .cloned()
        .unwrap();
    assert_eq!(agent.status, AgentStatus::Completed);
    assert!(agent.completed_at.is_some());
}

#[tokio::test]
async fn multi_issue_spawn_closes_all_gates_on_primary() {
    let mut rig = Rig::new();
    rig.all_windows_ready();
    for id in ["svc-a", "svc-b", "svc-c"] {
        rig.tracker.add_issue(id, id);
    }

    let mut req = SpawnRequest::new("multi issue change", "svc", &rig.project_dir);
    req.issues = vec!["svc-a".into(), "svc-b".into(), "svc-c".into()];
    let outcome = spawn_agent(
        &rig.cfg,
        &rig.windows,
        &rig.tracker,
        &rig.vcs,
        &mut rig.registry,
        &req,
    )
    .await
    .unwrap();

    for id in ["svc-a", "svc-b", "svc-c"] {
        assert_eq!(rig.tracker.issue_status(id), Some(IssueStatus::InProgress));
    }

    // Only the primary carries the phase; the others close unconditionally
    rig.tracker.post_comment("svc-a", "Phase: Complete - done");
    rig.vcs.add_commit_message("multi-issue-change: land");

    let done = complete_agent(
        &rig.cfg,
        &rig.windows,
        &rig.tracker,
        &rig.vcs,
        &mut rig.registry,
        &outcome.agent.id,
        CompleteOptions::default(),
    )
    .await
    .unwrap();
    assert!(done.succeeded());
    for id in ["svc-a", "svc-b", "svc-c"] {
        assert_eq!(rig.tracker.issue_status(id), Some(IssueStatus::Closed));
    }
}

#[tokio::test]
async fn lost_window_reconciles_to_completed() {
    let mut rig = Rig::new();
    rig.all_windows_ready();
    let req = SpawnRequest::new("will vanish", "svc", &rig.project_dir);
    let outcome = spawn_agent(
        &rig.cfg,
        &rig.windows,
        &rig.tracker,
        &rig.vcs,
        &mut rig.registry,
        &req,
    )
    .await
    .unwrap();

    // The window dies outside the orchestrator's control
    rig.windows.kill_window(&outcome.agent.window_id).await.unwrap();

    let report = reconcile(&rig.windows, &mut rig.registry).await.unwrap();
    assert_eq!(report.completed, vec![outcome.agent.id.clone()]);

    let agent = rig.reload_registry().find(&outcome.agent.id).cloned().unwrap();
    assert_eq!(agent.status, AgentStatus::Completed);
    assert!(agent.completed_at.is_some());
}

#[tokio::test]
async fn lost_window_with_incomplete_artifact_is_abandoned() {
    let mut rig = Rig::new();
    rig.all_windows_ready();
    let req = SpawnRequest::new("investigating something", "svc", &rig.project_dir);
    let outcome = spawn_agent(
        &rig.cfg,
        &rig.windows,
        &rig.tracker,
        &rig.vcs,
        &mut rig.registry,
        &req,
    )
    .await
    .unwrap();

    let artifact = rig.project_dir.join(".orch/investigations/inv.md");
    std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
    std::fs::write(&artifact, "**Phase:** Investigating\n").unwrap();
    rig.registry
        .update(&outcome.agent.id, |a| a.primary_artifact = Some(artifact.clone()))
        .unwrap();

    rig.windows.kill_window(&outcome.agent.window_id).await.unwrap();

    let report = reconcile(&rig.windows, &mut rig.registry).await.unwrap();
    assert_eq!(report.abandoned, vec![outcome.agent.id.clone()]);
    let agent = rig.reload_registry().find(&outcome.agent.id).cloned().unwrap();
    assert_eq!(agent.status, AgentStatus::Abandoned);
    assert!(agent.terminated_at.is_some());
}

#[tokio::test]
async fn missing_deliverable_blocks_completion_entirely() {
    let mut rig = Rig::new();
    rig.all_windows_ready();
    rig.tracker.add_issue("svc-inv", "Investigate flaky auth");

    let skill_dir = rig.cfg.skills_dir().join("investigation");
    std::fs::create_dir_all(&skill_dir).unwrap();
    std::fs::write(
        skill_dir.join("skill.toml"),
        "name = \"investigation\"\ninvestigation = true\n\n[[deliverables]]\ntype = \"investigation\"\nrequired = true\n",
    )
    .unwrap();

    let mut req = SpawnRequest::new("Investigate flaky auth", "svc", &rig.project_dir);
    req.issues = vec!["svc-inv".to_string()];
    req.skill = Some("investigation".to_string());
    let outcome = spawn_agent(
        &rig.cfg,
        &rig.windows,
        &rig.tracker,
        &rig.vcs,
        &mut rig.registry,
        &req,
    )
    .await
    .unwrap();

    // Phase says complete, but the declared investigation file never appeared
    rig.tracker.post_comment("svc-inv", "Phase: Complete - wrote it up (not really)");

    let attempt = complete_agent(
        &rig.cfg,
        &rig.windows,
        &rig.tracker,
        &rig.vcs,
        &mut rig.registry,
        &outcome.agent.id,
        CompleteOptions::default(),
    )
    .await
    .unwrap();

    assert!(!attempt.succeeded());
    assert!(attempt.reap.is_none());
    // Registry unchanged, issue still open
    assert_eq!(
        rig.reload_registry().find(&outcome.agent.id).unwrap().status,
        AgentStatus::Active
    );
    assert_eq!(
        rig.tracker.issue_status("svc-inv"),
        Some(IssueStatus::InProgress)
    );
}
