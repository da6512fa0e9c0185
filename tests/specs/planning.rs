// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Planner boundary behaviors.

use crate::prelude::Rig;
use fm_core::IssueStatus;
use fm_engine::planner::{plan, PlanError, SpawnRequest};

#[tokio::test]
async fn punctuation_only_task_gets_fallback_slug() {
    let rig = Rig::new();
    let req = SpawnRequest::new("??!!..", "svc", &rig.project_dir);
    let plan = plan(&rig.cfg, &rig.tracker, &rig.vcs, &req).await.unwrap();
    assert!(plan.workspace_name.starts_with("debug-bug-"));
}

#[tokio::test]
async fn empty_task_gets_fallback_slug() {
    let rig = Rig::new();
    let req = SpawnRequest::new("", "svc", &rig.project_dir);
    let plan = plan(&rig.cfg, &rig.tracker, &rig.vcs, &req).await.unwrap();
    assert!(plan.workspace_name.starts_with("debug-bug-"));
}

#[tokio::test]
async fn closed_issue_in_batch_rejects_everything() {
    let rig = Rig::new();
    rig.tracker.add_issue("svc-a", "fine");
    rig.tracker
        .add_issue_with_status("svc-b", "done already", IssueStatus::Closed);

    let mut req = SpawnRequest::new("batch", "svc", &rig.project_dir);
    req.issues = vec!["svc-a".into(), "svc-b".into()];
    let err = plan(&rig.cfg, &rig.tracker, &rig.vcs, &req)
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::ClosedIssue { id } if id == "svc-b"));
    assert_eq!(rig.tracker.issue_status("svc-a"), Some(IssueStatus::Open));
}

#[tokio::test]
async fn mandatory_context_sections_always_present() {
    let rig = Rig::new();
    rig.tracker.add_issue("svc-a", "title");

    let mut req = SpawnRequest::new("check sections", "svc", &rig.project_dir);
    req.issues = vec!["svc-a".into()];
    let plan = plan(&rig.cfg, &rig.tracker, &rig.vcs, &req).await.unwrap();

    for section in [
        "TASK:",
        "PROJECT_DIR:",
        "SCOPE:",
        "AUTHORITY:",
        "DELIVERABLES:",
        "VERIFICATION REQUIRED:",
        "SESSION COMPLETE PROTOCOL:",
        "BEADS PROGRESS TRACKING",
    ] {
        assert!(plan.context.contains(section), "missing {section}");
    }
    assert_eq!(plan.quality.score, 100);
}

#[tokio::test]
async fn no_issues_means_no_beads_block() {
    let rig = Rig::new();
    let req = SpawnRequest::new("solo task", "svc", &rig.project_dir);
    let plan = plan(&rig.cfg, &rig.tracker, &rig.vcs, &req).await.unwrap();
    assert!(!plan.context.contains("BEADS PROGRESS TRACKING"));
}
