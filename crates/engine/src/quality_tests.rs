// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::context::{build_spawn_context, ContextSpec};
use crate::skill_filter::ImplMode;
use std::path::Path;

fn full_context() -> String {
    let issues = vec!["svc-a".to_string()];
    build_spawn_context(&ContextSpec {
        task: "Add retry to webhook dispatcher",
        project_dir: Path::new("/p"),
        workspace_name: "add-retry",
        workspace_rel: ".orch/workspace/add-retry",
        deliverables: &[],
        issues: &issues,
        skill: None,
        phases: None,
        mode: ImplMode::Tdd,
        validation: None,
        investigation_type: None,
    })
}

#[test]
fn complete_context_scores_100_clean() {
    let report = check_context(&full_context());
    assert!(report.is_clean(), "unexpected warnings: {:?}", report.warnings);
    assert_eq!(report.score, 100);
}

#[test]
fn missing_task_is_critical() {
    let ctx = full_context().replace("TASK:", "JOB:");
    let report = check_context(&ctx);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.severity == Severity::Critical && w.message.contains("TASK")));
    assert!(report.score < 100);
}

#[test]
fn missing_scope_flagged() {
    let ctx = full_context().replace("SCOPE:", "RANGE:");
    let report = check_context(&ctx);
    // Replaces both SCOPE: and SESSION SCOPE:'s suffix match; at minimum the
    // SCOPE section must be reported missing.
    assert!(report.warnings.iter().any(|w| w.message.contains("SCOPE")));
}

#[test]
fn empty_context_warns_for_every_section() {
    let report = check_context("");
    assert_eq!(report.score, 0);
    assert!(report.warnings.len() >= 4);
}

#[test]
fn placeholder_task_warns() {
    let ctx = full_context().replace(
        "TASK: Add retry to webhook dispatcher",
        "TASK: TODO fill this in",
    );
    let report = check_context(&ctx);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.message.contains("placeholder")));
}

#[test]
fn score_reflects_partial_completeness() {
    let ctx = "TASK: something\nSCOPE:\nDELIVERABLES:\n";
    let report = check_context(ctx);
    assert!(report.score > 0 && report.score < 100);
}

#[test]
fn severity_display() {
    assert_eq!(Severity::Critical.to_string(), "critical");
    assert_eq!(Severity::Warning.to_string(), "warning");
    assert_eq!(Severity::Info.to_string(), "info");
}
