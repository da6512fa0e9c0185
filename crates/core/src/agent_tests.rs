// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn record() -> AgentRecord {
    AgentRecord::new(
        "fix-login-button",
        "Fix the login button",
        "webapp",
        "/home/u/webapp",
        ".orch/workspace/fix-login-button",
        "workers-webapp:fix-login-button",
        "@42",
    )
}

#[test]
fn new_record_is_active_with_equal_timestamps() {
    let a = record();
    assert_eq!(a.status, AgentStatus::Active);
    assert_eq!(a.spawned_at, a.updated_at);
    assert!(a.completed_at.is_none());
    assert!(a.terminated_at.is_none());
}

#[test]
fn set_status_completed_stamps_completed_at() {
    let mut a = record();
    assert!(a.set_status(AgentStatus::Completed));
    assert_eq!(a.status, AgentStatus::Completed);
    assert!(a.completed_at.is_some());
    assert!(a.terminated_at.is_none());
    assert!(a.updated_at >= a.spawned_at);
}

#[test]
fn set_status_abandoned_stamps_terminated_at() {
    let mut a = record();
    assert!(a.set_status(AgentStatus::Abandoned));
    assert!(a.terminated_at.is_some());
    assert!(a.completed_at.is_none());
}

#[test]
fn no_resurrection_from_terminal_states() {
    let mut a = record();
    assert!(a.set_status(AgentStatus::Completed));
    let stamped = a.updated_at;
    assert!(!a.set_status(AgentStatus::Failed));
    assert!(!a.set_status(AgentStatus::Active));
    assert_eq!(a.status, AgentStatus::Completed);
    assert_eq!(a.updated_at, stamped);
}

#[test]
fn primary_issue_prefers_beads_id() {
    let mut a = record();
    assert_eq!(a.primary_issue(), None);
    a.beads_ids = Some(vec!["svc-b".into(), "svc-c".into()]);
    assert_eq!(a.primary_issue(), Some("svc-b"));
    a.beads_id = Some("svc-a".into());
    assert_eq!(a.primary_issue(), Some("svc-a"));
}

#[test]
fn linked_issues_declaration_order() {
    let mut a = record();
    a.beads_id = Some("svc-a".into());
    a.beads_ids = Some(vec!["svc-a".into(), "svc-b".into(), "svc-c".into()]);
    assert_eq!(a.linked_issues(), vec!["svc-a", "svc-b", "svc-c"]);
}

#[test]
fn linked_issues_single_fallback() {
    let mut a = record();
    a.beads_id = Some("svc-a".into());
    assert_eq!(a.linked_issues(), vec!["svc-a"]);
}

#[test]
fn workspace_containment() {
    let mut a = record();
    assert!(a.workspace_is_contained());
    a.workspace = "../outside".into();
    assert!(!a.workspace_is_contained());
    a.workspace = "/abs/path".into();
    assert!(!a.workspace_is_contained());
}

#[test]
fn serde_round_trip_preserves_record() {
    let mut a = record();
    a.skill = Some("feature-impl".into());
    a.beads_id = Some("svc-a".into());
    let json = serde_json::to_string(&a).unwrap();
    let back: AgentRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(a, back);
}

#[test]
fn status_serializes_lowercase() {
    let json = serde_json::to_string(&AgentStatus::Abandoned).unwrap();
    assert_eq!(json, "\"abandoned\"");
}

#[test]
fn optional_fields_omitted_when_none() {
    let a = record();
    let json = serde_json::to_string(&a).unwrap();
    assert!(!json.contains("beads_id"));
    assert!(!json.contains("completed_at"));
    assert!(!json.contains("completion"));
}
