// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    open = { "open", IssueStatus::Open },
    in_progress = { "in_progress", IssueStatus::InProgress },
    closed = { "closed", IssueStatus::Closed },
    blocked = { "blocked", IssueStatus::Blocked },
)]
fn status_from_known_strings(s: &str, expected: IssueStatus) {
    assert_eq!(IssueStatus::from(s), expected);
}

#[test]
fn unknown_status_round_trips() {
    let status = IssueStatus::from("triaged");
    assert_eq!(status, IssueStatus::Other("triaged".into()));
    let json = serde_json::to_string(&status).unwrap();
    assert_eq!(json, "\"triaged\"");
    let back: IssueStatus = serde_json::from_str(&json).unwrap();
    assert_eq!(back, status);
}

#[test]
fn only_closed_is_closed() {
    assert!(IssueStatus::Closed.is_closed());
    assert!(!IssueStatus::Open.is_closed());
    assert!(!IssueStatus::Other("done".into()).is_closed());
}

#[test]
fn issue_deserializes_from_tracker_json() {
    let json = r#"{
        "id": "svc-abc",
        "title": "Add retry to webhook dispatcher",
        "status": "open",
        "priority": 2,
        "labels": ["triage:ready"]
    }"#;
    let issue: Issue = serde_json::from_str(json).unwrap();
    assert_eq!(issue.id, "svc-abc");
    assert_eq!(issue.status, IssueStatus::Open);
    assert_eq!(issue.priority, 2);
    assert_eq!(issue.labels, vec!["triage:ready"]);
    assert!(issue.description.is_empty());
    assert!(issue.notes.is_none());
}

#[test]
fn comment_tolerates_missing_fields() {
    let c: Comment = serde_json::from_str("{}").unwrap();
    assert!(c.text.is_empty());
    assert!(c.created_at.is_none());
}
