// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry concurrency and durability properties.

use fm_core::{AgentRecord, AgentStatus};
use fm_storage::{ArtifactCheck, Registry};
use std::collections::HashSet;

fn agent(id: &str, window_id: &str) -> AgentRecord {
    AgentRecord::new(
        id,
        "task",
        "svc",
        "/tmp/proj",
        format!(".orch/workspace/{id}"),
        format!("workers-svc:{id}"),
        window_id,
    )
}

fn no_artifact(_: &AgentRecord) -> ArtifactCheck {
    ArtifactCheck::NoArtifact
}

#[test]
fn concurrent_register_vs_reconcile_loses_nothing() {
    // Thread A registers ten agents sequentially while thread B reconciles
    // against an empty window set. All ten survive; each ends active or
    // completed; ids stay unique.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent-registry.json");

    let writer_path = path.clone();
    let writer = std::thread::spawn(move || {
        for i in 0..10 {
            let mut reg = Registry::open(&writer_path);
            reg.register(agent(&format!("agent-{i}"), &format!("@{i}")))
                .unwrap();
        }
    });
    let rec_path = path.clone();
    let reconciler = std::thread::spawn(move || {
        for _ in 0..10 {
            let mut reg = Registry::open(&rec_path);
            reg.reconcile(&HashSet::new(), &no_artifact).unwrap();
        }
    });
    writer.join().unwrap();
    reconciler.join().unwrap();

    let reg = Registry::open(&path);
    let ids: Vec<&str> = reg.list_all().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids.len(), 10);
    assert_eq!(
        ids.iter().collect::<HashSet<_>>().len(),
        10,
        "duplicate ids: {ids:?}"
    );
    for a in reg.list_all() {
        assert!(matches!(
            a.status,
            AgentStatus::Active | AgentStatus::Completed
        ));
        assert!(a.updated_at >= a.spawned_at);
    }
}

#[test]
fn newest_updated_at_always_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("r.json");

    let mut writer1 = Registry::open(&path);
    writer1.register(agent("contended", "@1")).unwrap();

    // Writer 2 opens with a stale active view
    let mut writer2 = Registry::open(&path);

    // Writer 1 transitions the agent
    writer1
        .update_status("contended", AgentStatus::Completed)
        .unwrap();

    // Writer 2 persists its stale view; the transition must survive
    writer2.save().unwrap();

    assert_eq!(
        Registry::open(&path).find("contended").unwrap().status,
        AgentStatus::Completed
    );
}

#[test]
fn save_load_round_trip_is_lossless() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("r.json");

    let mut reg = Registry::open(&path);
    let mut rich = agent("rich", "@1");
    rich.skill = Some("feature-impl".into());
    rich.beads_id = Some("svc-a".into());
    rich.beads_ids = Some(vec!["svc-a".into(), "svc-b".into()]);
    rich.primary_artifact = Some("/tmp/proj/inv.md".into());
    reg.register(rich).unwrap();

    let first = Registry::open(&path).find("rich").cloned().unwrap();
    // A save cycle that touches nothing related must preserve it bit-for-bit
    let mut other = Registry::open(&path);
    other.register(agent("unrelated", "@2")).unwrap();
    let second = Registry::open(&path).find("rich").cloned().unwrap();
    assert_eq!(first, second);
}

#[test]
fn reconcile_same_window_set_twice_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("r.json");
    let mut reg = Registry::open(&path);
    reg.register(agent("a", "@1")).unwrap();
    reg.register(agent("b", "@2")).unwrap();

    let observed: HashSet<String> = ["@1".to_string()].into_iter().collect();
    reg.reconcile(&observed, &no_artifact).unwrap();
    let snapshot = std::fs::read_to_string(&path).unwrap();

    let outcome = reg.reconcile(&observed, &no_artifact).unwrap();
    assert!(outcome.is_noop());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), snapshot);
}
