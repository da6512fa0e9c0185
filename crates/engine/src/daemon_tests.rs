// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fm_adapters::{FakeTracker, FakeVcs, FakeWindows};
use fm_core::IssueStatus;

struct Rig {
    cfg: Config,
    windows: FakeWindows,
    tracker: FakeTracker,
    vcs: FakeVcs,
    registry: Registry,
    opts: DaemonOptions,
    _dir: tempfile::TempDir,
}

fn rig() -> Rig {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::with_home(dir.path().join(".orch"));
    cfg.date_prefix = false;
    cfg.ready_attempts = 2;
    cfg.ready_poll = std::time::Duration::from_millis(1);
    cfg.max_concurrent_agents = 2;
    let project_dir = dir.path().join("proj");
    std::fs::create_dir_all(&project_dir).unwrap();
    Rig {
        registry: Registry::open(cfg.registry_path()),
        cfg,
        windows: FakeWindows::new(),
        tracker: FakeTracker::new(),
        vcs: FakeVcs::clean_main(),
        opts: DaemonOptions {
            project: "svc".to_string(),
            project_dir,
            dry_run: false,
        },
        _dir: dir,
    }
}

impl Rig {
    fn add_ready(&self, id: &str, title: &str) {
        self.tracker.add_issue(id, title);
        self.tracker.set_labels(id, &["triage:ready"]);
    }

    async fn cycle(&mut self) -> DaemonStats {
        run_cycle(
            &self.cfg,
            &self.windows,
            &self.tracker,
            &self.vcs,
            &mut self.registry,
            &self.opts,
        )
        .await
    }
}

/// Make every window the fakes create report a ready banner.
fn all_ready(windows: &FakeWindows) {
    for n in 0..16 {
        windows.script_capture(&format!("@{n}"), &["? for shortcuts"]);
    }
}

#[tokio::test]
async fn no_ready_issues_is_a_quiet_cycle() {
    let mut rig = rig();
    let stats = rig.cycle().await;
    assert_eq!(stats, DaemonStats::default());
}

#[tokio::test]
async fn unlabeled_issues_are_ignored() {
    let mut rig = rig();
    rig.tracker.add_issue("svc-x", "no label");
    let stats = rig.cycle().await;
    assert_eq!(stats.issues_found, 0);
}

#[tokio::test]
async fn spawns_ready_issues_up_to_limit() {
    let mut rig = rig();
    all_ready(&rig.windows);
    for (id, title) in [("svc-a", "first"), ("svc-b", "second"), ("svc-c", "third")] {
        rig.add_ready(id, title);
    }

    let stats = rig.cycle().await;
    assert_eq!(stats.issues_found, 3);
    assert_eq!(stats.spawned, 2);
    assert_eq!(stats.skipped_at_limit, 1);
    assert_eq!(rig.registry.list_active().len(), 2);

    // Spawned issues moved to in_progress and leave the ready pool
    let remaining = rig.tracker.list_ready(Some("triage:ready"), None).await.unwrap();
    assert_eq!(remaining.len(), 1);
}

#[tokio::test]
async fn at_limit_spawns_nothing() {
    let mut rig = rig();
    all_ready(&rig.windows);
    rig.add_ready("svc-a", "first");
    rig.add_ready("svc-b", "second");
    rig.cycle().await;

    rig.add_ready("svc-c", "third");
    let stats = rig.cycle().await;
    assert_eq!(stats.spawned, 0);
    assert_eq!(stats.skipped_at_limit, 1);
}

#[tokio::test]
async fn dry_run_spawns_nothing() {
    let mut rig = rig();
    rig.opts.dry_run = true;
    rig.add_ready("svc-a", "first");

    let stats = rig.cycle().await;
    assert_eq!(stats.spawned, 1);
    assert!(rig.registry.list_all().is_empty());
    assert_eq!(rig.tracker.issue_status("svc-a"), Some(IssueStatus::Open));
}

#[tokio::test]
async fn focus_reorders_queue() {
    let mut rig = rig();
    rig.cfg.max_concurrent_agents = 1;
    all_ready(&rig.windows);
    // Alphabetically first, so it would win the slot without focus
    rig.add_ready("svc-aaa-plain", "plain issue");
    rig.add_ready("svc-hot", "hot issue");
    rig.tracker.set_labels("svc-hot", &["triage:ready", "urgent"]);

    std::fs::create_dir_all(&rig.cfg.home).unwrap();
    std::fs::write(
        rig.cfg.focus_path(),
        r#"{"priority_labels": ["urgent"]}"#,
    )
    .unwrap();

    let stats = rig.cycle().await;
    assert_eq!(stats.spawned, 1);
    // The focused issue won the single slot
    assert_eq!(
        rig.tracker.issue_status("svc-hot"),
        Some(IssueStatus::InProgress)
    );
    assert_eq!(
        rig.tracker.issue_status("svc-aaa-plain"),
        Some(IssueStatus::Open)
    );
}

#[tokio::test]
async fn spawn_failure_counts_and_continues() {
    let mut rig = rig();
    // Never show a ready banner: every spawn fails at readiness
    rig.add_ready("svc-a", "doomed");
    let stats = rig.cycle().await;
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.spawned, 0);
}
