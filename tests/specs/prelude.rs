// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared rig for lifecycle specs.

use fm_adapters::{FakeTracker, FakeVcs, FakeWindows};
use fm_engine::Config;
use fm_storage::Registry;
use std::path::PathBuf;

pub struct Rig {
    pub cfg: Config,
    pub windows: FakeWindows,
    pub tracker: FakeTracker,
    pub vcs: FakeVcs,
    pub registry: Registry,
    pub project_dir: PathBuf,
    _dir: tempfile::TempDir,
}

impl Rig {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::with_home(dir.path().join(".orch"));
        cfg.date_prefix = false;
        cfg.ready_attempts = 3;
        cfg.ready_poll = std::time::Duration::from_millis(1);
        cfg.reap_grace = std::time::Duration::from_millis(1);
        let project_dir = dir.path().join("proj");
        std::fs::create_dir_all(&project_dir).unwrap();
        Self {
            registry: Registry::open(cfg.registry_path()),
            cfg,
            windows: FakeWindows::new(),
            tracker: FakeTracker::new(),
            vcs: FakeVcs::clean_main(),
            project_dir,
            _dir: dir,
        }
    }

    /// Script ready banners for the next batch of windows the fakes create.
    pub fn all_windows_ready(&self) {
        for n in 0..16 {
            self.windows
                .script_capture(&format!("@{n}"), &["? for shortcuts"]);
        }
    }

    /// Reload the registry from disk, as a second process would see it.
    pub fn reload_registry(&self) -> Registry {
        Registry::open(self.cfg.registry_path())
    }
}
