// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent registry: a single JSON document under `~/.orch`.
//!
//! Every read-modify-write cycle holds an advisory file lock around
//! load → merge-with-disk → mutate → atomic write (same-directory temp file,
//! fsync, rename). Per-agent merge conflicts resolve to the copy with the
//! greater `updated_at`, so a reconciler's status transition is never
//! reverted by a concurrent writer holding a stale snapshot.

use chrono::Utc;
use fm_core::{AgentRecord, AgentStatus};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("agent '{0}' already registered and active")]
    DuplicateAgent(String),
    #[error("agent '{0}' not found in registry")]
    AgentNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Disposition of an agent's primary artifact during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactCheck {
    /// Agent declared no primary artifact; window closure means completion
    NoArtifact,
    /// Artifact exists and reports `Phase: Complete`
    Complete,
    /// Artifact missing, unreadable, or phase not complete
    Incomplete,
}

/// What a reconcile pass changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileOutcome {
    pub completed: Vec<String>,
    pub abandoned: Vec<String>,
    /// Observed window ids not claimed by any active agent
    pub orphan_windows: Vec<String>,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        self.completed.is_empty() && self.abandoned.is_empty()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    agents: Vec<AgentRecord>,
}

/// Durable, lock-protected store of agent records.
///
/// The in-memory view is a cache; the file is the system of record. Records
/// for finished agents are filtered by queries, never deleted.
pub struct Registry {
    path: PathBuf,
    agents: Vec<AgentRecord>,
}

const LOAD_RETRIES: u32 = 3;

impl Registry {
    /// Open a registry, loading whatever is on disk.
    ///
    /// A missing file is a fresh start; a corrupt file is logged and treated
    /// as empty (it is only ever replaced wholesale by an atomic write, never
    /// truncated in place).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let agents = load_agents(&path);
        Self { path, agents }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register a new agent. Fails if an agent with the same id is already
    /// active. Stamps `spawned_at = updated_at = now`.
    pub fn register(&mut self, mut agent: AgentRecord) -> Result<(), RegistryError> {
        let lock = self.lock()?;
        self.merge_from_disk();
        if self
            .agents
            .iter()
            .any(|a| a.id == agent.id && a.status == AgentStatus::Active)
        {
            return Err(RegistryError::DuplicateAgent(agent.id));
        }
        let now = Utc::now();
        agent.spawned_at = now;
        agent.updated_at = now;
        self.agents.push(agent);
        self.persist(&lock)
    }

    /// Find a record by agent id, falling back to primary linked issue.
    /// Exact id matches always win. Finished agents are included.
    pub fn find(&self, key: &str) -> Option<&AgentRecord> {
        self.agents
            .iter()
            .find(|a| a.id == key)
            .or_else(|| self.agents.iter().find(|a| a.primary_issue() == Some(key)))
    }

    /// All active agents in insertion order.
    pub fn list_active(&self) -> Vec<&AgentRecord> {
        self.agents
            .iter()
            .filter(|a| a.status == AgentStatus::Active)
            .collect()
    }

    /// Every record ever registered, insertion order.
    pub fn list_all(&self) -> &[AgentRecord] {
        &self.agents
    }

    /// Transition an agent to a terminal status.
    pub fn update_status(&mut self, id: &str, status: AgentStatus) -> Result<(), RegistryError> {
        self.update(id, |agent| {
            agent.set_status(status);
        })
    }

    /// Apply a mutation to one agent under the lock and persist.
    ///
    /// The closure runs against the merged view; `updated_at` is bumped if
    /// the closure did not already advance it.
    pub fn update(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut AgentRecord),
    ) -> Result<(), RegistryError> {
        let lock = self.lock()?;
        self.merge_from_disk();
        let agent = self
            .agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| RegistryError::AgentNotFound(id.to_string()))?;
        let before = agent.updated_at;
        f(agent);
        if agent.updated_at <= before {
            agent.touch();
        }
        self.persist(&lock)
    }

    /// Persist the current in-memory view, merging with disk first.
    pub fn save(&mut self) -> Result<(), RegistryError> {
        let lock = self.lock()?;
        self.merge_from_disk();
        self.persist(&lock)
    }

    /// Align registry state with the set of currently live window ids.
    ///
    /// Active agents whose window is present are untouched. Agents whose
    /// window vanished complete, unless they declared a primary artifact
    /// whose phase is not Complete, in which case they are abandoned.
    /// `artifact_check` is consulted only for agents with a vanished window.
    ///
    /// Running reconcile twice with the same window set is a no-op the
    /// second time.
    pub fn reconcile(
        &mut self,
        active_windows: &HashSet<String>,
        artifact_check: &dyn Fn(&AgentRecord) -> ArtifactCheck,
    ) -> Result<ReconcileOutcome, RegistryError> {
        let lock = self.lock()?;
        self.merge_from_disk();

        let mut outcome = ReconcileOutcome::default();
        for agent in &mut self.agents {
            if agent.status != AgentStatus::Active {
                continue;
            }
            if active_windows.contains(&agent.window_id) {
                continue;
            }
            // Window is gone: the authoritative signal of worker exit
            let next = match artifact_check(agent) {
                ArtifactCheck::NoArtifact | ArtifactCheck::Complete => AgentStatus::Completed,
                ArtifactCheck::Incomplete => AgentStatus::Abandoned,
            };
            agent.set_status(next);
            match next {
                AgentStatus::Completed => outcome.completed.push(agent.id.clone()),
                _ => outcome.abandoned.push(agent.id.clone()),
            }
        }

        let claimed: HashSet<&str> = self
            .agents
            .iter()
            .filter(|a| a.status == AgentStatus::Active)
            .map(|a| a.window_id.as_str())
            .collect();
        outcome.orphan_windows = active_windows
            .iter()
            .filter(|w| !claimed.contains(w.as_str()))
            .cloned()
            .collect();
        outcome.orphan_windows.sort();

        if outcome.is_noop() {
            // Nothing changed; skip the write so reconcile stays idempotent
            // at the file level too.
            drop(lock);
            return Ok(outcome);
        }
        self.persist(&lock)?;
        Ok(outcome)
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Acquire the advisory lock. The lock is released when the returned
    /// file handle drops.
    fn lock(&self) -> Result<File, RegistryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Never truncate: the lock file may double as a marker and another
        // process may be inspecting it.
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?;
        file.lock_exclusive()?;
        Ok(file)
    }

    /// Reload the disk snapshot and merge it with the in-memory view.
    ///
    /// Per-agent conflicts resolve by maximum `updated_at`, NOT `spawned_at`,
    /// which is identical on both sides and would make the disk copy always
    /// win, silently reverting reconciler transitions.
    fn merge_from_disk(&mut self) {
        let disk = load_agents(&self.path);
        let mut merged: Vec<AgentRecord> = Vec::with_capacity(disk.len().max(self.agents.len()));

        for d in disk {
            match self.agents.iter().find(|m| m.id == d.id) {
                Some(m) if m.updated_at > d.updated_at => merged.push(m.clone()),
                _ => merged.push(d),
            }
        }
        // Records we hold that disk has never seen (fresh registrations)
        for m in &self.agents {
            if !merged.iter().any(|r| r.id == m.id) {
                merged.push(m.clone());
            }
        }
        self.agents = merged;
    }

    /// Atomically write the current view: temp file in the same directory,
    /// fsync, rename over the target.
    fn persist(&self, _lock: &File) -> Result<(), RegistryError> {
        let tmp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            let doc = RegistryFile {
                agents: self.agents.clone(),
            };
            serde_json::to_writer_pretty(&mut writer, &doc)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Load agent records, tolerating a concurrent writer mid-rename with a
/// short bounded retry. Missing file or persistent parse failure yields an
/// empty list.
fn load_agents(path: &Path) -> Vec<AgentRecord> {
    for attempt in 0..LOAD_RETRIES {
        if !path.exists() {
            return Vec::new();
        }
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open registry");
                return Vec::new();
            }
        };
        match serde_json::from_reader::<_, RegistryFile>(BufReader::new(file)) {
            Ok(doc) => return doc.agents,
            Err(_) if attempt + 1 < LOAD_RETRIES => {
                // Possibly a writer mid-rename; back off briefly and re-read.
                std::thread::sleep(std::time::Duration::from_millis(10 * (attempt as u64 + 1)));
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "registry parse failed, treating as empty"
                );
                return Vec::new();
            }
        }
    }
    Vec::new()
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
