// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version control adapter.
//!
//! The orchestrator needs a handful of read-mostly git facts: current branch,
//! porcelain status, whether any commit mentions a workspace name, and how far
//! ahead of the tracked remote the branch is. Local-only repositories (no
//! remote) are first-class; their known benign pull errors are swallowed.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

/// Errors from VCS operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("not a git repository: {0}")]
    NotARepo(String),
    #[error("git command failed: {0}")]
    CommandFailed(String),
}

/// Minimal version-control surface the orchestrator consumes.
#[async_trait]
pub trait Vcs: Clone + Send + Sync + 'static {
    async fn is_repo(&self, dir: &Path) -> bool;

    async fn current_branch(&self, dir: &Path) -> Result<String, GitError>;

    /// `git status --porcelain` lines, trimmed, empty when clean.
    async fn status_porcelain(&self, dir: &Path) -> Result<Vec<String>, GitError>;

    /// Whether any commit message anywhere mentions `needle`.
    async fn has_commit_mentioning(&self, dir: &Path, needle: &str) -> Result<bool, GitError>;

    /// Commits ahead of `origin/<branch>`, or `None` when there is no
    /// upstream to compare against.
    async fn unpushed_count(&self, dir: &Path, branch: &str) -> Result<Option<u32>, GitError>;

    /// `git pull origin <branch>`, tolerating the benign error strings a
    /// local-only repository produces.
    async fn pull(&self, dir: &Path, branch: &str) -> Result<(), GitError>;
}

/// Extract the path portion of a porcelain status line (`XY path`).
pub fn porcelain_path(line: &str) -> Option<&str> {
    line.trim_start()
        .splitn(2, char::is_whitespace)
        .nth(1)
        .map(str::trim)
}

/// Drop status lines covered by an exclusion list. An entry matches when it
/// equals the changed path or when the changed path is a directory prefix of
/// the entry (`?? .orch/` covers an excluded `.orch/ROADMAP.md`).
pub fn filter_excluded<'a>(lines: &'a [String], exclude: &[&str]) -> Vec<&'a str> {
    lines
        .iter()
        .map(String::as_str)
        .filter(|line| {
            let Some(path) = porcelain_path(line) else {
                return true;
            };
            !exclude
                .iter()
                .any(|ex| *ex == path || ex.starts_with(path) || path.starts_with(ex))
        })
        .collect()
}

/// Pull errors that simply mean "no remote here".
const BENIGN_PULL_ERRORS: &[&str] = &[
    "no tracking information",
    "does not have any commits yet",
    "does not appear to be a git repository",
    "could not read from remote repository",
];

/// Git CLI adapter
#[derive(Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }
}

async fn run_git(dir: &Path, args: &[&str]) -> Result<std::process::Output, GitError> {
    Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .await
        .map_err(|e| GitError::CommandFailed(e.to_string()))
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[async_trait]
impl Vcs for GitCli {
    async fn is_repo(&self, dir: &Path) -> bool {
        run_git(dir, &["rev-parse", "--git-dir"])
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn current_branch(&self, dir: &Path) -> Result<String, GitError> {
        let output = run_git(dir, &["branch", "--show-current"]).await?;
        if !output.status.success() {
            return Err(GitError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(stdout_of(&output))
    }

    async fn status_porcelain(&self, dir: &Path) -> Result<Vec<String>, GitError> {
        let output = run_git(dir, &["status", "--porcelain"]).await?;
        if !output.status.success() {
            return Err(GitError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    async fn has_commit_mentioning(&self, dir: &Path, needle: &str) -> Result<bool, GitError> {
        let grep = format!("--grep={needle}");
        let output = run_git(dir, &["log", "--all", grep.as_str(), "--oneline"]).await?;
        if !output.status.success() {
            // Repos with no commits yet grep to nothing
            return Ok(false);
        }
        Ok(!stdout_of(&output).is_empty())
    }

    async fn unpushed_count(&self, dir: &Path, branch: &str) -> Result<Option<u32>, GitError> {
        let range = format!("origin/{branch}..HEAD");
        let output = run_git(dir, &["rev-list", "--count", range.as_str()]).await?;
        if !output.status.success() {
            // origin/<branch> does not exist: nothing to compare against
            return Ok(None);
        }
        Ok(stdout_of(&output).parse().ok())
    }

    async fn pull(&self, dir: &Path, branch: &str) -> Result<(), GitError> {
        let output = run_git(dir, &["pull", "origin", branch]).await?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
        if BENIGN_PULL_ERRORS.iter().any(|e| stderr.contains(e)) {
            // Local-only repo; skip the pull and carry on
            return Ok(());
        }
        Err(GitError::CommandFailed(format!(
            "git pull origin {branch}: {}",
            stderr.trim()
        )))
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake_vcs {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[derive(Default)]
    struct State {
        is_repo: bool,
        branch: String,
        dirty: Vec<String>,
        commit_messages: Vec<String>,
        unpushed: Option<u32>,
        pull_error: Option<String>,
        pulled: HashSet<String>,
    }

    /// Scriptable in-memory [`Vcs`] for tests.
    #[derive(Clone)]
    pub struct FakeVcs {
        state: Arc<Mutex<State>>,
    }

    impl Default for FakeVcs {
        fn default() -> Self {
            Self::clean_main()
        }
    }

    impl FakeVcs {
        /// A repo on `main`, clean, nothing unpushed.
        pub fn clean_main() -> Self {
            let state = State {
                is_repo: true,
                branch: "main".to_string(),
                unpushed: Some(0),
                ..Default::default()
            };
            Self {
                state: Arc::new(Mutex::new(state)),
            }
        }

        pub fn not_a_repo() -> Self {
            Self {
                state: Arc::new(Mutex::new(State::default())),
            }
        }

        pub fn set_branch(&self, branch: &str) {
            self.state.lock().branch = branch.to_string();
        }

        pub fn set_dirty(&self, lines: &[&str]) {
            self.state.lock().dirty = lines.iter().map(|s| s.to_string()).collect();
        }

        pub fn add_commit_message(&self, message: &str) {
            self.state.lock().commit_messages.push(message.to_string());
        }

        pub fn set_unpushed(&self, count: Option<u32>) {
            self.state.lock().unpushed = count;
        }

        pub fn set_pull_error(&self, error: &str) {
            self.state.lock().pull_error = Some(error.to_string());
        }

        pub fn pulled_branches(&self) -> Vec<String> {
            self.state.lock().pulled.iter().cloned().collect()
        }
    }

    #[async_trait]
    impl Vcs for FakeVcs {
        async fn is_repo(&self, _dir: &Path) -> bool {
            self.state.lock().is_repo
        }

        async fn current_branch(&self, _dir: &Path) -> Result<String, GitError> {
            Ok(self.state.lock().branch.clone())
        }

        async fn status_porcelain(&self, _dir: &Path) -> Result<Vec<String>, GitError> {
            Ok(self.state.lock().dirty.clone())
        }

        async fn has_commit_mentioning(
            &self,
            _dir: &Path,
            needle: &str,
        ) -> Result<bool, GitError> {
            Ok(self
                .state
                .lock()
                .commit_messages
                .iter()
                .any(|m| m.contains(needle)))
        }

        async fn unpushed_count(&self, _dir: &Path, _branch: &str) -> Result<Option<u32>, GitError> {
            Ok(self.state.lock().unpushed)
        }

        async fn pull(&self, _dir: &Path, branch: &str) -> Result<(), GitError> {
            let mut state = self.state.lock();
            if let Some(err) = &state.pull_error {
                return Err(GitError::CommandFailed(err.clone()));
            }
            state.pulled.insert(branch.to_string());
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake_vcs::FakeVcs;

#[cfg(test)]
#[path = "vcs_tests.rs"]
mod tests;
