// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal multiplexer adapters.
//!
//! The orchestrator supervises *windows* inside named sessions: each project
//! gets a `workers-<project>` session, and each agent gets one window in it.
//! Window ids are opaque and stable for the window's lifetime; the registry
//! stores them verbatim.

mod tmux;

pub use tmux::TmuxWindows;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeWindows, WindowCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from multiplexer operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("window not found: {0}")]
    WindowNotFound(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// One window as observed in a session listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Opaque stable identifier (tmux `@N`)
    pub id: String,
    pub name: String,
}

/// Adapter for a terminal multiplexer with named sessions and stable
/// per-window identifiers.
#[async_trait]
pub trait WindowManager: Clone + Send + Sync + 'static {
    /// All session names currently known to the multiplexer.
    ///
    /// A multiplexer with no running server reports an empty list, not an
    /// error: no server means no windows anywhere.
    async fn list_sessions(&self) -> Result<Vec<String>, SessionError>;

    async fn session_exists(&self, session: &str) -> Result<bool, SessionError>;

    /// Create a detached session whose first window is the pinned `servers`
    /// window. Sessions outlive individual workers.
    async fn new_session(&self, session: &str, cwd: &Path) -> Result<(), SessionError>;

    /// Windows of one session.
    async fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, SessionError>;

    /// Create a window and return its opaque id.
    async fn new_window(
        &self,
        session: &str,
        name: &str,
        cwd: &Path,
        env: &[(String, String)],
    ) -> Result<String, SessionError>;

    async fn kill_window(&self, window_id: &str) -> Result<(), SessionError>;

    /// Session a window currently belongs to.
    async fn session_of_window(&self, window_id: &str) -> Result<String, SessionError>;

    /// Send a key name (`Enter`, `C-c`, ...) to a window.
    async fn send_key(&self, window_id: &str, key: &str) -> Result<(), SessionError>;

    /// Send literal text to a window (no key-name interpretation).
    async fn send_literal(&self, window_id: &str, text: &str) -> Result<(), SessionError>;

    /// Capture the last `lines` lines of window output.
    async fn capture_output(&self, window_id: &str, lines: u32) -> Result<String, SessionError>;

    /// Whether any process is still running under the window's pane, found
    /// by walking the process tree down from the pane's root PID.
    async fn has_active_processes(&self, window_id: &str) -> Result<bool, SessionError>;

    /// Clients currently attached to a session.
    async fn list_clients(&self, session: &str) -> Result<Vec<String>, SessionError>;

    /// Point an attached client at another session. Best-effort; callers
    /// treat failures as non-fatal.
    async fn switch_client(&self, client: &str, session: &str) -> Result<(), SessionError>;
}
