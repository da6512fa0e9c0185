// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable in-memory window manager for tests.

use super::{SessionError, WindowInfo, WindowManager};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A recorded call, for asserting on interaction order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowCall {
    NewSession { session: String },
    NewWindow { session: String, name: String },
    KillWindow { window_id: String },
    SendKey { window_id: String, key: String },
    SendLiteral { window_id: String, text: String },
    SwitchClient { client: String, session: String },
}

#[derive(Default)]
struct State {
    sessions: BTreeMap<String, Vec<WindowInfo>>,
    window_sessions: HashMap<String, String>,
    window_cwd: HashMap<String, PathBuf>,
    window_env: HashMap<String, Vec<(String, String)>>,
    captures: HashMap<String, VecDeque<String>>,
    /// Remaining `true` answers for has_active_processes, per window
    process_checks: HashMap<String, u32>,
    clients: HashMap<String, Vec<String>>,
    fail_list_windows: HashSet<String>,
    calls: Vec<WindowCall>,
    next_window: u64,
}

/// In-memory [`WindowManager`] with scriptable captures and process checks.
#[derive(Clone, Default)]
pub struct FakeWindows {
    state: Arc<Mutex<State>>,
}

impl FakeWindows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create a session without going through the trait.
    pub fn add_session(&self, session: &str) {
        self.state
            .lock()
            .sessions
            .entry(session.to_string())
            .or_default();
    }

    /// Pre-create a window with a fixed id.
    pub fn add_window(&self, session: &str, id: &str, name: &str) {
        let mut state = self.state.lock();
        // Keep generated ids clear of manually chosen ones
        if let Some(n) = id.strip_prefix('@').and_then(|n| n.parse::<u64>().ok()) {
            state.next_window = state.next_window.max(n + 1);
        }
        state
            .sessions
            .entry(session.to_string())
            .or_default()
            .push(WindowInfo {
                id: id.to_string(),
                name: name.to_string(),
            });
        state
            .window_sessions
            .insert(id.to_string(), session.to_string());
    }

    /// Queue capture outputs for a window; the last one repeats forever.
    pub fn script_capture(&self, window_id: &str, outputs: &[&str]) {
        self.state.lock().captures.insert(
            window_id.to_string(),
            outputs.iter().map(|s| s.to_string()).collect(),
        );
    }

    /// The next `checks` liveness probes for this window report active
    /// processes; after that the window reads as idle.
    pub fn set_active_process_checks(&self, window_id: &str, checks: u32) {
        self.state
            .lock()
            .process_checks
            .insert(window_id.to_string(), checks);
    }

    pub fn attach_client(&self, session: &str, client: &str) {
        self.state
            .lock()
            .clients
            .entry(session.to_string())
            .or_default()
            .push(client.to_string());
    }

    /// Make `list_windows` fail for one session (partial enumeration).
    pub fn fail_list_windows(&self, session: &str) {
        self.state
            .lock()
            .fail_list_windows
            .insert(session.to_string());
    }

    pub fn calls(&self) -> Vec<WindowCall> {
        self.state.lock().calls.clone()
    }

    pub fn window_env(&self, window_id: &str) -> Vec<(String, String)> {
        self.state
            .lock()
            .window_env
            .get(window_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn window_cwd(&self, window_id: &str) -> Option<PathBuf> {
        self.state.lock().window_cwd.get(window_id).cloned()
    }

    /// Literal text sent to a window, in order.
    pub fn sent_literals(&self, window_id: &str) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                WindowCall::SendLiteral { window_id: w, text } if w == window_id => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn sent_keys(&self, window_id: &str) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                WindowCall::SendKey { window_id: w, key } if w == window_id => Some(key.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl WindowManager for FakeWindows {
    async fn list_sessions(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.state.lock().sessions.keys().cloned().collect())
    }

    async fn session_exists(&self, session: &str) -> Result<bool, SessionError> {
        Ok(self.state.lock().sessions.contains_key(session))
    }

    async fn new_session(&self, session: &str, _cwd: &Path) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.calls.push(WindowCall::NewSession {
            session: session.to_string(),
        });
        let next = state.next_window;
        state.next_window += 1;
        let id = format!("@{next}");
        state.sessions.entry(session.to_string()).or_default().push(WindowInfo {
            id: id.clone(),
            name: "servers".to_string(),
        });
        state.window_sessions.insert(id, session.to_string());
        Ok(())
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, SessionError> {
        let state = self.state.lock();
        if state.fail_list_windows.contains(session) {
            return Err(SessionError::CommandFailed(format!(
                "scripted failure for {session}"
            )));
        }
        state
            .sessions
            .get(session)
            .cloned()
            .ok_or_else(|| SessionError::SessionNotFound(session.to_string()))
    }

    async fn new_window(
        &self,
        session: &str,
        name: &str,
        cwd: &Path,
        env: &[(String, String)],
    ) -> Result<String, SessionError> {
        let mut state = self.state.lock();
        if !state.sessions.contains_key(session) {
            return Err(SessionError::SessionNotFound(session.to_string()));
        }
        state.calls.push(WindowCall::NewWindow {
            session: session.to_string(),
            name: name.to_string(),
        });
        let next = state.next_window;
        state.next_window += 1;
        let id = format!("@{next}");
        if let Some(windows) = state.sessions.get_mut(session) {
            windows.push(WindowInfo {
                id: id.clone(),
                name: name.to_string(),
            });
        }
        state.window_sessions.insert(id.clone(), session.to_string());
        state.window_cwd.insert(id.clone(), cwd.to_path_buf());
        state.window_env.insert(id.clone(), env.to_vec());
        Ok(id)
    }

    async fn kill_window(&self, window_id: &str) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.calls.push(WindowCall::KillWindow {
            window_id: window_id.to_string(),
        });
        if let Some(session) = state.window_sessions.remove(window_id) {
            if let Some(windows) = state.sessions.get_mut(&session) {
                windows.retain(|w| w.id != window_id);
            }
        }
        Ok(())
    }

    async fn session_of_window(&self, window_id: &str) -> Result<String, SessionError> {
        self.state
            .lock()
            .window_sessions
            .get(window_id)
            .cloned()
            .ok_or_else(|| SessionError::WindowNotFound(window_id.to_string()))
    }

    async fn send_key(&self, window_id: &str, key: &str) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        if !state.window_sessions.contains_key(window_id) {
            return Err(SessionError::WindowNotFound(window_id.to_string()));
        }
        state.calls.push(WindowCall::SendKey {
            window_id: window_id.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }

    async fn send_literal(&self, window_id: &str, text: &str) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        if !state.window_sessions.contains_key(window_id) {
            return Err(SessionError::WindowNotFound(window_id.to_string()));
        }
        state.calls.push(WindowCall::SendLiteral {
            window_id: window_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn capture_output(&self, window_id: &str, _lines: u32) -> Result<String, SessionError> {
        let mut state = self.state.lock();
        if !state.window_sessions.contains_key(window_id) {
            return Err(SessionError::WindowNotFound(window_id.to_string()));
        }
        match state.captures.get_mut(window_id) {
            Some(queue) if queue.len() > 1 => Ok(queue.pop_front().unwrap_or_default()),
            Some(queue) => Ok(queue.front().cloned().unwrap_or_default()),
            None => Ok(String::new()),
        }
    }

    async fn has_active_processes(&self, window_id: &str) -> Result<bool, SessionError> {
        let mut state = self.state.lock();
        if !state.window_sessions.contains_key(window_id) {
            return Err(SessionError::WindowNotFound(window_id.to_string()));
        }
        match state.process_checks.get_mut(window_id) {
            Some(0) | None => Ok(false),
            Some(n) => {
                *n -= 1;
                Ok(true)
            }
        }
    }

    async fn list_clients(&self, session: &str) -> Result<Vec<String>, SessionError> {
        Ok(self
            .state
            .lock()
            .clients
            .get(session)
            .cloned()
            .unwrap_or_default())
    }

    async fn switch_client(&self, client: &str, session: &str) -> Result<(), SessionError> {
        self.state.lock().calls.push(WindowCall::SwitchClient {
            client: client.to_string(),
            session: session.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
