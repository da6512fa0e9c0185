// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux window adapter

use super::{SessionError, WindowInfo, WindowManager};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Tmux-backed window manager
#[derive(Clone, Default)]
pub struct TmuxWindows;

impl TmuxWindows {
    pub fn new() -> Self {
        Self
    }
}

async fn run_tmux(args: &[&str]) -> Result<std::process::Output, SessionError> {
    Command::new("tmux")
        .args(args)
        .output()
        .await
        .map_err(|e| SessionError::CommandFailed(e.to_string()))
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[async_trait]
impl WindowManager for TmuxWindows {
    async fn list_sessions(&self) -> Result<Vec<String>, SessionError> {
        let output = run_tmux(&["list-sessions", "-F", "#{session_name}"]).await?;
        if !output.status.success() {
            let stderr = stderr_of(&output);
            // No server running means no sessions, which is a valid answer
            if stderr.contains("no server running") || stderr.contains("No such file") {
                return Ok(Vec::new());
            }
            return Err(SessionError::CommandFailed(stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    async fn session_exists(&self, session: &str) -> Result<bool, SessionError> {
        let output = run_tmux(&["has-session", "-t", session]).await?;
        Ok(output.status.success())
    }

    async fn new_session(&self, session: &str, cwd: &Path) -> Result<(), SessionError> {
        // Precondition: cwd must exist
        if !cwd.exists() {
            return Err(SessionError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }
        let cwd_str = cwd.to_string_lossy().to_string();
        let output = run_tmux(&[
            "new-session",
            "-d",
            "-s",
            session,
            "-c",
            cwd_str.as_str(),
            "-n",
            "servers",
        ])
        .await?;
        if !output.status.success() {
            let stderr = stderr_of(&output);
            // Racing creator: the session exists now, which is what we wanted
            if stderr.contains("duplicate session") {
                return Ok(());
            }
            tracing::error!(session, stderr = %stderr, "tmux new-session failed");
            return Err(SessionError::SpawnFailed(stderr));
        }
        Ok(())
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, SessionError> {
        let output = run_tmux(&[
            "list-windows",
            "-t",
            session,
            "-F",
            "#{window_id}\t#{window_name}",
        ])
        .await?;
        if !output.status.success() {
            return Err(SessionError::SessionNotFound(session.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| {
                let (id, name) = line.split_once('\t')?;
                Some(WindowInfo {
                    id: id.trim().to_string(),
                    name: name.trim().to_string(),
                })
            })
            .collect())
    }

    async fn new_window(
        &self,
        session: &str,
        name: &str,
        cwd: &Path,
        env: &[(String, String)],
    ) -> Result<String, SessionError> {
        let target = format!("{}:", session);
        let cwd_str = cwd.to_string_lossy().to_string();
        let mut cmd = Command::new("tmux");
        cmd.args(["new-window", "-d", "-P", "-F", "#{window_id}"])
            .args(["-t", target.as_str()])
            .args(["-n", name])
            .args(["-c", cwd_str.as_str()]);
        for (key, value) in env {
            cmd.arg("-e").arg(format!("{}={}", key, value));
        }
        let output = cmd
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            let stderr = stderr_of(&output);
            tracing::error!(session, name, stderr = %stderr, "tmux new-window failed");
            return Err(SessionError::SpawnFailed(stderr));
        }
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            return Err(SessionError::SpawnFailed(
                "tmux did not report a window id".to_string(),
            ));
        }
        Ok(id)
    }

    async fn kill_window(&self, window_id: &str) -> Result<(), SessionError> {
        let output = run_tmux(&["kill-window", "-t", window_id]).await?;
        if !output.status.success() {
            // Window might already be dead, which is fine
        }
        Ok(())
    }

    async fn session_of_window(&self, window_id: &str) -> Result<String, SessionError> {
        let output = run_tmux(&[
            "display-message",
            "-t",
            window_id,
            "-p",
            "#{session_name}",
        ])
        .await?;
        if !output.status.success() {
            return Err(SessionError::WindowNotFound(window_id.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn send_key(&self, window_id: &str, key: &str) -> Result<(), SessionError> {
        let output = run_tmux(&["send-keys", "-t", window_id, key]).await?;
        if !output.status.success() {
            return Err(SessionError::WindowNotFound(window_id.to_string()));
        }
        Ok(())
    }

    async fn send_literal(&self, window_id: &str, text: &str) -> Result<(), SessionError> {
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        let output = run_tmux(&["send-keys", "-t", window_id, "-l", "--", text]).await?;
        if !output.status.success() {
            return Err(SessionError::WindowNotFound(window_id.to_string()));
        }
        Ok(())
    }

    async fn capture_output(&self, window_id: &str, lines: u32) -> Result<String, SessionError> {
        let start = format!("-{}", lines);
        let output =
            run_tmux(&["capture-pane", "-t", window_id, "-p", "-S", start.as_str()]).await?;
        if !output.status.success() {
            return Err(SessionError::WindowNotFound(window_id.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn has_active_processes(&self, window_id: &str) -> Result<bool, SessionError> {
        // Root of the window's process tree
        let output = run_tmux(&["list-panes", "-t", window_id, "-F", "#{pane_pid}"]).await?;
        if !output.status.success() {
            return Err(SessionError::WindowNotFound(window_id.to_string()));
        }
        let pane_pid = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        if pane_pid.is_empty() {
            return Ok(false);
        }

        // Children of the pane shell are the agent and anything it spawned
        let pgrep = Command::new("pgrep")
            .args(["-P", pane_pid.as_str()])
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))?;
        Ok(pgrep.status.success() && !pgrep.stdout.is_empty())
    }

    async fn list_clients(&self, session: &str) -> Result<Vec<String>, SessionError> {
        let output = run_tmux(&["list-clients", "-t", session, "-F", "#{client_name}"]).await?;
        if !output.status.success() {
            return Ok(Vec::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    async fn switch_client(&self, client: &str, session: &str) -> Result<(), SessionError> {
        let output = run_tmux(&["switch-client", "-c", client, "-t", session]).await?;
        if !output.status.success() {
            let stderr = stderr_of(&output);
            tracing::warn!(client, session, stderr = %stderr, "switch-client failed");
            return Err(SessionError::CommandFailed(stderr));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
