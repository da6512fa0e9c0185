// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Beads (`bd`) CLI tracker adapter.

use super::{TrackerError, TrackerGateway};
use async_trait::async_trait;
use fm_core::{Comment, Issue};
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Per-invocation timeout for the tracker CLI.
const BD_TIMEOUT: Duration = Duration::from_secs(30);

/// Tracker gateway backed by the `bd` command-line tool.
#[derive(Clone)]
pub struct BeadsCli {
    cli_path: String,
}

impl Default for BeadsCli {
    fn default() -> Self {
        Self::new()
    }
}

impl BeadsCli {
    pub fn new() -> Self {
        Self {
            cli_path: "bd".to_string(),
        }
    }

    /// Point at a non-default `bd` binary (tests, hermetic installs).
    pub fn with_cli_path(path: impl Into<String>) -> Self {
        Self {
            cli_path: path.into(),
        }
    }

    /// Run `bd [--db <path>] <args...>` with the standard timeout.
    async fn run(&self, args: &[&str], db: Option<&Path>) -> Result<Output, TrackerError> {
        let mut cmd = Command::new(&self.cli_path);
        if let Some(db) = db {
            cmd.arg("--db").arg(db);
        }
        cmd.args(args);

        let result = tokio::time::timeout(BD_TIMEOUT, cmd.output())
            .await
            .map_err(|_| TrackerError::Transient(format!("bd {} timed out", args.join(" "))))?;

        result.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TrackerError::Unavailable
            } else {
                TrackerError::Transient(e.to_string())
            }
        })
    }
}

fn parse_json_array<T: serde::de::DeserializeOwned>(stdout: &[u8]) -> Result<Vec<T>, TrackerError> {
    serde_json::from_slice(stdout)
        .map_err(|e| TrackerError::Transient(format!("malformed tracker JSON: {e}")))
}

#[async_trait]
impl TrackerGateway for BeadsCli {
    async fn get_issue(&self, id: &str, db: Option<&Path>) -> Result<Issue, TrackerError> {
        let output = self.run(&["show", id, "--json"], db).await?;
        if !output.status.success() {
            return Err(TrackerError::IssueNotFound(id.to_string()));
        }
        let mut issues: Vec<Issue> = parse_json_array(&output.stdout)?;
        if issues.is_empty() {
            return Err(TrackerError::IssueNotFound(id.to_string()));
        }
        Ok(issues.remove(0))
    }

    async fn update_status(
        &self,
        id: &str,
        status: &str,
        db: Option<&Path>,
    ) -> Result<(), TrackerError> {
        let output = self.run(&["update", id, "--status", status], db).await?;
        if !output.status.success() {
            return Err(TrackerError::IssueNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn add_comment(
        &self,
        id: &str,
        text: &str,
        db: Option<&Path>,
    ) -> Result<(), TrackerError> {
        let output = self.run(&["comment", id, text], db).await?;
        if !output.status.success() {
            return Err(TrackerError::IssueNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_comments(
        &self,
        id: &str,
        db: Option<&Path>,
    ) -> Result<Vec<Comment>, TrackerError> {
        let output = self.run(&["comments", id, "--json"], db).await?;
        if !output.status.success() {
            return Err(TrackerError::IssueNotFound(id.to_string()));
        }
        // An issue with no comments may print nothing at all
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        parse_json_array(&output.stdout)
    }

    async fn close_issue(
        &self,
        id: &str,
        reason: &str,
        db: Option<&Path>,
    ) -> Result<(), TrackerError> {
        let output = self.run(&["close", id, "--reason", reason], db).await?;
        if !output.status.success() {
            return Err(TrackerError::IssueNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_ready(
        &self,
        label: Option<&str>,
        db: Option<&Path>,
    ) -> Result<Vec<Issue>, TrackerError> {
        let output = self.run(&["ready", "--json"], db).await?;
        if !output.status.success() {
            return Err(TrackerError::Transient(format!(
                "bd ready exited with {}",
                output.status
            )));
        }
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let issues: Vec<Issue> = parse_json_array(&output.stdout)?;
        Ok(match label {
            Some(label) => issues
                .into_iter()
                .filter(|i| i.labels.iter().any(|l| l == label))
                .collect(),
            None => issues,
        })
    }
}

#[cfg(test)]
#[path = "beads_tests.rs"]
mod tests;
