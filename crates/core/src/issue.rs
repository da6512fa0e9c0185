// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mirrored tracker issue types.
//!
//! The tracker is authoritative; these structs only hold what a single
//! operation needs and are re-read on demand, never cached across calls.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Issue status as reported by the tracker.
///
/// Unknown states round-trip through `Other` so a newer tracker cannot break
/// deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueStatus {
    Open,
    InProgress,
    Closed,
    Blocked,
    Other(String),
}

impl IssueStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, IssueStatus::Closed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Closed => "closed",
            IssueStatus::Blocked => "blocked",
            IssueStatus::Other(s) => s,
        }
    }
}

impl From<&str> for IssueStatus {
    fn from(s: &str) -> Self {
        match s {
            "open" => IssueStatus::Open,
            "in_progress" => IssueStatus::InProgress,
            "closed" => IssueStatus::Closed,
            "blocked" => IssueStatus::Blocked,
            other => IssueStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IssueStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IssueStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(IssueStatus::from(s.as_str()))
    }
}

/// A tracker issue, as returned by `show --json` / `list --json`.
///
/// Lower `priority` is higher priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: IssueStatus,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
}

/// A single issue comment. The tracker defines the chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: None,
        }
    }
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
