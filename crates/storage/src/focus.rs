// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Focus configuration: a ranking input for the daemon's spawn queue.
//!
//! `~/.orch/focus.json` declares priority projects, labels, and issue types.
//! This only reorders the queue, never affecting correctness, and a missing
//! or invalid file silently means "no preferences".

use serde::Deserialize;
use std::path::Path;

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct FocusConfig {
    #[serde(default)]
    pub priority_projects: Vec<String>,
    #[serde(default)]
    pub priority_labels: Vec<String>,
    #[serde(default)]
    pub priority_issue_types: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            priority_projects: Vec::new(),
            priority_labels: Vec::new(),
            priority_issue_types: Vec::new(),
            enabled: true,
        }
    }
}

impl FocusConfig {
    /// Load from disk; missing or malformed files yield the default.
    pub fn load(path: &Path) -> Self {
        let Ok(text) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&text).unwrap_or_default()
    }

    pub fn has_priorities(&self) -> bool {
        !self.priority_projects.is_empty()
            || !self.priority_labels.is_empty()
            || !self.priority_issue_types.is_empty()
    }

    /// Priority score: one point per matching project, label, or issue type.
    /// Higher scores sort first; ties keep their original order.
    pub fn score(&self, project: &str, labels: &[String], issue_type: Option<&str>) -> usize {
        if !self.enabled {
            return 0;
        }
        let mut score = 0;
        if self.priority_projects.iter().any(|p| p == project) {
            score += 1;
        }
        score += self
            .priority_labels
            .iter()
            .filter(|l| labels.contains(l))
            .count();
        if let Some(ty) = issue_type {
            if self.priority_issue_types.iter().any(|t| t == ty) {
                score += 1;
            }
        }
        score
    }
}

#[cfg(test)]
#[path = "focus_tests.rs"]
mod tests;
