// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SpawnContext quality self-check.
//!
//! A fixed section checklist scored 0-100. Warnings are advisory: a low score
//! surfaces them but never blocks spawning.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityWarning {
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityReport {
    /// 0-100, the share of checklist sections present
    pub score: u8,
    pub warnings: Vec<QualityWarning>,
}

impl QualityReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Sections every SpawnContext must carry, with the severity of their absence.
const CHECKLIST: &[(&str, Severity)] = &[
    ("TASK:", Severity::Critical),
    ("PROJECT_DIR:", Severity::Warning),
    ("SESSION SCOPE:", Severity::Warning),
    ("SCOPE:", Severity::Critical),
    ("AUTHORITY:", Severity::Warning),
    ("DELIVERABLES:", Severity::Critical),
    ("VERIFICATION REQUIRED:", Severity::Warning),
    ("CONTEXT AVAILABLE:", Severity::Info),
    ("SESSION COMPLETE PROTOCOL:", Severity::Critical),
];

/// Placeholder fragments that signal an unfilled TASK line.
const PLACEHOLDERS: &[&str] = &["<task", "[task]", "TODO", "FIXME"];

/// Score a composed SpawnContext against the section checklist.
pub fn check_context(text: &str) -> QualityReport {
    let mut warnings = Vec::new();
    let mut present = 0usize;

    for (section, severity) in CHECKLIST {
        if text.contains(section) {
            present += 1;
        } else {
            warnings.push(QualityWarning {
                severity: *severity,
                message: format!("missing {} section", section.trim_end_matches(':')),
            });
        }
    }

    if let Some(task_line) = text
        .lines()
        .find_map(|l| l.strip_prefix("TASK:"))
    {
        let task = task_line.trim();
        if task.is_empty() {
            warnings.push(QualityWarning {
                severity: Severity::Critical,
                message: "TASK line is empty".to_string(),
            });
        } else if PLACEHOLDERS.iter().any(|p| task.contains(p)) {
            warnings.push(QualityWarning {
                severity: Severity::Warning,
                message: format!("TASK looks like a placeholder: '{task}'"),
            });
        }
    }

    let score = (present * 100 / CHECKLIST.len()) as u8;
    QualityReport { score, warnings }
}

#[cfg(test)]
#[path = "quality_tests.rs"]
mod tests;
