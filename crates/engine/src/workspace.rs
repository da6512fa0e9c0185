// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace and investigation artifact parsing.
//!
//! Workers report progress through the tracker, never through workspace
//! files. The verifier still reads the workspace document for its
//! Next-Actions checklist and test results, and investigation artifacts
//! carry the Phase field that gates an investigation's completion.

use fm_core::comment::phase_complete;
use std::path::Path;

/// One `- [ ]` / `- [x]` checklist line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub text: String,
    pub checked: bool,
}

/// Parsed `## Test Results` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResults {
    pub passed: bool,
    pub summary: String,
}

/// Parsed workspace document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceDoc {
    pub phase: Option<String>,
    pub next_actions: Vec<ChecklistItem>,
    pub test_results: Option<TestResults>,
}

impl WorkspaceDoc {
    pub fn phase_is_complete(&self) -> bool {
        self.phase.as_deref().is_some_and(phase_complete)
    }

    pub fn pending_actions(&self) -> Vec<&ChecklistItem> {
        self.next_actions.iter().filter(|i| !i.checked).collect()
    }
}

/// Extract a Phase value from markdown.
///
/// Accepts `**Phase:** X`, `Phase: X`, and `**Status:** Phase: X` forms, first
/// hit wins.
pub fn extract_phase(content: &str) -> Option<String> {
    for line in content.lines() {
        let trimmed = line.trim();
        let candidate = trimmed
            .strip_prefix("**Phase:**")
            .or_else(|| trimmed.strip_prefix("Phase:"))
            .or_else(|| {
                trimmed
                    .strip_prefix("**Status:**")
                    .map(str::trim)
                    .and_then(|r| r.strip_prefix("Phase:"))
            });
        if let Some(value) = candidate {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Read a file and extract its Phase field. Missing or unreadable files
/// yield `None`.
pub fn extract_phase_from_file(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    extract_phase(&content)
}

fn parse_checklist_line(line: &str) -> Option<ChecklistItem> {
    let trimmed = line.trim();
    let (checked, rest) = if let Some(rest) = trimmed.strip_prefix("- [x]") {
        (true, rest)
    } else if let Some(rest) = trimmed.strip_prefix("- [X]") {
        (true, rest)
    } else if let Some(rest) = trimmed.strip_prefix("- [ ]") {
        (false, rest)
    } else {
        return None;
    };
    Some(ChecklistItem {
        text: rest.trim().to_string(),
        checked,
    })
}

fn section_matches(header: &str, names: &[&str]) -> bool {
    let lowered = header.to_lowercase();
    names.iter().any(|n| lowered.contains(n))
}

/// Parse a workspace document.
pub fn parse_workspace(content: &str) -> WorkspaceDoc {
    #[derive(PartialEq)]
    enum Section {
        Other,
        NextActions,
        TestResults,
    }

    let mut doc = WorkspaceDoc {
        phase: extract_phase(content),
        ..Default::default()
    };
    let mut section = Section::Other;
    let mut test_lines: Vec<&str> = Vec::new();

    for line in content.lines() {
        if let Some(header) = line.trim().strip_prefix("##") {
            section = if section_matches(header, &["next action", "next-action"]) {
                Section::NextActions
            } else if section_matches(header, &["test result"]) {
                Section::TestResults
            } else {
                Section::Other
            };
            continue;
        }
        match section {
            Section::NextActions => {
                if let Some(item) = parse_checklist_line(line) {
                    doc.next_actions.push(item);
                }
            }
            Section::TestResults => {
                if !line.trim().is_empty() {
                    test_lines.push(line.trim());
                }
            }
            Section::Other => {}
        }
    }

    if !test_lines.is_empty() {
        let joined = test_lines.join(" ");
        doc.test_results = Some(TestResults {
            passed: tests_passed(&joined),
            summary: test_lines.first().map(|s| s.to_string()).unwrap_or_default(),
        });
    }

    doc
}

/// Decide pass/fail from a free-form results line.
///
/// An explicit `<n> failed` count is authoritative; otherwise any mention of
/// failure fails the block.
fn tests_passed(text: &str) -> bool {
    let lowered = text.to_lowercase();
    let mut prev: Option<u64> = None;
    for word in lowered.split_whitespace() {
        if word.trim_matches(|c: char| !c.is_ascii_alphanumeric()) == "failed" {
            if let Some(n) = prev {
                return n == 0;
            }
        }
        prev = word
            .trim_matches(|c: char| !c.is_ascii_digit())
            .parse()
            .ok();
    }
    !lowered.contains("fail")
}

/// Read and parse a workspace file. `None` when missing or unreadable.
pub fn parse_workspace_file(path: &Path) -> Option<WorkspaceDoc> {
    let content = std::fs::read_to_string(path).ok()?;
    Some(parse_workspace(&content))
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
