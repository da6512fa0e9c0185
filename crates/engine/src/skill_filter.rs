// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Phase filtering for skill guidance documents.
//!
//! Feature-style skills carry every phase's guidance in one markdown file,
//! fenced by `<!-- SKILL-TEMPLATE: <phase> -->` / `<!-- /SKILL-TEMPLATE -->`
//! markers. When a spawn configures a subset of phases, only those blocks are
//! emitted; everything outside marker blocks (header, separators, footer)
//! passes through byte-identical.

const OPEN_MARKER: &str = "<!-- SKILL-TEMPLATE:";
const CLOSE_MARKER: &str = "<!-- /SKILL-TEMPLATE -->";

/// How implementation-phase guidance is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImplMode {
    /// Test-driven: red, green, refactor
    #[default]
    Tdd,
    /// Direct edits for non-behavioral changes
    Direct,
}

impl ImplMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ImplMode::Tdd => "tdd",
            ImplMode::Direct => "direct",
        }
    }

    fn implementation_block(self) -> &'static str {
        match self {
            ImplMode::Tdd => "implementation-tdd",
            ImplMode::Direct => "implementation-direct",
        }
    }
}

impl std::str::FromStr for ImplMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tdd" => Ok(ImplMode::Tdd),
            "direct" => Ok(ImplMode::Direct),
            other => Err(format!("unknown implementation mode '{other}'")),
        }
    }
}

/// Extract the phase name from an opening marker line, if it is one.
fn open_marker_phase(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let rest = trimmed.strip_prefix(OPEN_MARKER)?;
    let rest = rest.strip_suffix("-->")?;
    Some(rest.trim())
}

/// Whether a marker block named `block` survives the configured phase list.
fn block_selected(block: &str, phases: &[String], mode: ImplMode) -> bool {
    if block == "implementation-tdd" || block == "implementation-direct" {
        return phases.iter().any(|p| p == "implementation") && block == mode.implementation_block();
    }
    phases.iter().any(|p| p == block)
}

/// Filter skill content down to the configured phases.
///
/// `phases = None` keeps every marker block. Content without markers is
/// returned unchanged regardless of the phase list.
pub fn filter_skill_phases(content: &str, phases: Option<&[String]>, mode: ImplMode) -> String {
    let Some(phases) = phases else {
        return content.to_string();
    };
    if !content.contains(OPEN_MARKER) {
        return content.to_string();
    }

    let mut out = String::with_capacity(content.len());
    let mut current_block: Option<(String, bool)> = None;

    for line in content.split_inclusive('\n') {
        match &current_block {
            None => {
                if let Some(phase) = open_marker_phase(line) {
                    let keep = block_selected(phase, phases, mode);
                    if keep {
                        out.push_str(line);
                    }
                    current_block = Some((phase.to_string(), keep));
                } else {
                    out.push_str(line);
                }
            }
            Some((_, keep)) => {
                if *keep {
                    out.push_str(line);
                }
                if line.trim() == CLOSE_MARKER {
                    current_block = None;
                }
            }
        }
    }

    out
}

#[cfg(test)]
#[path = "skill_filter_tests.rs"]
mod tests;
