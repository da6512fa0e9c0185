// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker comment protocol.
//!
//! Workers express progress and metadata purely through tracker comments whose
//! first line begins with a recognized prefix: `Phase: <token>`,
//! `investigation_path: <path>`, or `agent_metadata: <json>`. The recognized
//! set is modeled as one tagged union parsed by [`parse_comment`]; "latest X"
//! queries are single left-to-right scans so the tracker's chronological order
//! stays authoritative.

use crate::issue::Comment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The phase token that gates completion, compared case-insensitively.
pub const PHASE_COMPLETE: &str = "Complete";

/// Agent metadata posted at spawn time so agents can be located from the
/// tracker alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    pub agent_id: String,
    pub window_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<PathBuf>,
}

/// One recognized (or unrecognized) worker comment.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentMsg {
    /// `Phase: <token>`: a bare word; trailing prose is ignored
    Phase(String),
    /// `investigation_path: <path>`: the rest of the line, trimmed
    InvestigationPath(PathBuf),
    /// `agent_metadata: {..}`: a JSON object
    AgentMetadata(AgentMetadata),
    /// Anything else, including malformed recognized prefixes
    Unknown,
}

/// Parse a comment body into the message union.
///
/// Matching happens at the start of the text. The `Phase:` prefix is
/// case-insensitive; the token itself keeps its original case.
pub fn parse_comment(text: &str) -> CommentMsg {
    if let Some(rest) = strip_prefix_ci(text, "phase:") {
        let token: String = rest
            .trim_start()
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if token.is_empty() {
            return CommentMsg::Unknown;
        }
        return CommentMsg::Phase(token);
    }

    if let Some(rest) = text.strip_prefix("investigation_path:") {
        let path = first_line(rest).trim();
        if path.is_empty() {
            return CommentMsg::Unknown;
        }
        return CommentMsg::InvestigationPath(PathBuf::from(path));
    }

    if let Some(rest) = text.strip_prefix("agent_metadata:") {
        let body = first_line(rest).trim();
        match serde_json::from_str::<AgentMetadata>(body) {
            Ok(meta) => return CommentMsg::AgentMetadata(meta),
            Err(_) => return CommentMsg::Unknown,
        }
    }

    CommentMsg::Unknown
}

/// Whether a phase token means the worker reported completion.
pub fn phase_complete(phase: &str) -> bool {
    phase.eq_ignore_ascii_case(PHASE_COMPLETE)
}

/// Latest `Phase:` token in chronological comment order.
pub fn latest_phase(comments: &[Comment]) -> Option<String> {
    let mut latest = None;
    for c in comments {
        if let CommentMsg::Phase(p) = parse_comment(&c.text) {
            latest = Some(p);
        }
    }
    latest
}

/// Latest `investigation_path:` in chronological comment order.
pub fn latest_investigation_path(comments: &[Comment]) -> Option<PathBuf> {
    let mut latest = None;
    for c in comments {
        if let CommentMsg::InvestigationPath(p) = parse_comment(&c.text) {
            latest = Some(p);
        }
    }
    latest
}

/// Latest successfully parsed `agent_metadata:` comment.
///
/// A later comment that fails to parse does not clobber an earlier good one.
pub fn latest_agent_metadata(comments: &[Comment]) -> Option<AgentMetadata> {
    let mut latest = None;
    for c in comments {
        if let CommentMsg::AgentMetadata(m) = parse_comment(&c.text) {
            latest = Some(m);
        }
    }
    latest
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

#[cfg(test)]
#[path = "comment_tests.rs"]
mod tests;
