// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fm-core: domain types for the Foreman (fm) orchestrator
//!
//! Everything here is pure data and parsing: agent registry records, mirrored
//! tracker issues, the worker comment protocol, skill manifests, and workspace
//! name derivation. No I/O happens in this crate.

pub mod agent;
pub mod comment;
pub mod issue;
pub mod skill;
pub mod slug;

pub use agent::{AgentRecord, AgentStatus, CompletionRecord};
pub use comment::{
    latest_agent_metadata, latest_investigation_path, latest_phase, parse_comment, phase_complete,
    AgentMetadata, CommentMsg, PHASE_COMPLETE,
};
pub use issue::{Comment, Issue, IssueStatus};
pub use skill::{Deliverable, DeliverableKind, SkillManifest};
pub use slug::{fallback_slug, workspace_slug, DEFAULT_SLUG_LEN};
