// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skill manifests and deliverables.
//!
//! A skill attaches a guidance document and a deliverable policy to an agent.
//! The manifest lives in a `skill.toml` next to the guidance markdown; the
//! manifest alone decides what the verifier demands at completion time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of artifact a deliverable is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliverableKind {
    Workspace,
    Investigation,
    Decision,
    Knowledge,
    Commits,
}

impl fmt::Display for DeliverableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliverableKind::Workspace => write!(f, "workspace"),
            DeliverableKind::Investigation => write!(f, "investigation"),
            DeliverableKind::Decision => write!(f, "decision"),
            DeliverableKind::Knowledge => write!(f, "knowledge"),
            DeliverableKind::Commits => write!(f, "commits"),
        }
    }
}

/// A single declared deliverable.
///
/// `path` is a project-relative template; `{name}` expands to the agent id
/// and `{slug}` to the workspace slug. `Commits` deliverables have no path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliverable {
    #[serde(rename = "type")]
    pub kind: DeliverableKind,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub required: bool,
}

impl Deliverable {
    /// Expand the path template for a concrete agent.
    pub fn resolve(&self, name: &str, slug: &str) -> String {
        self.path.replace("{name}", name).replace("{slug}", slug)
    }
}

/// Parsed `skill.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SkillManifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deliverables: Vec<Deliverable>,
    /// Feature-style skills take a phase list, mode, and validation mode
    #[serde(default)]
    pub feature_style: bool,
    /// Investigation skills produce a primary artifact instead of a workspace
    #[serde(default)]
    pub investigation: bool,
    /// Ephemeral workspaces are deleted by the reaper after the window is gone
    #[serde(default)]
    pub ephemeral_workspace: bool,
}

impl SkillManifest {
    pub fn parse(toml_text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_text)
    }

    /// Deliverables the verifier must insist on.
    pub fn required_deliverables(&self) -> impl Iterator<Item = &Deliverable> {
        self.deliverables.iter().filter(|d| d.required)
    }

    pub fn declares(&self, kind: DeliverableKind) -> bool {
        self.deliverables.iter().any(|d| d.kind == kind)
    }
}

#[cfg(test)]
#[path = "skill_tests.rs"]
mod tests;
