// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SpawnContext composition.
//!
//! The SpawnContext is the one-shot brief written into each workspace; it is
//! the sole medium by which the orchestrator conveys task, authority, scope,
//! deliverables, and skill guidance to the worker. Progress itself flows back
//! through tracker comments, never through workspace files, so nothing here
//! may instruct the worker to populate workspace state.

use crate::skill_filter::ImplMode;
use crate::skills::Skill;
use fm_core::{Deliverable, DeliverableKind};
use std::fmt::Write as _;
use std::path::Path;

/// Inputs for one SpawnContext.
pub struct ContextSpec<'a> {
    pub task: &'a str,
    pub project_dir: &'a Path,
    pub workspace_name: &'a str,
    pub workspace_rel: &'a str,
    pub deliverables: &'a [Deliverable],
    /// Linked tracker issues, primary first
    pub issues: &'a [String],
    /// Skill with already-filtered guidance content
    pub skill: Option<&'a Skill>,
    pub phases: Option<&'a [String]>,
    pub mode: ImplMode,
    pub validation: Option<&'a str>,
    pub investigation_type: Option<&'a str>,
}

/// Session size estimate shown to the worker.
fn session_scope(skill: Option<&Skill>) -> (&'static str, &'static str) {
    match skill {
        Some(s) if s.manifest.investigation => ("Small", "1-2 hours"),
        Some(s) if s.manifest.feature_style => ("Medium", "2-4 hours"),
        _ => ("Medium", "2-4 hours"),
    }
}

/// Compose the full SpawnContext text.
pub fn build_spawn_context(spec: &ContextSpec<'_>) -> String {
    let mut out = String::with_capacity(4096);
    let project_dir = spec.project_dir.display();

    let _ = writeln!(out, "TASK: {}", spec.task);
    let _ = writeln!(out, "PROJECT_DIR: {project_dir}");
    out.push('\n');

    let (size, duration) = session_scope(spec.skill);
    let _ = writeln!(out, "SESSION SCOPE: {size} (estimated {duration})");
    out.push('\n');

    out.push_str("SCOPE:\n");
    let _ = writeln!(out, "IN:\n- {}", spec.task);
    out.push_str(
        "OUT:\n\
         - Refactors unrelated to the task\n\
         - Dependency upgrades not required by the task\n",
    );
    out.push('\n');

    out.push_str(
        "AUTHORITY:\n\
         You may decide:\n\
         - Implementation details, naming, and test structure\n\
         - Small refactors needed to land the change cleanly\n\
         You must escalate (stop and report, do not guess):\n\
         - Changes to public interfaces or data formats beyond the task\n\
         - Destructive operations outside the project directory\n\
         - Anything that conflicts with existing decisions under .orch/decisions/\n",
    );
    out.push('\n');

    out.push_str("DELIVERABLES:\n");
    if spec.deliverables.is_empty() {
        out.push_str("- Committed code changes referencing the workspace name\n");
    } else {
        for d in spec.deliverables {
            push_deliverable(&mut out, d, spec.workspace_name);
        }
    }
    out.push('\n');

    out.push_str(
        "VERIFICATION REQUIRED:\n\
         - [ ] Work is committed; commit messages reference the workspace name\n\
         - [ ] Tests pass (or failures are explained in the tracker)\n\
         - [ ] All declared deliverables exist\n",
    );
    out.push('\n');

    out.push_str("CONTEXT AVAILABLE:\n");
    let _ = writeln!(out, "- {project_dir}/CLAUDE.md (project instructions)");
    let _ = writeln!(out, "- {project_dir}/.orch/decisions/ (recorded decisions)");
    let _ = writeln!(out, "- {project_dir}/.orch/knowledge/ (accumulated knowledge)");
    let _ = writeln!(out, "- {project_dir}/{} (your workspace)", spec.workspace_rel);
    out.push('\n');

    out.push_str("SESSION COMPLETE PROTOCOL:\n");
    if let Some(primary) = spec.issues.first() {
        let _ = writeln!(
            out,
            "1. Report completion: bd comment {primary} \"Phase: Complete - <one-line summary>\""
        );
    } else {
        out.push_str("1. Ensure all deliverables above exist and work is committed\n");
    }
    out.push_str(
        "2. Verify the working tree is clean and pushed\n\
         3. Type /exit to end your session\n",
    );

    if !spec.issues.is_empty() {
        out.push('\n');
        out.push_str("BEADS PROGRESS TRACKING:\n");
        out.push_str("Linked issues (first is primary):\n");
        for id in spec.issues {
            let _ = writeln!(out, "- {id}");
        }
        let primary = &spec.issues[0];
        let _ = writeln!(
            out,
            "Report phase transitions as you work: bd comment {primary} \"Phase: <Planning|Implementing|Validating|Complete> - <note>\""
        );
        out.push_str("Never close issues yourself; the orchestrator closes them after verification.\n");
    }

    if let Some(skill) = spec.skill {
        if skill.manifest.feature_style {
            out.push('\n');
            out.push_str("FEATURE-IMPL CONFIGURATION:\n");
            let phase_list = spec
                .phases
                .map(|p| p.join(","))
                .unwrap_or_else(|| "all".to_string());
            let _ = writeln!(out, "- Phases: {phase_list}");
            let _ = writeln!(out, "- Mode: {}", spec.mode.as_str());
            let _ = writeln!(out, "- Validation: {}", spec.validation.unwrap_or("tests"));
        }
        if skill.manifest.investigation {
            out.push('\n');
            out.push_str("INVESTIGATION CONFIGURATION:\n");
            let _ = writeln!(
                out,
                "- Type: {}",
                spec.investigation_type.unwrap_or("general")
            );
            let artifact_expected = skill.manifest.declares(DeliverableKind::Investigation);
            let _ = writeln!(
                out,
                "- Investigation artifact expected: {}",
                if artifact_expected { "yes" } else { "no" }
            );
            if artifact_expected {
                if let Some(primary) = spec.issues.first() {
                    let _ = writeln!(
                        out,
                        "- Report the artifact location: bd comment {primary} \"investigation_path: <absolute path>\""
                    );
                }
            }
        }
        if !skill.content.is_empty() {
            out.push('\n');
            let _ = writeln!(out, "SKILL GUIDANCE ({}):", skill.manifest.name);
            out.push_str(&skill.content);
            if !skill.content.ends_with('\n') {
                out.push('\n');
            }
        }
    }

    out
}

fn push_deliverable(out: &mut String, d: &Deliverable, workspace_name: &str) {
    let required = if d.required { "required" } else { "optional" };
    match d.kind {
        DeliverableKind::Commits => {
            let _ = writeln!(
                out,
                "- commits ({required}): commit messages must reference '{workspace_name}'"
            );
        }
        kind => {
            let path = d.resolve(workspace_name, workspace_name);
            let _ = writeln!(out, "- {kind} ({required}): {path}");
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
