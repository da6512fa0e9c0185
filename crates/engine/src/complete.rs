// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion flow: verify, then reap.
//!
//! Explicit completion runs the verifier's gates first; only a passing agent
//! reaches the reaper. Dry-run stops after verification with no side effects.

use crate::config::Config;
use crate::reap::{reap, ReapError, ReapOptions, ReapReport};
use crate::skills::load_skill;
use crate::verify::{verify, VerifyOptions, VerifyReport};
use fm_adapters::session::WindowManager;
use fm_adapters::tracker::{TrackerError, TrackerGateway};
use fm_adapters::vcs::Vcs;
use fm_storage::Registry;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompleteError {
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Reap(#[from] ReapError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompleteOptions {
    pub dry_run: bool,
    /// Trust commits over reported phase and reap even stuck processes
    pub force: bool,
    pub skip_test_check: bool,
    pub skip_push_check: bool,
}

/// Outcome of a completion attempt.
#[derive(Debug)]
pub struct CompleteOutcome {
    pub verification: VerifyReport,
    /// Present unless verification failed or dry-run stopped early
    pub reap: Option<ReapReport>,
}

impl CompleteOutcome {
    pub fn succeeded(&self) -> bool {
        self.verification.passed
    }
}

/// Verify an agent and, if it passes, reap it.
pub async fn complete_agent<W, T, V>(
    cfg: &Config,
    windows: &W,
    tracker: &T,
    vcs: &V,
    registry: &mut Registry,
    agent_id: &str,
    opts: CompleteOptions,
) -> Result<CompleteOutcome, CompleteError>
where
    W: WindowManager,
    T: TrackerGateway,
    V: Vcs,
{
    let verify_opts = VerifyOptions {
        skip_phase_check: opts.force,
        skip_test_check: opts.skip_test_check,
        skip_push_check: opts.skip_push_check,
    };
    let verification = verify(cfg, tracker, vcs, registry, agent_id, verify_opts).await?;
    if !verification.passed || opts.dry_run {
        return Ok(CompleteOutcome {
            verification,
            reap: None,
        });
    }

    // The skill's deliverable policy decides whether the workspace outlives
    // the agent.
    let ephemeral = registry
        .find(agent_id)
        .and_then(|a| a.skill.clone())
        .and_then(|name| load_skill(&cfg.skills_dir(), &name).ok())
        .is_some_and(|s| s.manifest.ephemeral_workspace);

    let reap_opts = ReapOptions {
        force: opts.force,
        ephemeral_workspace: ephemeral,
        ..Default::default()
    };
    let report = reap(cfg, windows, tracker, registry, agent_id, reap_opts).await?;

    Ok(CompleteOutcome {
        verification,
        reap: Some(report),
    })
}

#[cfg(test)]
#[path = "complete_tests.rs"]
mod tests;
