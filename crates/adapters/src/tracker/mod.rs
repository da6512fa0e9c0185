// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue tracker adapters.
//!
//! The tracker is the durable source of truth for work items and the sole
//! audit log of phase progression. The gateway's derived queries are the only
//! sanctioned way to extract semantics from the comment stream; everything
//! goes through the tagged-union parser in `fm_core::comment`.

mod beads;

pub use beads::BeadsCli;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTracker, TrackerCall};

use async_trait::async_trait;
use fm_core::{comment, AgentMetadata, Comment, Issue};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from tracker operations
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The tracker CLI is missing from the environment
    #[error("tracker CLI not found; install beads or check PATH")]
    Unavailable,
    #[error("issue '{0}' not found")]
    IssueNotFound(String),
    /// Timeouts, malformed JSON, transient non-zero exits; retryable
    #[error("transient tracker failure: {0}")]
    Transient(String),
}

/// Typed adapter over the external issue tracker.
///
/// Every call accepts an optional alternative database path so the
/// orchestrator can operate across project boundaries. Implementations do no
/// caching between calls; comment ordering is defined by the tracker.
#[async_trait]
pub trait TrackerGateway: Clone + Send + Sync + 'static {
    async fn get_issue(&self, id: &str, db: Option<&Path>) -> Result<Issue, TrackerError>;

    async fn update_status(
        &self,
        id: &str,
        status: &str,
        db: Option<&Path>,
    ) -> Result<(), TrackerError>;

    async fn add_comment(&self, id: &str, text: &str, db: Option<&Path>)
        -> Result<(), TrackerError>;

    /// Comments in the tracker's chronological order.
    async fn list_comments(
        &self,
        id: &str,
        db: Option<&Path>,
    ) -> Result<Vec<Comment>, TrackerError>;

    async fn close_issue(
        &self,
        id: &str,
        reason: &str,
        db: Option<&Path>,
    ) -> Result<(), TrackerError>;

    /// Issues ready to be worked, optionally constrained to a label.
    async fn list_ready(
        &self,
        label: Option<&str>,
        db: Option<&Path>,
    ) -> Result<Vec<Issue>, TrackerError>;

    /// Latest `Phase:` token reported on an issue, chronologically last wins.
    async fn latest_phase(
        &self,
        id: &str,
        db: Option<&Path>,
    ) -> Result<Option<String>, TrackerError> {
        let comments = self.list_comments(id, db).await?;
        Ok(comment::latest_phase(&comments))
    }

    /// True iff the latest phase is `Complete` (case-insensitive).
    async fn has_phase_complete(&self, id: &str, db: Option<&Path>) -> Result<bool, TrackerError> {
        Ok(self
            .latest_phase(id, db)
            .await?
            .is_some_and(|p| comment::phase_complete(&p)))
    }

    /// Latest `investigation_path:` reported on an issue.
    async fn latest_investigation_path(
        &self,
        id: &str,
        db: Option<&Path>,
    ) -> Result<Option<PathBuf>, TrackerError> {
        let comments = self.list_comments(id, db).await?;
        Ok(comment::latest_investigation_path(&comments))
    }

    /// Latest successfully parsed `agent_metadata:` comment.
    async fn latest_agent_metadata(
        &self,
        id: &str,
        db: Option<&Path>,
    ) -> Result<Option<AgentMetadata>, TrackerError> {
        let comments = self.list_comments(id, db).await?;
        Ok(comment::latest_agent_metadata(&comments))
    }

    /// Post agent metadata so the agent can be located from the tracker alone.
    async fn add_agent_metadata(
        &self,
        id: &str,
        meta: &AgentMetadata,
        db: Option<&Path>,
    ) -> Result<(), TrackerError> {
        let json = serde_json::to_string(meta)
            .map_err(|e| TrackerError::Transient(format!("metadata serialization: {e}")))?;
        self.add_comment(id, &format!("agent_metadata: {json}"), db)
            .await
    }
}
