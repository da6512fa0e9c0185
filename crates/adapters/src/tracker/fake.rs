// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory tracker for tests.

use super::{TrackerError, TrackerGateway};
use async_trait::async_trait;
use fm_core::{Comment, Issue, IssueStatus};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// A recorded mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCall {
    UpdateStatus { id: String, status: String },
    AddComment { id: String, text: String },
    CloseIssue { id: String, reason: String },
}

#[derive(Default)]
struct State {
    issues: BTreeMap<String, Issue>,
    comments: BTreeMap<String, Vec<Comment>>,
    calls: Vec<TrackerCall>,
    unavailable: bool,
}

/// In-memory [`TrackerGateway`] with scriptable issues and comments.
#[derive(Clone, Default)]
pub struct FakeTracker {
    state: Arc<Mutex<State>>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an open issue with the given id and title.
    pub fn add_issue(&self, id: &str, title: &str) {
        self.add_issue_with_status(id, title, IssueStatus::Open);
    }

    pub fn add_issue_with_status(&self, id: &str, title: &str, status: IssueStatus) {
        let issue = Issue {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            status,
            priority: 2,
            labels: Vec::new(),
            notes: None,
            issue_type: None,
        };
        self.state.lock().issues.insert(id.to_string(), issue);
    }

    pub fn set_labels(&self, id: &str, labels: &[&str]) {
        if let Some(issue) = self.state.lock().issues.get_mut(id) {
            issue.labels = labels.iter().map(|s| s.to_string()).collect();
        }
    }

    pub fn set_issue_type(&self, id: &str, ty: &str) {
        if let Some(issue) = self.state.lock().issues.get_mut(id) {
            issue.issue_type = Some(ty.to_string());
        }
    }

    /// Append a comment as a worker would.
    pub fn post_comment(&self, id: &str, text: &str) {
        self.state
            .lock()
            .comments
            .entry(id.to_string())
            .or_default()
            .push(Comment::new(text));
    }

    /// Simulate the tracker CLI being absent.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    pub fn issue_status(&self, id: &str) -> Option<IssueStatus> {
        self.state.lock().issues.get(id).map(|i| i.status.clone())
    }

    pub fn calls(&self) -> Vec<TrackerCall> {
        self.state.lock().calls.clone()
    }

    pub fn comments_of(&self, id: &str) -> Vec<Comment> {
        self.state
            .lock()
            .comments
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), TrackerError> {
        if self.state.lock().unavailable {
            Err(TrackerError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TrackerGateway for FakeTracker {
    async fn get_issue(&self, id: &str, _db: Option<&Path>) -> Result<Issue, TrackerError> {
        self.check_available()?;
        self.state
            .lock()
            .issues
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::IssueNotFound(id.to_string()))
    }

    async fn update_status(
        &self,
        id: &str,
        status: &str,
        _db: Option<&Path>,
    ) -> Result<(), TrackerError> {
        self.check_available()?;
        let mut state = self.state.lock();
        let issue = state
            .issues
            .get_mut(id)
            .ok_or_else(|| TrackerError::IssueNotFound(id.to_string()))?;
        issue.status = IssueStatus::from(status);
        state.calls.push(TrackerCall::UpdateStatus {
            id: id.to_string(),
            status: status.to_string(),
        });
        Ok(())
    }

    async fn add_comment(
        &self,
        id: &str,
        text: &str,
        _db: Option<&Path>,
    ) -> Result<(), TrackerError> {
        self.check_available()?;
        let mut state = self.state.lock();
        if !state.issues.contains_key(id) {
            return Err(TrackerError::IssueNotFound(id.to_string()));
        }
        state
            .comments
            .entry(id.to_string())
            .or_default()
            .push(Comment::new(text));
        state.calls.push(TrackerCall::AddComment {
            id: id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn list_comments(
        &self,
        id: &str,
        _db: Option<&Path>,
    ) -> Result<Vec<Comment>, TrackerError> {
        self.check_available()?;
        let state = self.state.lock();
        if !state.issues.contains_key(id) {
            return Err(TrackerError::IssueNotFound(id.to_string()));
        }
        Ok(state.comments.get(id).cloned().unwrap_or_default())
    }

    async fn close_issue(
        &self,
        id: &str,
        reason: &str,
        _db: Option<&Path>,
    ) -> Result<(), TrackerError> {
        self.check_available()?;
        let mut state = self.state.lock();
        let issue = state
            .issues
            .get_mut(id)
            .ok_or_else(|| TrackerError::IssueNotFound(id.to_string()))?;
        issue.status = IssueStatus::Closed;
        state.calls.push(TrackerCall::CloseIssue {
            id: id.to_string(),
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn list_ready(
        &self,
        label: Option<&str>,
        _db: Option<&Path>,
    ) -> Result<Vec<Issue>, TrackerError> {
        self.check_available()?;
        let state = self.state.lock();
        Ok(state
            .issues
            .values()
            .filter(|i| i.status == IssueStatus::Open)
            .filter(|i| match label {
                Some(label) => i.labels.iter().any(|l| l == label),
                None => true,
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
