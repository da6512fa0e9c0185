// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rolling JSONL error log.
//!
//! Every non-planning failure is appended here before it propagates to the
//! caller; the log is part of the error contract, not a debug aid. One JSON
//! object per line, newest last, bounded entry count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_MAX_ENTRIES: usize = 500;

#[derive(Debug, Error)]
pub enum ErrorLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One logged failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub timestamp: DateTime<Utc>,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcommand: Option<String>,
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl ErrorEntry {
    pub fn new(command: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            command: command.into(),
            subcommand: None,
            kind: kind.into(),
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    pub fn subcommand(mut self, sub: impl Into<String>) -> Self {
        self.subcommand = Some(sub.into());
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Append-mostly JSONL log with rotation at `max_entries`.
pub struct ErrorLog {
    path: PathBuf,
    max_entries: usize,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry, rotating the file down to the newest `max_entries`
    /// when it grows past the bound.
    pub fn append(&self, entry: &ErrorEntry) -> Result<(), ErrorLogError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;

        let count = fs::read_to_string(&self.path)?
            .lines()
            .filter(|l| !l.trim().is_empty())
            .count();
        if count > self.max_entries {
            self.rotate()?;
        }
        Ok(())
    }

    /// The newest `n` entries, oldest of them first.
    pub fn recent(&self, n: usize) -> Result<Vec<ErrorEntry>, ErrorLogError> {
        let entries = self.read_all()?;
        let skip = entries.len().saturating_sub(n);
        Ok(entries.into_iter().skip(skip).collect())
    }

    fn read_all(&self) -> Result<Vec<ErrorEntry>, ErrorLogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for line in fs::read_to_string(&self.path)?.lines() {
            if line.trim().is_empty() {
                continue;
            }
            // Skip torn lines instead of failing the whole read
            if let Ok(entry) = serde_json::from_str(line) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    fn rotate(&self) -> Result<(), ErrorLogError> {
        let entries = self.read_all()?;
        let skip = entries.len().saturating_sub(self.max_entries);
        let mut out = String::new();
        for entry in entries.iter().skip(skip) {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, out)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "error_log_tests.rs"]
mod tests;
