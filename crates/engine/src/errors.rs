// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure logging.
//!
//! Every non-planning failure is appended to the rolling JSONL error log
//! before it propagates; the log is part of the error contract. Planning
//! failures are user-correctable and stay out of it.

use crate::config::Config;
use fm_storage::{ErrorEntry, ErrorLog};

/// Append a failure to the error log. Logging failures are swallowed (the
/// original error is what matters) but traced.
pub fn log_failure(
    cfg: &Config,
    command: &str,
    subcommand: Option<&str>,
    kind: &str,
    error: &dyn std::fmt::Display,
    context: &[(&str, &str)],
) {
    let mut entry = ErrorEntry::new(command, kind, error.to_string());
    if let Some(sub) = subcommand {
        entry = entry.subcommand(sub);
    }
    for (key, value) in context {
        entry = entry.context(*key, *value);
    }
    if let Err(e) = ErrorLog::new(cfg.error_log_path()).append(&entry) {
        tracing::warn!(error = %e, "could not append to error log");
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
