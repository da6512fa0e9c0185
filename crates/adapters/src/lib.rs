// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fm-adapters: typed boundaries to the outside world
//!
//! Three seams: the terminal multiplexer (tmux windows inside per-project
//! sessions), the issue tracker (the `bd` CLI), and version control (git).
//! Each is a trait with a real subprocess-backed implementation and a
//! scriptable fake behind the `test-support` feature.

pub mod session;
pub mod tracker;
pub mod vcs;

pub use session::{SessionError, TmuxWindows, WindowInfo, WindowManager};
pub use tracker::{BeadsCli, TrackerError, TrackerGateway};
pub use vcs::{GitCli, GitError, Vcs};

#[cfg(any(test, feature = "test-support"))]
pub use session::FakeWindows;
#[cfg(any(test, feature = "test-support"))]
pub use tracker::FakeTracker;
#[cfg(any(test, feature = "test-support"))]
pub use vcs::FakeVcs;
