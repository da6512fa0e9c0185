// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use std::sync::atomic::{AtomicU64, Ordering};

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

fn unique_name(suffix: &str) -> String {
    let id = SESSION_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("fm-test-{}-{}-{}", std::process::id(), suffix, id)
}

/// Check if tmux is available on this system
fn tmux_available() -> bool {
    std::process::Command::new("tmux")
        .arg("-V")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

macro_rules! skip_without_tmux {
    () => {
        if !tmux_available() {
            eprintln!("tmux not available, skipping");
            return;
        }
    };
}

async fn kill_session(name: &str) {
    let _ = tokio::process::Command::new("tmux")
        .args(["kill-session", "-t", name])
        .output()
        .await;
}

#[tokio::test]
#[serial(tmux)]
async fn session_lifecycle() {
    skip_without_tmux!();
    let tmux = TmuxWindows::new();
    let name = unique_name("lifecycle");

    assert!(!tmux.session_exists(&name).await.unwrap());
    tmux.new_session(&name, std::path::Path::new("/tmp"))
        .await
        .unwrap();
    assert!(tmux.session_exists(&name).await.unwrap());

    let sessions = tmux.list_sessions().await.unwrap();
    assert!(sessions.contains(&name));

    // First window is the pinned servers window
    let windows = tmux.list_windows(&name).await.unwrap();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].name, "servers");

    kill_session(&name).await;
}

#[tokio::test]
#[serial(tmux)]
async fn new_session_rejects_missing_cwd() {
    skip_without_tmux!();
    let tmux = TmuxWindows::new();
    let err = tmux
        .new_session(
            &unique_name("badcwd"),
            std::path::Path::new("/nonexistent/dir"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::SpawnFailed(_)));
}

#[tokio::test]
#[serial(tmux)]
async fn window_create_capture_kill() {
    skip_without_tmux!();
    let tmux = TmuxWindows::new();
    let name = unique_name("windows");
    tmux.new_session(&name, std::path::Path::new("/tmp"))
        .await
        .unwrap();

    let env = vec![("FM_TEST_MARKER".to_string(), "1".to_string())];
    let id = tmux
        .new_window(&name, "worker-a", std::path::Path::new("/tmp"), &env)
        .await
        .unwrap();
    assert!(id.starts_with('@'), "unexpected window id {id}");

    assert_eq!(tmux.session_of_window(&id).await.unwrap(), name);

    let windows = tmux.list_windows(&name).await.unwrap();
    eprintln!("DEBUG id={id:?} windows={windows:?}");
    assert!(windows.iter().any(|w| w.id == id && w.name == "worker-a"));

    tmux.send_literal(&id, "echo fm-$((40+2))").await.unwrap();
    tmux.send_key(&id, "Enter").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    let captured = tmux.capture_output(&id, 50).await.unwrap();
    assert!(captured.contains("fm-42"), "capture was: {captured}");

    tmux.kill_window(&id).await.unwrap();
    let windows = tmux.list_windows(&name).await.unwrap();
    assert!(!windows.iter().any(|w| w.id == id));

    kill_session(&name).await;
}

#[tokio::test]
#[serial(tmux)]
async fn list_sessions_without_server_is_empty_or_lists() {
    skip_without_tmux!();
    // Whatever the server state, this must not error.
    let tmux = TmuxWindows::new();
    tmux.list_sessions().await.unwrap();
}

#[tokio::test]
#[serial(tmux)]
async fn capture_on_unknown_window_is_not_found() {
    skip_without_tmux!();
    let tmux = TmuxWindows::new();
    let err = tmux.capture_output("@999999", 10).await.unwrap_err();
    assert!(matches!(err, SessionError::WindowNotFound(_)));
}
