// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

macro_rules! skip_without_git {
    () => {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }
    };
}

fn sh(dir: &Path, cmd: &str) {
    let status = std::process::Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "command failed: {cmd}");
}

fn init_repo(dir: &Path) {
    sh(dir, "git init -q -b main .");
    sh(dir, "git config user.email t@t && git config user.name t");
    sh(dir, "echo hello > a.txt && git add . && git commit -q -m 'initial commit'");
}

#[test]
fn porcelain_path_extraction() {
    assert_eq!(porcelain_path(" M src/main.rs"), Some("src/main.rs"));
    assert_eq!(porcelain_path("?? .orch/"), Some(".orch/"));
    assert_eq!(porcelain_path("M  file.py"), Some("file.py"));
    assert_eq!(porcelain_path(""), None);
}

#[test]
fn filter_excluded_drops_matching_lines() {
    let lines = vec![
        " M src/main.rs".to_string(),
        "?? .beads/".to_string(),
        " M .beads/db.json".to_string(),
    ];
    let kept = filter_excluded(&lines, &[".beads/"]);
    assert_eq!(kept, vec![" M src/main.rs"]);
}

#[test]
fn filter_excluded_directory_prefix_both_ways() {
    // An excluded file inside a changed untracked directory
    let lines = vec!["?? .orch/".to_string()];
    assert!(filter_excluded(&lines, &[".orch/ROADMAP.md"]).is_empty());
    // Nothing excluded leaves everything
    let kept = filter_excluded(&lines, &[]);
    assert_eq!(kept.len(), 1);
}

#[tokio::test]
async fn git_cli_repo_facts() {
    skip_without_git!();
    let dir = tempfile::tempdir().unwrap();
    let git = GitCli::new();

    assert!(!git.is_repo(dir.path()).await);
    init_repo(dir.path());
    assert!(git.is_repo(dir.path()).await);
    assert_eq!(git.current_branch(dir.path()).await.unwrap(), "main");
    assert!(git.status_porcelain(dir.path()).await.unwrap().is_empty());

    sh(dir.path(), "echo dirty > b.txt");
    let status = git.status_porcelain(dir.path()).await.unwrap();
    assert_eq!(status, vec!["?? b.txt"]);
}

#[tokio::test]
async fn git_cli_commit_grep() {
    skip_without_git!();
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    let git = GitCli::new();

    assert!(!git
        .has_commit_mentioning(dir.path(), "fix-retry")
        .await
        .unwrap());
    sh(
        dir.path(),
        "echo x > c.txt && git add . && git commit -q -m 'fix-retry: handle timeouts'",
    );
    assert!(git
        .has_commit_mentioning(dir.path(), "fix-retry")
        .await
        .unwrap());
}

#[tokio::test]
async fn git_cli_no_upstream_reports_none() {
    skip_without_git!();
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    let git = GitCli::new();
    assert_eq!(git.unpushed_count(dir.path(), "main").await.unwrap(), None);
}

#[tokio::test]
async fn git_cli_pull_tolerates_local_only_repo() {
    skip_without_git!();
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    let git = GitCli::new();
    // No origin configured: pull must still succeed
    git.pull(dir.path(), "main").await.unwrap();
}

#[tokio::test]
async fn fake_vcs_scripts() {
    let vcs = FakeVcs::clean_main();
    let dir = Path::new("/proj");
    assert!(vcs.is_repo(dir).await);
    assert_eq!(vcs.current_branch(dir).await.unwrap(), "main");

    vcs.set_dirty(&[" M src/lib.rs"]);
    assert_eq!(vcs.status_porcelain(dir).await.unwrap().len(), 1);

    vcs.add_commit_message("fix-retry: done");
    assert!(vcs.has_commit_mentioning(dir, "fix-retry").await.unwrap());
    assert!(!vcs.has_commit_mentioning(dir, "other").await.unwrap());

    vcs.pull(dir, "main").await.unwrap();
    assert_eq!(vcs.pulled_branches(), vec!["main"]);
}
