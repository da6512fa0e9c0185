// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command implementations: wire real adapters into the engine and print
//! results. Non-planning failures are appended to the error log before they
//! surface (spawn rejections are user-correctable and stay out of it).

use anyhow::{bail, Context as _, Result};
use clap::Args;
use fm_adapters::{BeadsCli, GitCli, TmuxWindows};
use fm_core::AgentStatus;
use fm_engine::errors::log_failure;
use fm_engine::planner::{ImplMode, SpawnRequest};
use fm_engine::reap::{ReapOptions, ReapReport};
use fm_engine::spawn::{SpawnFlowError, SpawnOutcome};
use fm_engine::{CompleteOptions, Config, DaemonOptions};
use fm_storage::{ErrorLog, Registry};
use std::path::PathBuf;

#[derive(Args)]
pub struct SpawnArgs {
    /// Task description
    pub task: String,
    /// Skill to attach
    #[arg(long)]
    pub skill: Option<String>,
    /// Tracker issues to link (first is primary); repeatable
    #[arg(long = "issue")]
    pub issues: Vec<String>,
    /// Comma-separated phase list for feature-style skills
    #[arg(long)]
    pub phases: Option<String>,
    /// Implementation mode: tdd or direct
    #[arg(long, default_value = "tdd")]
    pub mode: String,
    /// Validation mode for feature-style skills
    #[arg(long)]
    pub validation: Option<String>,
    /// Investigation type for investigation skills
    #[arg(long)]
    pub investigation_type: Option<String>,
    /// Human-attended session
    #[arg(long)]
    pub interactive: bool,
    /// Spawn even when a linked issue is closed
    #[arg(long)]
    pub allow_closed: bool,
    /// Skip the git branch/clean-tree preconditions
    #[arg(long)]
    pub skip_git_check: bool,
    /// Alternative tracker database path
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Args)]
pub struct WorkArgs {
    /// Tracker issue to work on
    pub issue: String,
    /// Skill to attach
    #[arg(long)]
    pub skill: Option<String>,
    /// Alternative tracker database path
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompleteArgs {
    /// Agent id (or primary issue id)
    pub agent: String,
    /// Show what would happen without executing
    #[arg(long)]
    pub dry_run: bool,
    /// Trust commits over reported phase; reap stuck processes
    #[arg(long)]
    pub force: bool,
    /// Skip the test-results gate
    #[arg(long)]
    pub skip_tests: bool,
    /// Skip the pushed-state gate (local-only repositories)
    #[arg(long)]
    pub skip_push_check: bool,
}

#[derive(Args)]
pub struct DaemonArgs {
    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
    /// Poll interval in seconds
    #[arg(long)]
    pub interval: Option<u64>,
    /// Maximum concurrent active agents
    #[arg(long)]
    pub max_agents: Option<usize>,
    /// Required label on ready issues
    #[arg(long)]
    pub label: Option<String>,
    /// Print what would be spawned without spawning
    #[arg(long)]
    pub dry_run: bool,
}

/// Shared wiring for every command.
pub struct CliContext {
    cfg: Config,
    project: String,
    project_dir: PathBuf,
    windows: TmuxWindows,
    tracker: BeadsCli,
    vcs: GitCli,
}

impl CliContext {
    pub fn new(project: String, project_dir: PathBuf) -> Self {
        Self {
            cfg: Config::load(),
            project,
            project_dir,
            windows: TmuxWindows::new(),
            tracker: BeadsCli::new(),
            vcs: GitCli::new(),
        }
    }

    fn registry(&self) -> Registry {
        Registry::open(self.cfg.registry_path())
    }

    pub async fn spawn(&self, args: SpawnArgs) -> Result<()> {
        let mut req = SpawnRequest::new(&args.task, &self.project, &self.project_dir);
        req.skill = args.skill;
        req.issues = args.issues;
        req.phases = args
            .phases
            .map(|p| p.split(',').map(|s| s.trim().to_string()).collect());
        req.mode = args
            .mode
            .parse::<ImplMode>()
            .map_err(|e| anyhow::anyhow!(e))?;
        req.validation = args.validation;
        req.investigation_type = args.investigation_type;
        req.interactive = args.interactive;
        req.allow_closed = args.allow_closed;
        req.skip_git_check = args.skip_git_check;
        req.db_path = args.db;

        self.run_spawn(&req).await
    }

    pub async fn work(&self, args: WorkArgs) -> Result<()> {
        let mut req = SpawnRequest::new("", &self.project, &self.project_dir);
        req.issues = vec![args.issue];
        req.skill = args.skill;
        req.db_path = args.db;
        self.run_spawn(&req).await
    }

    async fn run_spawn(&self, req: &SpawnRequest) -> Result<()> {
        let mut registry = self.registry();
        let result = fm_engine::spawn_agent(
            &self.cfg,
            &self.windows,
            &self.tracker,
            &self.vcs,
            &mut registry,
            req,
        )
        .await;

        match result {
            Ok(SpawnOutcome { agent, quality }) => {
                println!("spawned {} in window {}", agent.id, agent.window);
                for issue in agent.linked_issues() {
                    println!("  tracking {issue}");
                }
                for warning in &quality.warnings {
                    eprintln!("  context {}: {}", warning.severity, warning.message);
                }
                Ok(())
            }
            // Planning failures are user-correctable and not logged
            Err(SpawnFlowError::Plan(e)) => bail!("{e}"),
            Err(e) => {
                let kind = match &e {
                    SpawnFlowError::Spawn(_) => "SpawnFailed",
                    SpawnFlowError::Registry(_) => "RegistryConflict",
                    SpawnFlowError::Tracker(_) => "TrackerError",
                    SpawnFlowError::Plan(_) => "PlanRejected",
                };
                log_failure(
                    &self.cfg,
                    "spawn",
                    None,
                    kind,
                    &e,
                    &[("project", &self.project)],
                );
                Err(e).context("spawn failed; check `fm errors` and rerun")
            }
        }
    }

    pub async fn complete(&self, args: CompleteArgs) -> Result<()> {
        let mut registry = self.registry();
        let opts = CompleteOptions {
            dry_run: args.dry_run,
            force: args.force,
            skip_test_check: args.skip_tests,
            skip_push_check: args.skip_push_check,
        };
        let outcome = fm_engine::complete_agent(
            &self.cfg,
            &self.windows,
            &self.tracker,
            &self.vcs,
            &mut registry,
            &args.agent,
            opts,
        )
        .await
        .map_err(|e| {
            let kind = match &e {
                fm_engine::CompleteError::Tracker(_) => "TrackerError",
                fm_engine::CompleteError::Reap(_) => "ReapStuck",
            };
            log_failure(&self.cfg, "complete", None, kind, &e, &[("agent", &args.agent)]);
            anyhow::anyhow!("{e}")
        })?;

        if !outcome.verification.passed {
            for error in &outcome.verification.errors {
                eprintln!("✗ {error}");
            }
            bail!("verification failed for '{}'", args.agent);
        }
        for warning in &outcome.verification.warnings {
            eprintln!("⚠ {warning}");
        }
        match outcome.reap {
            Some(report) => print_reap(&args.agent, &report),
            None => println!("dry-run: '{}' would complete", args.agent),
        }
        Ok(())
    }

    pub async fn abandon(&self, agent: &str, force: bool) -> Result<()> {
        let mut registry = self.registry();
        let opts = ReapOptions {
            force,
            close_issues: false,
            target_status: AgentStatus::Abandoned,
            ..Default::default()
        };
        let report =
            fm_engine::reap(&self.cfg, &self.windows, &self.tracker, &mut registry, agent, opts)
                .await
                .map_err(|e| {
                    log_failure(&self.cfg, "abandon", None, "ReapStuck", &e, &[("agent", agent)]);
                    anyhow::anyhow!("{e}")
                })?;
        print_reap(agent, &report);
        Ok(())
    }

    pub fn status(&self, all: bool) -> Result<()> {
        let registry = self.registry();
        let agents: Vec<_> = if all {
            registry.list_all().iter().collect()
        } else {
            registry.list_active()
        };
        if agents.is_empty() {
            println!("no agents");
            return Ok(());
        }
        for agent in agents {
            let issues = agent.linked_issues().join(",");
            println!(
                "{:<10} {:<40} {:<24} {}",
                agent.status.to_string(),
                agent.id,
                agent.window,
                if issues.is_empty() { "-" } else { &issues }
            );
        }
        Ok(())
    }

    pub async fn reconcile(&self) -> Result<()> {
        let mut registry = self.registry();
        let report = fm_engine::reconcile(&self.windows, &mut registry)
            .await
            .map_err(|e| {
                log_failure(&self.cfg, "reconcile", None, "RegistryConflict", &e, &[]);
                anyhow::anyhow!("{e}")
            })?;
        println!(
            "observed {} windows: {} completed, {} abandoned, {} orphan windows",
            report.windows_observed,
            report.completed.len(),
            report.abandoned.len(),
            report.orphan_windows.len()
        );
        Ok(())
    }

    pub async fn daemon(&self, args: DaemonArgs) -> Result<()> {
        let mut cfg = self.cfg.clone();
        if let Some(interval) = args.interval {
            cfg.poll_interval = std::time::Duration::from_secs(interval);
        }
        if let Some(max) = args.max_agents {
            cfg.max_concurrent_agents = max;
        }
        if let Some(label) = args.label {
            cfg.required_label = label;
        }
        let opts = DaemonOptions {
            project: self.project.clone(),
            project_dir: self.project_dir.clone(),
            dry_run: args.dry_run,
        };
        if args.once {
            let mut registry = self.registry();
            let stats = fm_engine::run_cycle(
                &cfg,
                &self.windows,
                &self.tracker,
                &self.vcs,
                &mut registry,
                &opts,
            )
            .await;
            println!(
                "found {} ready, spawned {}, skipped {} at limit, {} failures",
                stats.issues_found, stats.spawned, stats.skipped_at_limit, stats.failures
            );
            return Ok(());
        }
        fm_engine::daemon::run(
            &cfg,
            &self.windows,
            &self.tracker,
            &self.vcs,
            &cfg.registry_path(),
            &opts,
        )
        .await;
        Ok(())
    }

    pub fn errors(&self, limit: usize) -> Result<()> {
        let entries = ErrorLog::new(self.cfg.error_log_path()).recent(limit)?;
        if entries.is_empty() {
            println!("no logged errors");
            return Ok(());
        }
        for entry in entries {
            println!(
                "{} [{}] {}: {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.kind,
                entry.command,
                entry.message
            );
        }
        Ok(())
    }
}

fn print_reap(agent: &str, report: &ReapReport) {
    println!("{agent}: {}", report.status);
    for issue in &report.issues_closed {
        println!("  closed {issue}");
    }
    if report.workspace_cleaned {
        println!("  workspace removed");
    }
    for warning in &report.warnings {
        eprintln!("  ⚠ {warning}");
    }
}
