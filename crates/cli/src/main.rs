// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fm - Foreman CLI
//!
//! Thin shell over fm-engine: argument parsing, adapter wiring, and human
//! presentation. All lifecycle logic lives in the engine.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fm",
    version,
    about = "Foreman - supervised AI coding agents in tmux windows"
)]
struct Cli {
    /// Change to <dir> before doing anything
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Project short name (defaults to the directory name)
    #[arg(long, global = true)]
    project: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spawn an agent for an ad-hoc task
    Spawn(commands::SpawnArgs),
    /// Spawn an agent for a tracker issue
    Work(commands::WorkArgs),
    /// Verify an agent's work and reap it
    Complete(commands::CompleteArgs),
    /// Mark an agent abandoned and dispose of its window
    Abandon {
        /// Agent id (or primary issue id)
        agent: String,
        /// Reap even if processes survive the shutdown cascade
        #[arg(long)]
        force: bool,
    },
    /// List agents from the registry
    Status {
        /// Include completed, abandoned, and failed agents
        #[arg(long)]
        all: bool,
    },
    /// Align the registry with observed tmux window state
    Reconcile,
    /// Poll the tracker and spawn agents autonomously
    Daemon(commands::DaemonArgs),
    /// Show recent entries from the error log
    Errors {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("FM_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let project_dir = match &cli.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let project = match &cli.project {
        Some(p) => p.clone(),
        None => project_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string()),
    };
    let ctx = commands::CliContext::new(project, project_dir);

    match cli.command {
        Commands::Spawn(args) => ctx.spawn(args).await,
        Commands::Work(args) => ctx.work(args).await,
        Commands::Complete(args) => ctx.complete(args).await,
        Commands::Abandon { agent, force } => ctx.abandon(&agent, force).await,
        Commands::Status { all } => ctx.status(all),
        Commands::Reconcile => ctx.reconcile().await,
        Commands::Daemon(args) => ctx.daemon(args).await,
        Commands::Errors { limit } => ctx.errors(limit),
    }
}
