//! DeepFence - staged agent pipeline CLI
//!
//! Runs the full pipeline over a target path: syncs every agent repository,
//! archives the previous run's outputs, then executes mappers, organizers,
//! and the reporter in order, collecting their artifacts into `outputs/`.
//!
//! Exit status is 1 when the target parameter is missing or the roster
//! config is unreadable, and 0 otherwise; individual agent failures are
//! reported on the console and in the logs, not via the exit code.

mod console;

use anyhow::{Context, Result};
use clap::Parser;
use console::ConsoleObserver;
use deepfence_core::{init_tracing, Pipeline, PipelineConfig, Roster};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "deepfence")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run the DeepFence analysis agent pipeline over a target path", long_about = None)]
struct Cli {
    /// Target path handed to every mapper agent
    target: Option<PathBuf>,

    /// Agent roster config file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Directory holding agents/, outputs/, and archive/
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Maximum concurrent repository syncs
    #[arg(short, long, default_value_t = deepfence_core::pipeline::DEFAULT_SYNC_CONCURRENCY)]
    jobs: usize,

    /// Do not open the final report in a viewer
    #[arg(long)]
    no_open: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    // Missing target: usage and exit 1, before touching the filesystem.
    let Some(target) = cli.target else {
        eprintln!("Usage: deepfence [OPTIONS] <TARGET>");
        eprintln!("Try 'deepfence --help' for more information.");
        std::process::exit(1);
    };

    console::start_banner();

    let target = std::path::absolute(&target)
        .with_context(|| format!("Failed to resolve target path {:?}", target))?;

    console::config_banner();
    let roster = Roster::load(&cli.config)?;
    println!(
        "  {} mapper(s), {} organizer(s), reporter: {}",
        roster.mapper_agents.len(),
        roster.organizer_agents.len(),
        roster
            .reporter_agent
            .as_ref()
            .map(|r| r.name.as_str())
            .unwrap_or("none")
    );

    let mut config = PipelineConfig::new(cli.base_dir, target);
    config.sync_concurrency = cli.jobs;
    config.open_report = !cli.no_open;

    let result = Pipeline::run(&config, &roster, &ConsoleObserver).await?;

    println!(
        "\n{} agent(s) succeeded, {} failed, {} ms",
        result.succeeded_count(),
        result.failed_count(),
        result.duration_ms
    );

    // Per-agent failures are deliberately not reflected in the exit status;
    // consumers read the output tree, not the process result.
    Ok(())
}
