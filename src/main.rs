//! runplot - comparison plots for reinforcement-learning training runs.
//!
//! Loads per-seed metrics, trajectories and env_info files declared in an
//! experiment file, buckets the groups by task, and renders SVG figures
//! comparing the groups of each task.

mod config;
mod dispatch;
mod error;
mod grouper;
mod loader;
mod manifest;
mod plot;
mod table;

use anyhow::{Context, Result};
use clap::Parser;
use config::Experiment;
use dispatch::{dispatch, SvgRenderer};
use manifest::Manifest;
use plot::RobotProfile;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Render comparison figures for RL training runs
#[derive(Parser, Debug)]
#[command(name = "runplot")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Experiment file declaring groups, runs and plot style
    #[arg(short, long, default_value = "experiments.yaml")]
    config: PathBuf,

    /// Output directory for figures (overrides the experiment file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Exit code when a metrics file cannot be loaded
    #[arg(long, default_value = "0")]
    metrics_error_exit_code: i32,

    /// Skip writing manifest.json
    #[arg(long)]
    no_manifest: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --log-level
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(std::io::stdout().is_terminal()))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .init();

    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let experiment = Experiment::load(&args.config)?;
    let base = args
        .config
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let groups = experiment.resolve_groups(&base)?;
    info!(groups = groups.len(), config = %args.config.display(), "Loaded experiment");

    let loaded = match loader::load_all(&groups) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!(path = %e.path().display(), "{}", e);
            std::process::exit(args.metrics_error_exit_code);
        }
    };

    let buckets = grouper::bucket_by_task(loaded, RobotProfile::is_known);

    let output_dir = args.output.clone().unwrap_or_else(|| experiment.output_dir.clone());
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
    eprintln!("Generating plots in: {}", output_dir.display());

    let report = dispatch(&mut SvgRenderer, &buckets, &output_dir, &experiment.plot);

    info!(
        tasks = report.tasks_plotted,
        robot_plots = report.robot_plots,
        robot_plots_skipped = report.robot_plots_skipped,
        failures = report.failures,
        "Plotting finished"
    );
    eprintln!("\nGenerated {} plots:", report.figures.len());
    for path in &report.figures {
        eprintln!("  • {}", path.display());
    }

    if !args.no_manifest {
        let path = Manifest::new(&args.config, &buckets, &report).write(&output_dir)?;
        info!(path = %path.display(), "Wrote manifest");
    }

    if report.failures > 0 {
        anyhow::bail!("{} plot factories failed", report.failures);
    }

    Ok(())
}
