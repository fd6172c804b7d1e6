//! `logtrack` entry point.
//!
//! Thin clap front-end over `logtrack-core`:
//!
//! - `logtrack run`      — fetch, classify, and merge one run
//! - `logtrack show`     — print the tracker table
//! - `logtrack gen-logs` — generate synthetic log fixtures for demos

mod gen_cmd;

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use logtrack_core::config::{Config, DEFAULT_TRACKER_PATH, ENV_TRACKER_PATH};
use logtrack_core::pipeline::execute_run;
use logtrack_core::tracker::Tracker;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "logtrack", about = "Remote batch-log retrieval and tracking")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the pipeline: list, fetch, classify, and merge into the tracker.
    Run(RunArgs),
    /// Print the tracker table, most recent run date first.
    Show(ShowArgs),
    /// Generate a synthetic tree of convention-named log files.
    GenLogs(gen_cmd::GenLogsArgs),
}

#[derive(Debug, Parser)]
struct RunArgs {
    /// Override the remote hostname.
    #[arg(long)]
    host: Option<String>,

    /// Override the remote port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the remote username.
    #[arg(long)]
    user: Option<String>,

    /// Override the tracker file path.
    #[arg(long)]
    tracker: Option<PathBuf>,

    /// Override the local download directory.
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Run date as YYYYMMDD (defaults to today). Re-running a date
    /// overwrites that date's column in place.
    #[arg(long)]
    date: Option<String>,
}

#[derive(Debug, Parser)]
struct ShowArgs {
    /// Tracker file path.
    #[arg(long, env = ENV_TRACKER_PATH, default_value = DEFAULT_TRACKER_PATH)]
    tracker: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args),
        Command::Show(args) => show(args),
        Command::GenLogs(args) => gen_cmd::run(args),
    }
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    // Config is validated before any network activity; missing required
    // settings abort here with every missing name listed.
    let mut config = Config::from_env()?;
    if let Some(host) = args.host {
        config.channel.hostname = host;
    }
    if let Some(port) = args.port {
        config.channel.port = port;
    }
    if let Some(user) = args.user {
        config.channel.username = user;
    }
    if let Some(tracker) = args.tracker {
        config.tracker_path = tracker;
    }
    if let Some(dir) = args.download_dir {
        config.download_dir = dir;
    }

    if let Some(date) = &args.date
        && (date.len() != 8 || !date.chars().all(|c| c.is_ascii_digit()))
    {
        bail!("--date must be YYYYMMDD, got '{date}'");
    }

    // Fatal errors (connect, auth, tracker I/O) abort with nothing written.
    let summary = execute_run(&config, args.date).context("run aborted")?;

    println!(
        "run {}: {} of {} jobs classified, {} failed",
        summary.run_date,
        summary.recorded,
        summary.total(),
        summary.failed.len()
    );
    for (job_dir, reason) in &summary.failed {
        println!("  failed: {job_dir}: {reason}");
    }
    Ok(())
}

fn show(args: ShowArgs) -> anyhow::Result<()> {
    let tracker = Tracker::load(&args.tracker)?;
    print!("{}", tracker.render());
    Ok(())
}
