//! The per-job state machine driving one run end to end.
//!
//! For each job in registry order: list the remote directory, select the
//! newest artifact, fetch it (skipping transfers already made this run),
//! read it, classify it. Every recoverable failure is caught at the per-job
//! boundary and recorded as an explicit outcome — one bad directory must
//! never abort the batch, and no job is ever silently dropped.
//!
//! The tracker is merged exactly once, after every job has resolved, so
//! partial results never become visible to the persisted table.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::channel::{ChannelError, RemoteChannel, SftpChannel, join_remote};
use crate::classify::{Classification, PatternSet, classify};
use crate::config::Config;
use crate::error::RunError;
use crate::select;
use crate::session::RunSession;
use crate::tracker::Tracker;

/// Why one job failed to produce a classification this run.
#[derive(Debug, Error)]
pub enum FailureReason {
    #[error("remote directory is empty")]
    NoArtifactFound,

    #[error("remote directory not found")]
    PathNotFound,

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("cannot read downloaded artifact: {0}")]
    Read(String),
}

impl From<ChannelError> for FailureReason {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::PathNotFound { .. } => FailureReason::PathNotFound,
            ChannelError::Io { message, .. } => FailureReason::Fetch(message),
        }
    }
}

/// Outcome of one run across all jobs.
#[derive(Debug)]
pub struct RunSummary {
    pub run_date: String,
    /// Jobs that resolved to a classification from artifact content.
    pub recorded: usize,
    /// Jobs that failed at some stage, in processing order.
    pub failed: Vec<(String, FailureReason)>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.recorded + self.failed.len()
    }
}

/// Execute one complete run against the configured remote host.
///
/// Loads the tracker, opens the single SFTP session for the run, drives the
/// pipeline, and writes the tracker back atomically. Fatal errors
/// (configuration, connect/auth, tracker I/O) abort with nothing written;
/// per-job failures are reported in the returned summary.
pub fn execute_run(config: &Config, run_date: Option<String>) -> Result<RunSummary, RunError> {
    let mut tracker = Tracker::load(&config.tracker_path)?;
    let mut session = match run_date {
        Some(date) => RunSession::new(&config.download_dir, date)?,
        None => RunSession::for_today(&config.download_dir)?,
    };
    let mut channel = SftpChannel::connect(&config.channel)?;

    let summary = run_pipeline(&mut channel, &mut tracker, &mut session, &config.patterns);
    tracker.save(&config.tracker_path)?;
    Ok(summary)
}

/// Drive one run: exactly one classification per registered job, merged into
/// the tracker under the session's run date.
///
/// Failed jobs are recorded as `unresolved` for the date — an explicit
/// marker, never a blank cell — and listed in the returned summary.
pub fn run_pipeline(
    channel: &mut dyn RemoteChannel,
    tracker: &mut Tracker,
    session: &mut RunSession,
    patterns: &PatternSet,
) -> RunSummary {
    let mut classifications: BTreeMap<String, Classification> = BTreeMap::new();
    let mut recorded = 0usize;
    let mut failed = Vec::new();

    for job_dir in tracker.job_dirs() {
        match process_job(channel, session, patterns, &job_dir) {
            Ok(classification) => {
                tracing::info!("{job_dir}: {classification}");
                classifications.insert(job_dir, classification);
                recorded += 1;
            }
            Err(reason) => {
                tracing::warn!("{job_dir}: {reason}");
                classifications.insert(job_dir.clone(), Classification::Unresolved);
                failed.push((job_dir, reason));
            }
        }
    }

    let run_date = session.run_date().to_string();
    tracker.merge(&run_date, &classifications);

    RunSummary {
        run_date,
        recorded,
        failed,
    }
}

/// One job through the state machine:
/// listed -> selected -> downloaded -> classified.
fn process_job(
    channel: &mut dyn RemoteChannel,
    session: &mut RunSession,
    patterns: &PatternSet,
    job_dir: &str,
) -> Result<Classification, FailureReason> {
    let listing = channel.list_dir(job_dir)?;
    let artifact = select::latest(&listing)
        .ok_or(FailureReason::NoArtifactFound)?
        .clone();
    tracing::debug!("{job_dir}: latest artifact {artifact}");

    let remote_path = join_remote(job_dir, &artifact);
    let local_path = session.local_path(&artifact);
    if session.already_fetched(&remote_path) {
        tracing::debug!("skipping duplicate transfer of {remote_path}");
    } else {
        channel.fetch(&remote_path, &local_path)?;
        session.mark_fetched(remote_path);
    }

    // Logs are not guaranteed clean UTF-8; decode lossily rather than fail.
    let bytes = std::fs::read(&local_path).map_err(|e| FailureReason::Read(e.to_string()))?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(classify(&content, patterns))
}
