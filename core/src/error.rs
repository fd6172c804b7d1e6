//! Fatal error taxonomy for a run.
//!
//! Fatal errors bubble unhandled to the CLI and terminate the run with a
//! non-zero exit; no partial tracker write happens on a fatal path.
//! Recoverable, per-job failures never appear here — they are values
//! ([`crate::pipeline::FailureReason`]) inspected by the pipeline and
//! reflected as explicit tracker entries.

use thiserror::Error;

use crate::channel::ConnectError;
use crate::config::ConfigError;
use crate::tracker::TrackerError;

/// Errors that abort an entire run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("cannot prepare staging directory: {0}")]
    Staging(#[from] std::io::Error),
}
