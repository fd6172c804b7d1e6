//! Remote batch-log retrieval, classification, and history tracking.
//!
//! The pipeline walks every job registered in the [`tracker::Tracker`],
//! fetches the newest log artifact from the job's remote directory over one
//! shared SFTP session, classifies the content against configured pattern
//! sets, and merges the outcome into the tracker under the current run date.
//!
//! ## Module map
//!
//! - [`config`] — typed, env-sourced configuration, validated up front
//! - [`channel`] — the remote listing/fetch contract and its SFTP adapter
//! - [`select`] — newest-artifact selection from a directory listing
//! - [`session`] — per-run state: staging directory and download dedup
//! - [`classify`] — pattern-set classification of artifact content
//! - [`tracker`] — the persisted wide table of jobs and per-date results
//! - [`pipeline`] — the per-job state machine driving one run end to end

pub mod channel;
pub mod classify;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod select;
pub mod session;
pub mod tracker;

pub use classify::{Classification, PatternSet, classify};
pub use config::{ChannelConfig, Config, ConfigError};
pub use error::RunError;
pub use pipeline::{FailureReason, RunSummary, execute_run, run_pipeline};
pub use session::RunSession;
pub use tracker::{JobRecord, Tracker};
