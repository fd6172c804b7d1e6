//! Per-run state: the staging directory and the download dedup set.
//!
//! A `RunSession` is created at run start and discarded at run end; it is
//! never shared across runs. The dedup set is keyed on the full remote path
//! rather than the bare filename, so two job directories that happen to
//! produce identically named files with different content cannot bleed into
//! each other.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Local;

/// State scoped to one pipeline execution.
#[derive(Debug)]
pub struct RunSession {
    run_date: String,
    download_dir: PathBuf,
    fetched: HashSet<String>,
}

impl RunSession {
    /// Create a session for `run_date`, staging downloads under
    /// `<base>/<run_date>_logs`. Creating the directory is idempotent.
    pub fn new(base_dir: &Path, run_date: impl Into<String>) -> std::io::Result<Self> {
        let run_date = run_date.into();
        let download_dir = base_dir.join(format!("{run_date}_logs"));
        std::fs::create_dir_all(&download_dir)?;
        tracing::debug!("staging directory: {}", download_dir.display());
        Ok(Self {
            run_date,
            download_dir,
            fetched: HashSet::new(),
        })
    }

    /// Create a session for today's date.
    pub fn for_today(base_dir: &Path) -> std::io::Result<Self> {
        Self::new(base_dir, today_stamp())
    }

    pub fn run_date(&self) -> &str {
        &self.run_date
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Local staging path for a remote filename.
    pub fn local_path(&self, filename: &str) -> PathBuf {
        self.download_dir.join(filename)
    }

    /// Whether `remote_path` was already transferred during this run.
    pub fn already_fetched(&self, remote_path: &str) -> bool {
        self.fetched.contains(remote_path)
    }

    /// Record a completed transfer.
    pub fn mark_fetched(&mut self, remote_path: impl Into<String>) {
        self.fetched.insert(remote_path.into());
    }
}

/// Today's date as `YYYYMMDD`.
pub fn today_stamp() -> String {
    Local::now().format("%Y%m%d").to_string()
}
