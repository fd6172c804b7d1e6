//! The job registry and its persisted wide table.
//!
//! One row per monitored job, identity columns fixed, one additional
//! `results_<YYYYMMDD>` column per run date. History is append-only on both
//! axes: merges add rows and date columns but never delete either; the only
//! permitted mutation is overwriting an existing date column in place when a
//! run is repeated for the same date.
//!
//! ## Persisted layout
//!
//! ```text
//! remote_log_directory,project,department,job_name,results_20250508,results_20250501
//! /logs/finance/billing/job_invoice_gen,finance,billing,job_invoice_gen,success,error
//! ```
//!
//! Date columns are ordered most recent first; identity columns always come
//! first. Row order is stable across merges except for appended new jobs.
//! The file is read-modify-written by a single writer per run; concurrent
//! invocations are not guarded against.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::classify::Classification;

/// Fixed identity columns, in persisted order.
pub const IDENTITY_COLUMNS: [&str; 4] =
    ["remote_log_directory", "project", "department", "job_name"];

/// Prefix for per-run-date result columns.
pub const RESULTS_PREFIX: &str = "results_";

/// Errors from tracker persistence.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("tracker file is missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One monitored job: identity plus its per-date classification history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    /// Unique key across the registry.
    pub remote_log_directory: String,
    pub project: String,
    pub department: String,
    pub job_name: String,
    /// Run date (`YYYYMMDD`) to tracker cell value.
    pub results: BTreeMap<String, String>,
}

impl JobRecord {
    /// A record with empty history.
    pub fn new(
        remote_log_directory: impl Into<String>,
        project: impl Into<String>,
        department: impl Into<String>,
        job_name: impl Into<String>,
    ) -> Self {
        Self {
            remote_log_directory: remote_log_directory.into(),
            project: project.into(),
            department: department.into(),
            job_name: job_name.into(),
            results: BTreeMap::new(),
        }
    }
}

/// The registry of monitored jobs and their classification history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tracker {
    rows: Vec<JobRecord>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[JobRecord] {
        &self.rows
    }

    /// Append a job to the registry.
    pub fn push(&mut self, record: JobRecord) {
        self.rows.push(record);
    }

    /// Remote directories in registry order; this is the processing order
    /// for a run. Rows without a directory stay in the registry but are
    /// never processed; they pick up `unresolved` at merge time.
    pub fn job_dirs(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.remote_log_directory.clone())
            .filter(|d| !d.trim().is_empty())
            .collect()
    }

    /// All recorded run dates, most recent first.
    pub fn date_columns(&self) -> Vec<String> {
        let mut dates: Vec<String> = self
            .rows
            .iter()
            .flat_map(|r| r.results.keys().cloned())
            .collect();
        dates.sort_unstable();
        dates.dedup();
        dates.reverse();
        dates
    }

    /// Merge one run's classifications under `run_date`.
    ///
    /// - an existing `run_date` column is overwritten in place (idempotent
    ///   per date, never duplicated);
    /// - identities present in `classifications` but unknown to the registry
    ///   are appended as new rows;
    /// - every existing row gets an explicit cell for `run_date` — a job the
    ///   run produced no classification for is marked `unresolved`, never
    ///   left blank;
    /// - no row or prior date column is ever removed.
    pub fn merge(&mut self, run_date: &str, classifications: &BTreeMap<String, Classification>) {
        for row in &mut self.rows {
            let value = classifications
                .get(&row.remote_log_directory)
                .copied()
                .unwrap_or(Classification::Unresolved);
            row.results
                .insert(run_date.to_string(), value.as_str().to_string());
        }

        let known: std::collections::HashSet<&str> = self
            .rows
            .iter()
            .map(|r| r.remote_log_directory.as_str())
            .collect();
        let mut appended = Vec::new();
        for (dir, value) in classifications {
            if known.contains(dir.as_str()) {
                continue;
            }
            tracing::info!("appending newly monitored job: {dir}");
            let mut record = JobRecord::new(dir.clone(), "", "", job_name_for_dir(dir));
            record
                .results
                .insert(run_date.to_string(), value.as_str().to_string());
            appended.push(record);
        }
        self.rows.extend(appended);
    }

    /// Load the tracker from a CSV file.
    pub fn load(path: &Path) -> Result<Self, TrackerError> {
        if !path.exists() {
            return Err(TrackerError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut identity_idx = [0usize; 4];
        for (slot, column) in identity_idx.iter_mut().zip(IDENTITY_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| TrackerError::MissingColumn {
                    column: column.to_string(),
                })?;
        }

        // (column index, run date) for every dynamic column.
        let date_cols: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| {
                h.strip_prefix(RESULTS_PREFIX)
                    .map(|date| (i, date.to_string()))
            })
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let field = |i: usize| record.get(i).unwrap_or("").to_string();
            let mut row = JobRecord::new(
                field(identity_idx[0]),
                field(identity_idx[1]),
                field(identity_idx[2]),
                field(identity_idx[3]),
            );
            if row.remote_log_directory.trim().is_empty() {
                tracing::warn!(
                    "tracker row '{}' has no remote_log_directory; it is kept but cannot be checked",
                    row.job_name
                );
            }
            for (i, date) in &date_cols {
                let value = field(*i);
                if !value.is_empty() {
                    row.results.insert(date.clone(), value);
                }
            }
            rows.push(row);
        }
        tracing::info!("loaded tracker: {} jobs from {}", rows.len(), path.display());
        Ok(Self { rows })
    }

    /// Write the tracker back atomically via a `.tmp` sibling.
    pub fn save(&self, path: &Path) -> Result<(), TrackerError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            let dates = self.date_columns();
            let mut header: Vec<&str> = IDENTITY_COLUMNS.to_vec();
            let date_headers: Vec<String> =
                dates.iter().map(|d| format!("{RESULTS_PREFIX}{d}")).collect();
            header.extend(date_headers.iter().map(String::as_str));
            writer.write_record(&header)?;

            for row in &self.rows {
                let mut record = vec![
                    row.remote_log_directory.as_str(),
                    row.project.as_str(),
                    row.department.as_str(),
                    row.job_name.as_str(),
                ];
                for date in &dates {
                    record.push(row.results.get(date).map(String::as_str).unwrap_or(""));
                }
                writer.write_record(&record)?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp, path)?;
        tracing::info!("saved tracker: {} jobs to {}", self.rows.len(), path.display());
        Ok(())
    }

    /// Plain-text table in display order, for the `show` subcommand.
    pub fn render(&self) -> String {
        let dates = self.date_columns();
        let mut header: Vec<String> = IDENTITY_COLUMNS.iter().map(|c| c.to_string()).collect();
        header.extend(dates.iter().map(|d| format!("{RESULTS_PREFIX}{d}")));

        let mut table: Vec<Vec<String>> = vec![header];
        for row in &self.rows {
            let mut cells = vec![
                row.remote_log_directory.clone(),
                row.project.clone(),
                row.department.clone(),
                row.job_name.clone(),
            ];
            for date in &dates {
                cells.push(row.results.get(date).cloned().unwrap_or_default());
            }
            table.push(cells);
        }

        let columns = table[0].len();
        let widths: Vec<usize> = (0..columns)
            .map(|i| table.iter().map(|r| r[i].len()).max().unwrap_or(0))
            .collect();

        let mut out = String::new();
        for row in &table {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}", width = *width))
                .collect();
            out.push_str(line.join("  ").trim_end());
            out.push('\n');
        }
        out
    }
}

/// Derive a fallback job name from a remote directory path: the final path
/// component, verbatim.
pub fn job_name_for_dir(dir: &str) -> &str {
    dir.trim_end_matches('/').rsplit('/').next().unwrap_or(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Tracker {
        let mut tracker = Tracker::new();
        for (dir, project, dept, job) in [
            (
                "/logs/finance/billing/job_invoice_gen",
                "finance",
                "billing",
                "job_invoice_gen",
            ),
            (
                "/logs/finance/billing/job_payment_proc",
                "finance",
                "billing",
                "job_payment_proc",
            ),
            (
                "/logs/hr/payroll/job_salary_calc",
                "hr",
                "payroll",
                "job_salary_calc",
            ),
        ] {
            tracker.push(JobRecord::new(dir, project, dept, job));
        }
        tracker
    }

    fn classifications(pairs: &[(&str, Classification)]) -> BTreeMap<String, Classification> {
        pairs
            .iter()
            .map(|(dir, c)| (dir.to_string(), *c))
            .collect()
    }

    #[test]
    fn merge_adds_new_date_column_and_preserves_history() {
        // Scenario: one recorded date, then a later run for all three jobs.
        let mut tracker = sample();
        tracker.merge(
            "20250501",
            &classifications(&[
                ("/logs/finance/billing/job_invoice_gen", Classification::Success),
                ("/logs/finance/billing/job_payment_proc", Classification::Error),
                ("/logs/hr/payroll/job_salary_calc", Classification::Success),
            ]),
        );
        tracker.merge(
            "20250508",
            &classifications(&[
                ("/logs/finance/billing/job_invoice_gen", Classification::Success),
                ("/logs/finance/billing/job_payment_proc", Classification::Success),
                ("/logs/hr/payroll/job_salary_calc", Classification::Unresolved),
            ]),
        );

        assert_eq!(tracker.date_columns(), vec!["20250508", "20250501"]);
        assert_eq!(tracker.rows().len(), 3);
        let second = &tracker.rows()[1];
        assert_eq!(second.results.get("20250501").map(String::as_str), Some("error"));
        assert_eq!(second.results.get("20250508").map(String::as_str), Some("success"));
    }

    #[test]
    fn remerge_same_date_overwrites_without_duplicating() {
        let mut tracker = sample();
        tracker.merge(
            "20250508",
            &classifications(&[(
                "/logs/finance/billing/job_invoice_gen",
                Classification::Error,
            )]),
        );
        tracker.merge(
            "20250508",
            &classifications(&[(
                "/logs/finance/billing/job_invoice_gen",
                Classification::Success,
            )]),
        );

        assert_eq!(tracker.date_columns(), vec!["20250508"]);
        assert_eq!(
            tracker.rows()[0].results.get("20250508").map(String::as_str),
            Some("success")
        );
    }

    #[test]
    fn merge_never_leaves_blank_cells() {
        let mut tracker = sample();
        // Run produced nothing for the payroll job.
        tracker.merge(
            "20250508",
            &classifications(&[
                ("/logs/finance/billing/job_invoice_gen", Classification::Success),
                ("/logs/finance/billing/job_payment_proc", Classification::Success),
            ]),
        );
        assert_eq!(
            tracker.rows()[2].results.get("20250508").map(String::as_str),
            Some("unresolved")
        );
    }

    #[test]
    fn merge_appends_unknown_jobs() {
        let mut tracker = sample();
        tracker.merge(
            "20250508",
            &classifications(&[(
                "/logs/marketing/campaigns/job_email_blast",
                Classification::Success,
            )]),
        );
        assert_eq!(tracker.rows().len(), 4);
        let appended = &tracker.rows()[3];
        assert_eq!(
            appended.remote_log_directory,
            "/logs/marketing/campaigns/job_email_blast"
        );
        assert_eq!(appended.job_name, "job_email_blast");
        assert_eq!(
            appended.results.get("20250508").map(String::as_str),
            Some("success")
        );
    }

    #[test]
    fn merge_appends_hyphenated_directory_with_full_basename() {
        let mut tracker = sample();
        tracker.merge(
            "20250508",
            &classifications(&[("/logs/operations/etl-nightly", Classification::Success)]),
        );
        assert_eq!(tracker.rows()[3].job_name, "etl-nightly");
    }

    #[test]
    fn rows_without_a_directory_keep_their_history_across_runs() {
        // A registry row with no remote_log_directory cannot be checked, but
        // its prior results must not be dropped on the next load/save cycle.
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("tracker.csv");
        std::fs::write(
            &path,
            "remote_log_directory,project,department,job_name,results_20250501\n\
             /logs/finance/billing/job_invoice_gen,finance,billing,job_invoice_gen,success\n\
             ,finance,billing,job_decommissioned,error\n",
        )
        .unwrap();

        let mut tracker = Tracker::load(&path).unwrap();
        assert_eq!(tracker.rows().len(), 2);
        // The directory-less row is excluded from processing order.
        assert_eq!(tracker.job_dirs(), vec!["/logs/finance/billing/job_invoice_gen"]);

        tracker.merge(
            "20250508",
            &classifications(&[(
                "/logs/finance/billing/job_invoice_gen",
                Classification::Success,
            )]),
        );
        tracker.save(&path).unwrap();

        let reloaded = Tracker::load(&path).unwrap();
        let orphan = &reloaded.rows()[1];
        assert_eq!(orphan.job_name, "job_decommissioned");
        assert_eq!(orphan.results.get("20250501").map(String::as_str), Some("error"));
        assert_eq!(
            orphan.results.get("20250508").map(String::as_str),
            Some("unresolved")
        );
    }

    #[test]
    fn save_load_round_trip_preserves_rows_and_columns() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("tracker.csv");

        let mut tracker = sample();
        tracker.merge(
            "20250501",
            &classifications(&[
                ("/logs/finance/billing/job_invoice_gen", Classification::Success),
                ("/logs/finance/billing/job_payment_proc", Classification::Error),
                ("/logs/hr/payroll/job_salary_calc", Classification::Unresolved),
            ]),
        );
        tracker.save(&path).unwrap();

        let loaded = Tracker::load(&path).unwrap();
        assert_eq!(loaded, tracker);
    }

    #[test]
    fn saved_header_orders_dates_most_recent_first() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("tracker.csv");

        let mut tracker = sample();
        tracker.merge("20250501", &classifications(&[]));
        tracker.merge("20250508", &classifications(&[]));
        tracker.save(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(
            header,
            "remote_log_directory,project,department,job_name,results_20250508,results_20250501"
        );
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = Tracker::load(&tmp.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { .. }));
    }

    #[test]
    fn load_rejects_missing_identity_column() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("tracker.csv");
        std::fs::write(&path, "remote_log_directory,project,job_name\n/a,x,y\n").unwrap();

        let err = Tracker::load(&path).unwrap_err();
        assert!(matches!(err, TrackerError::MissingColumn { ref column } if column == "department"));
    }

    #[test]
    fn render_puts_identity_columns_first() {
        let mut tracker = sample();
        tracker.merge("20250508", &classifications(&[]));
        let rendered = tracker.render();
        let header = rendered.lines().next().unwrap();
        assert!(header.starts_with("remote_log_directory"));
        assert!(header.contains("results_20250508"));
    }
}
