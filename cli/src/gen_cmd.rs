//! `logtrack gen-logs`: synthetic log fixtures for demos and local SFTP
//! test servers.
//!
//! Generates a `<domain>/<department>/<job>/` tree of convention-named
//! files (`<job>-<YYYYMMDD>_<HHMMSS>.log`) whose content carries the same
//! markers the default pattern sets classify on: `Execution Return Code: 0`
//! for clean runs, `*** Error:` lines otherwise.

use std::path::PathBuf;

use anyhow::bail;
use chrono::{Days, Local, NaiveDate};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Domain -> department -> job names, mirroring a typical batch estate.
const JOB_TREE: &[(&str, &str, &[&str])] = &[
    (
        "finance",
        "billing",
        &["job_invoice_gen", "job_payment_proc", "job_tax_calc"],
    ),
    (
        "finance",
        "reporting",
        &["job_report_daily", "job_report_monthly"],
    ),
    (
        "marketing",
        "analytics",
        &["job_conversion_rate", "job_web_traffic"],
    ),
    (
        "operations",
        "logistics",
        &["job_inventory_check", "job_shipment_track"],
    ),
    ("hr", "payroll", &["job_salary_calc", "job_bonus_process"]),
];

const SUCCESS_MESSAGES: &[&str] = &[
    "Script executed successfully.",
    "All data processed without errors.",
    "Report generated successfully.",
];

const ERROR_MESSAGES: &[&str] = &[
    "Failed to connect to dependent data source.",
    "Query timeout after 60 seconds.",
    "Invalid data format in source table.",
    "Critical error: Database connection failed after 3 retries.",
];

#[derive(Debug, Parser)]
pub struct GenLogsArgs {
    /// Base directory for the generated tree.
    #[arg(long, default_value = "sample_logs")]
    pub output_dir: PathBuf,

    /// `today`, `yesterday`, `last3days`, or a comma list of YYYYMMDD dates.
    #[arg(long, default_value = "today")]
    pub dates: String,

    /// Log files per job per date.
    #[arg(long, default_value_t = 1)]
    pub slots: u32,

    /// Seed for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: GenLogsArgs) -> anyhow::Result<()> {
    let dates = resolve_dates(&args.dates)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut generated = 0usize;
    for date in &dates {
        for (domain, department, jobs) in JOB_TREE {
            for job in *jobs {
                let job_dir = args.output_dir.join(domain).join(department).join(job);
                std::fs::create_dir_all(&job_dir)?;
                for _ in 0..args.slots.max(1) {
                    let start = random_time(&mut rng);
                    let content = log_content(&mut rng, date, &start, domain, department, job);
                    let filename = format!("{job}-{date}_{start}.log");
                    std::fs::write(job_dir.join(&filename), content)?;
                    generated += 1;
                }
            }
        }
        tracing::info!("generated logs for {date}");
    }

    println!(
        "generated {generated} log files under {}",
        args.output_dir.display()
    );
    Ok(())
}

fn resolve_dates(spec: &str) -> anyhow::Result<Vec<String>> {
    let today = Local::now().date_naive();
    let stamp = |d: NaiveDate| d.format("%Y%m%d").to_string();

    match spec.to_lowercase().as_str() {
        "today" => Ok(vec![stamp(today)]),
        "yesterday" => Ok(vec![stamp(back(today, 1))]),
        "last3days" => Ok((0..3).map(|i| stamp(back(today, i))).collect()),
        _ => {
            let mut dates = Vec::new();
            for part in spec.split(',') {
                let part = part.trim();
                if part.len() != 8 || !part.chars().all(|c| c.is_ascii_digit()) {
                    bail!("--dates entries must be YYYYMMDD, got '{part}'");
                }
                dates.push(part.to_string());
            }
            Ok(dates)
        }
    }
}

fn back(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(date)
}

fn random_time(rng: &mut StdRng) -> String {
    format!(
        "{:02}{:02}{:02}",
        rng.random_range(0..24),
        rng.random_range(0..60),
        rng.random_range(0..60)
    )
}

fn pick<'a>(rng: &mut StdRng, options: &[&'a str]) -> &'a str {
    options[rng.random_range(0..options.len())]
}

/// Weighted return code: mostly clean runs, occasional failures.
fn random_return_code(rng: &mut StdRng) -> u8 {
    match rng.random_range(0..100) {
        0..70 => 0,
        70..85 => 4,
        _ => 8,
    }
}

fn log_content(
    rng: &mut StdRng,
    date: &str,
    start: &str,
    domain: &str,
    department: &str,
    job: &str,
) -> String {
    let return_code = random_return_code(rng);
    let mut lines = vec![
        format!(
            "{} {} JOB LOG {date}_{start}",
            domain.to_uppercase(),
            department.to_uppercase()
        ),
        "----------------------".to_string(),
        format!("{date}_{start} DOMAIN: {domain}"),
        format!("{date}_{start} SUB_DOMAIN: {department}"),
        format!("{date}_{start} JOB={job}"),
        format!("{date}_{start} ## Running script"),
        format!("{date}_{start}  *** Logon successfully completed."),
    ];
    if return_code > 0 {
        lines.push(format!("  *** Error: {}", pick(rng, ERROR_MESSAGES)));
        lines.push("  *** Script execution failed.".to_string());
    } else {
        lines.push(format!("  *** {}", pick(rng, SUCCESS_MESSAGES)));
        lines.push("  *** Script execution successful.".to_string());
    }
    lines.push(format!("  *** RC (return code) = {return_code}"));
    lines.push(format!("Execution Return Code: {return_code}"));
    lines.push(if return_code > 0 {
        "JOB ERROR".to_string()
    } else {
        "JOB SUCCESS".to_string()
    });
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolve_explicit_date_list() {
        let dates = resolve_dates("20250501, 20250508").unwrap();
        assert_eq!(dates, vec!["20250501", "20250508"]);
    }

    #[test]
    fn resolve_rejects_malformed_dates() {
        assert!(resolve_dates("2025-05-01").is_err());
        assert!(resolve_dates("205").is_err());
    }

    #[test]
    fn resolve_last3days_is_three_dates() {
        let dates = resolve_dates("last3days").unwrap();
        assert_eq!(dates.len(), 3);
        assert!(dates.iter().all(|d| d.len() == 8));
    }

    #[test]
    fn content_carries_classifiable_markers() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let content = log_content(&mut rng, "20250501", "080000", "finance", "billing", "job_x");
            let clean = content.contains("Execution Return Code: 0");
            let failed = content.contains("*** Error:");
            // Exactly one of the two marker families per log.
            assert!(clean ^ failed, "ambiguous content:\n{content}");
        }
    }
}
