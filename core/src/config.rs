//! Typed, environment-sourced configuration.
//!
//! One validated [`Config`] is constructed up front and passed into the
//! channel, classifier, and pipeline; there is no ambient mutable state.
//! Required settings are checked before any network activity, and a single
//! error enumerates every missing variable rather than failing one lookup
//! at a time.
//!
//! Recognized variables (a local `.env` file is honored via dotenvy):
//!
//! ```text
//! LOGTRACK_HOSTNAME          required
//! LOGTRACK_USERNAME          required
//! LOGTRACK_PASSWORD          required
//! LOGTRACK_PORT              default 2222
//! LOGTRACK_TIMEOUT_SECS      default 15
//! LOGTRACK_SUCCESS_PATTERNS  default "Execution Return Code: 0"
//! LOGTRACK_ERROR_PATTERNS    default "*** Failure,*** Error:"
//! LOGTRACK_TRACKER_PATH      default data/log_tracker.csv
//! LOGTRACK_DOWNLOAD_DIR      default data/downloaded_logs
//! ```

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::classify::PatternSet;

pub const ENV_HOSTNAME: &str = "LOGTRACK_HOSTNAME";
pub const ENV_USERNAME: &str = "LOGTRACK_USERNAME";
pub const ENV_PASSWORD: &str = "LOGTRACK_PASSWORD";
pub const ENV_PORT: &str = "LOGTRACK_PORT";
pub const ENV_TIMEOUT_SECS: &str = "LOGTRACK_TIMEOUT_SECS";
pub const ENV_SUCCESS_PATTERNS: &str = "LOGTRACK_SUCCESS_PATTERNS";
pub const ENV_ERROR_PATTERNS: &str = "LOGTRACK_ERROR_PATTERNS";
pub const ENV_TRACKER_PATH: &str = "LOGTRACK_TRACKER_PATH";
pub const ENV_DOWNLOAD_DIR: &str = "LOGTRACK_DOWNLOAD_DIR";

pub const DEFAULT_PORT: u16 = 2222;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_SUCCESS_PATTERNS: &str = "Execution Return Code: 0";
pub const DEFAULT_ERROR_PATTERNS: &str = "*** Failure,*** Error:";
pub const DEFAULT_TRACKER_PATH: &str = "data/log_tracker.csv";
pub const DEFAULT_DOWNLOAD_DIR: &str = "data/downloaded_logs";

/// Errors raised while constructing a [`Config`]. All fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required variables are absent.
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<String>),

    /// A variable is present but cannot be parsed.
    #[error("invalid value for ${var}: '{value}' (expected {expected})")]
    Invalid {
        var: String,
        value: String,
        expected: String,
    },

    /// Both pattern lists parsed to empty; classification would be a no-op.
    #[error("both {ENV_SUCCESS_PATTERNS} and {ENV_ERROR_PATTERNS} are empty")]
    EmptyPatterns,
}

/// Connection settings for the remote channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

/// Fully validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub channel: ChannelConfig,
    pub patterns: PatternSet,
    pub tracker_path: PathBuf,
    pub download_dir: PathBuf,
}

impl Config {
    /// Load configuration from the process environment, after sourcing a
    /// local `.env` file if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Missing .env is the normal case in CI; real env vars win anyway.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary lookup function (tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut required = |name: &str| -> String {
            match lookup(name).filter(|v| !v.trim().is_empty()) {
                Some(v) => v,
                None => {
                    missing.push(name.to_string());
                    String::new()
                }
            }
        };

        let hostname = required(ENV_HOSTNAME);
        let username = required(ENV_USERNAME);
        let password = required(ENV_PASSWORD);
        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing));
        }

        let port = parse_or_default(&lookup, ENV_PORT, DEFAULT_PORT, "a TCP port")?;
        let timeout_secs = parse_or_default(
            &lookup,
            ENV_TIMEOUT_SECS,
            DEFAULT_TIMEOUT_SECS,
            "a number of seconds",
        )?;

        let success = lookup(ENV_SUCCESS_PATTERNS)
            .unwrap_or_else(|| DEFAULT_SUCCESS_PATTERNS.to_string());
        let error =
            lookup(ENV_ERROR_PATTERNS).unwrap_or_else(|| DEFAULT_ERROR_PATTERNS.to_string());
        let patterns = PatternSet::from_comma_lists(&success, &error);
        if patterns.is_empty() {
            return Err(ConfigError::EmptyPatterns);
        }

        let tracker_path = lookup(ENV_TRACKER_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TRACKER_PATH));
        let download_dir = lookup(ENV_DOWNLOAD_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));

        Ok(Self {
            channel: ChannelConfig {
                hostname,
                port,
                username,
                password,
                timeout: Duration::from_secs(timeout_secs),
            },
            patterns,
            tracker_path,
            download_dir,
        })
    }
}

fn parse_or_default<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
    expected: &str,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: var.to_string(),
            value: raw,
            expected: expected.to_string(),
        }),
    }
}
