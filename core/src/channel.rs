//! The remote listing/fetch contract and its SFTP implementation.
//!
//! The pipeline depends only on [`RemoteChannel`]; tests drive it with an
//! in-memory fake. [`SftpChannel`] is the production implementation: one
//! authenticated SSH session opened per run, its SFTP subsystem reused for
//! every job directory, and everything released when the value drops.
//!
//! Connection-level failures ([`ConnectError`]) are fatal to the run.
//! Per-operation failures ([`ChannelError`]) are recoverable: the current
//! job is marked failed and the batch continues.

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;

use thiserror::Error;

use crate::config::ChannelConfig;

/// Fatal errors while establishing the remote session.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("cannot resolve {host}:{port}")]
    Resolve { host: String, port: u16 },

    #[error("connection to {host}:{port} failed: {source}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("connection to {host}:{port} timed out")]
    Timeout { host: String, port: u16 },

    #[error("authentication failed for user '{user}': {source}")]
    Authentication {
        user: String,
        #[source]
        source: ssh2::Error,
    },

    #[error("SSH negotiation failed: {0}")]
    Handshake(#[source] ssh2::Error),
}

/// Recoverable errors from per-job channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("remote path not found: {path}")]
    PathNotFound { path: String },

    #[error("transfer of {path} failed: {message}")]
    Io { path: String, message: String },
}

/// Authenticated, directory-listing and file-fetching transport.
pub trait RemoteChannel {
    /// List the filenames (not full paths) in a remote directory.
    fn list_dir(&mut self, path: &str) -> Result<Vec<String>, ChannelError>;

    /// Fetch one remote file into `local`.
    fn fetch(&mut self, remote_path: &str, local: &Path) -> Result<(), ChannelError>;
}

/// SFTP subsystem error code for a missing file or directory.
const SFTP_NO_SUCH_FILE: i32 = 2;

/// ssh2-backed [`RemoteChannel`].
///
/// The underlying session disconnects when the value is dropped, so the
/// single session per run is closed exactly once on every exit path.
pub struct SftpChannel {
    sftp: ssh2::Sftp,
    // Held so the transport outlives the SFTP subsystem.
    _session: ssh2::Session,
}

impl SftpChannel {
    /// Open a TCP connection, complete the SSH handshake, and authenticate
    /// with the configured password.
    pub fn connect(config: &ChannelConfig) -> Result<Self, ConnectError> {
        let addr = (config.hostname.as_str(), config.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ConnectError::Resolve {
                host: config.hostname.clone(),
                port: config.port,
            })?;

        tracing::info!(
            "connecting to {}:{} as '{}'",
            config.hostname,
            config.port,
            config.username
        );
        let tcp = TcpStream::connect_timeout(&addr, config.timeout).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                ConnectError::Timeout {
                    host: config.hostname.clone(),
                    port: config.port,
                }
            } else {
                ConnectError::Connection {
                    host: config.hostname.clone(),
                    port: config.port,
                    source: e,
                }
            }
        })?;
        tcp.set_read_timeout(Some(config.timeout))
            .and_then(|()| tcp.set_write_timeout(Some(config.timeout)))
            .map_err(|e| ConnectError::Connection {
                host: config.hostname.clone(),
                port: config.port,
                source: e,
            })?;

        let mut session = ssh2::Session::new().map_err(ConnectError::Handshake)?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(ConnectError::Handshake)?;
        session
            .userauth_password(&config.username, &config.password)
            .map_err(|e| ConnectError::Authentication {
                user: config.username.clone(),
                source: e,
            })?;

        let sftp = session.sftp().map_err(ConnectError::Handshake)?;
        tracing::info!("SFTP session established");
        Ok(Self {
            sftp,
            _session: session,
        })
    }

    fn map_sftp_error(path: &str, err: ssh2::Error) -> ChannelError {
        if matches!(err.code(), ssh2::ErrorCode::SFTP(SFTP_NO_SUCH_FILE)) {
            ChannelError::PathNotFound {
                path: path.to_string(),
            }
        } else {
            ChannelError::Io {
                path: path.to_string(),
                message: err.to_string(),
            }
        }
    }
}

impl RemoteChannel for SftpChannel {
    fn list_dir(&mut self, path: &str) -> Result<Vec<String>, ChannelError> {
        let entries = self
            .sftp
            .readdir(Path::new(path))
            .map_err(|e| Self::map_sftp_error(path, e))?;
        Ok(entries
            .into_iter()
            .filter_map(|(entry, _stat)| {
                entry.file_name().map(|n| n.to_string_lossy().into_owned())
            })
            .collect())
    }

    fn fetch(&mut self, remote_path: &str, local: &Path) -> Result<(), ChannelError> {
        let mut remote = self
            .sftp
            .open(Path::new(remote_path))
            .map_err(|e| Self::map_sftp_error(remote_path, e))?;
        let mut contents = Vec::new();
        remote
            .read_to_end(&mut contents)
            .map_err(|e| ChannelError::Io {
                path: remote_path.to_string(),
                message: e.to_string(),
            })?;
        std::fs::write(local, contents).map_err(|e| ChannelError::Io {
            path: remote_path.to_string(),
            message: format!("writing {}: {e}", local.display()),
        })
    }
}

/// Join a remote directory and a filename with `/`, tolerating a trailing
/// slash on the directory.
pub fn join_remote(dir: &str, filename: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn join_remote_handles_trailing_slash() {
        assert_eq!(
            join_remote("/logs/finance/billing/job_a/", "job_a-20250101_080000.log"),
            "/logs/finance/billing/job_a/job_a-20250101_080000.log"
        );
        assert_eq!(join_remote("/logs/x", "f.log"), "/logs/x/f.log");
    }
}
