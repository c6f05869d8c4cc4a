// ── Types ─────────────────────────────────────────────────────────────────────

use crate::scp::error::{ScpError, ScpResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ── Serde default helpers ────────────────────────────────────────────────────

fn default_scp_port() -> u16 {
    22
}
fn default_false() -> bool {
    false
}
fn default_remote_directory() -> String {
    ".".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// Mode written into every file header line.
pub const SCP_FILE_MODE: &str = "0644";

// ── Connection & Authentication ──────────────────────────────────────────────

/// Everything the uploader needs to reach the remote host and run `scp -t`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScpConfig {
    pub host: String,
    #[serde(default = "default_scp_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub private_key_path: Option<String>,
    #[serde(default)]
    pub private_key_passphrase: Option<String>,
    #[serde(default)]
    pub known_hosts_path: Option<String>,
    /// Accept host keys that are missing from (or absent without) a known-hosts file.
    #[serde(default = "default_false")]
    pub trust_unknown_hosts: bool,
    #[serde(default = "default_false")]
    pub verbose: bool,
    /// Target directory handed to `scp -t`, unquoted.
    #[serde(default = "default_remote_directory")]
    pub remote_directory: String,
    /// TCP connect and blocking-call timeout; `0` waits forever.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ScpConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_scp_port(),
            username: username.into(),
            password: None,
            private_key_path: None,
            private_key_passphrase: None,
            known_hosts_path: None,
            trust_unknown_hosts: false,
            verbose: false,
            remote_directory: default_remote_directory(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Parse a camelCase JSON config and validate it.
    pub fn from_json(json: &str) -> ScpResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ScpError::invalid_config(format!("Invalid SCP config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ScpResult<()> {
        if self.host.trim().is_empty() {
            return Err(ScpError::invalid_config("host must not be empty"));
        }
        if self.remote_directory.is_empty() {
            return Err(ScpError::invalid_config(
                "remote directory must not be empty",
            ));
        }
        Ok(())
    }

    /// Credentials and trust settings passed down to the transport.
    pub fn auth_context(&self) -> ScpAuthContext {
        ScpAuthContext {
            username: self.username.clone(),
            password: self.password.clone(),
            private_key_path: self.private_key_path.as_ref().map(PathBuf::from),
            private_key_passphrase: self.private_key_passphrase.clone(),
            known_hosts_path: self.known_hosts_path.as_ref().map(PathBuf::from),
            trust_unknown_hosts: self.trust_unknown_hosts,
        }
    }
}

/// Opaque authentication context consumed by a [`ScpTransport`](crate::scp::ScpTransport).
#[derive(Clone, Default)]
pub struct ScpAuthContext {
    pub username: String,
    pub password: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub private_key_passphrase: Option<String>,
    pub known_hosts_path: Option<PathBuf>,
    pub trust_unknown_hosts: bool,
}

impl fmt::Debug for ScpAuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScpAuthContext")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("private_key_path", &self.private_key_path)
            .field(
                "private_key_passphrase",
                &self.private_key_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .field("known_hosts_path", &self.known_hosts_path)
            .field("trust_unknown_hosts", &self.trust_unknown_hosts)
            .finish()
    }
}

// ── Transfer request ─────────────────────────────────────────────────────────

/// One local file pushed into one remote directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScpTransferRequest {
    pub local_path: PathBuf,
    #[serde(default = "default_remote_directory")]
    pub remote_directory: String,
    #[serde(default = "default_false")]
    pub verbose: bool,
}

impl ScpTransferRequest {
    pub fn new(
        local_path: impl Into<PathBuf>,
        remote_directory: impl Into<String>,
        verbose: bool,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            remote_directory: remote_directory.into(),
            verbose,
        }
    }

    /// Base name sent in the header line.
    ///
    /// Fails for paths without a final component, non UTF-8 names, and names
    /// containing a newline, since none of those can be framed as a header.
    pub fn file_name(&self) -> ScpResult<String> {
        let name = self
            .local_path
            .file_name()
            .ok_or_else(|| {
                ScpError::invalid_input(format!(
                    "'{}' has no file name",
                    self.local_path.display()
                ))
            })?
            .to_str()
            .ok_or_else(|| {
                ScpError::invalid_input(format!(
                    "file name of '{}' is not valid UTF-8",
                    self.local_path.display()
                ))
            })?;
        if name.contains('\n') {
            return Err(ScpError::invalid_input(format!(
                "file name {:?} contains a newline",
                name
            )));
        }
        Ok(name.to_string())
    }

    /// Remote sink invocation for this request's target directory.
    pub fn remote_command(&self) -> String {
        format!("scp -t {}", self.remote_directory)
    }

    /// Ensure the local path is an existing, readable regular file.
    pub fn validate_local(&self) -> ScpResult<u64> {
        validate_local_file(&self.local_path)
    }
}

pub(crate) fn validate_local_file(path: &Path) -> ScpResult<u64> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        ScpError::invalid_input(format!("Cannot read local file '{}': {}", path.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(ScpError::invalid_input(format!(
            "'{}' is not a regular file",
            path.display()
        )));
    }
    std::fs::File::open(path).map_err(|e| {
        ScpError::invalid_input(format!("Cannot open '{}': {}", path.display(), e))
    })?;
    Ok(metadata.len())
}

// ── Statistics ───────────────────────────────────────────────────────────────

/// Timing and volume of one completed upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScpTransferStatistics {
    pub file_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_bytes: u64,
}

impl ScpTransferStatistics {
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at).num_milliseconds().max(0) as u64
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_ms() as f64 / 1000.0
    }

    /// Bytes per second, or `None` when the clock did not advance.
    pub fn average_rate(&self) -> Option<f64> {
        match self.duration_ms() {
            0 => None,
            ms => Some(self.total_bytes as f64 / (ms as f64 / 1000.0)),
        }
    }

    pub fn summary(&self) -> String {
        match self.average_rate() {
            Some(rate) => format!(
                "File transfer time: {:.2} s Average Rate: {:.2} B/s",
                self.duration_secs(),
                rate
            ),
            None => format!(
                "File transfer time: {:.2} s Average Rate: unbounded (no measurable elapsed time)",
                self.duration_secs()
            ),
        }
    }
}

// ── History ──────────────────────────────────────────────────────────────────

/// One finished upload as kept by [`ScpService`](crate::scp::ScpService).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScpTransferRecord {
    pub transfer_id: String,
    pub host: String,
    pub username: String,
    pub local_path: String,
    pub remote_directory: String,
    pub bytes_transferred: u64,
    pub duration_ms: u64,
    pub average_speed: f64,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}
