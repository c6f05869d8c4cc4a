//! SCP-specific error type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorised SCP upload error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScpError {
    pub kind: ScpErrorKind,
    pub message: String,
    /// Acknowledgement byte sent by the remote sink, if the error came from one.
    pub code: Option<u8>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScpErrorKind {
    /// DNS resolution, TCP connect, or SSH handshake failure.
    ConnectionFailed,
    /// Credentials rejected, or the host key could not be verified.
    AuthFailed,
    /// The exec channel could not be opened or the remote command not started.
    ChannelFailed,
    /// The remote closed its stream without sending an acknowledgement.
    NoResponse,
    /// The remote sent code 1 (recoverable error).
    RemoteError,
    /// The remote sent code 2 (fatal error).
    RemoteFatal,
    /// The remote sent a code outside 0..=2.
    UnknownResponse,
    /// The remote closed its stream in the middle of a diagnostic line.
    TruncatedResponse,
    /// Local file or channel stream I/O failure.
    IoError,
    /// Local file missing, unreadable, or not representable in a header line.
    InvalidInput,
    /// Config validation error.
    InvalidConfig,
}

pub type ScpResult<T> = Result<T, ScpError>;

// ── Construction helpers ─────────────────────────────────────────────

impl ScpError {
    pub fn new(kind: ScpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: u8) -> Self {
        self.code = Some(code);
        self
    }

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::ConnectionFailed, msg)
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::AuthFailed, msg)
    }

    pub fn channel_failed(msg: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::ChannelFailed, msg)
    }

    pub fn no_response() -> Self {
        Self::new(ScpErrorKind::NoResponse, "no response from remote")
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::IoError, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::InvalidInput, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::InvalidConfig, msg)
    }

    /// Classify a non-zero acknowledgement byte and its diagnostic line.
    pub fn from_ack(code: u8, text: &str) -> Self {
        let (kind, message) = match code {
            1 => (
                ScpErrorKind::RemoteError,
                format!("remote indicated an error: {}", text),
            ),
            2 => (
                ScpErrorKind::RemoteFatal,
                format!("remote indicated a fatal error: {}", text),
            ),
            other => (
                ScpErrorKind::UnknownResponse,
                format!("unknown response code {}: {}", other, text),
            ),
        };
        Self::new(kind, message).with_code(code)
    }

    /// The remote hung up before finishing the diagnostic line for `code`.
    pub fn truncated(code: u8, partial: &str) -> Self {
        Self::new(
            ScpErrorKind::TruncatedResponse,
            format!(
                "remote closed the stream mid-message (code {}): {}",
                code, partial
            ),
        )
        .with_code(code)
    }

    /// True for every failure of the acknowledgement protocol itself.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self.kind,
            ScpErrorKind::NoResponse
                | ScpErrorKind::RemoteError
                | ScpErrorKind::RemoteFatal
                | ScpErrorKind::UnknownResponse
                | ScpErrorKind::TruncatedResponse
        )
    }
}

impl fmt::Display for ScpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[SCP {:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for ScpError {}

impl From<std::io::Error> for ScpError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::TimedOut {
            Self::io_error(format!("I/O timeout: {}", e))
        } else {
            Self::io_error(e.to_string())
        }
    }
}

impl From<ScpError> for String {
    fn from(e: ScpError) -> String {
        e.to_string()
    }
}
