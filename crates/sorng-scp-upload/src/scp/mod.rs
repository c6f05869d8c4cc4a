// ── sorng-scp-upload / scp module ─────────────────────────────────────────────
//
// Single-file SCP upload over the sink protocol (`scp -t <dir>`):
//   • Acknowledgement handshake (0 ok / 1 error / 2 fatal)
//   • Header framing and byte-exact payload streaming
//   • Throughput statistics reported to a caller-supplied listener
//   • Session / channel lifecycle with guaranteed release
//   • libssh2 transport with known-hosts verification
//   • Async service facade with bounded transfer history

pub mod ack;
pub mod error;
pub mod history;
pub mod listener;
pub mod service;
pub mod ssh;
pub mod transfer;
pub mod transport;
pub mod types;
pub mod uploader;

pub use error::{ScpError, ScpErrorKind, ScpResult};
pub use history::ScpHistoryStats;
pub use listener::{FacadeLogListener, NoopLogListener, ScpLogListener};
pub use service::{ScpService, Ssh2ScpService};
pub use ssh::{Ssh2Channel, Ssh2Session, Ssh2Transport, Ssh2Writer};
pub use transfer::{file_header, ScpSink};
pub use transport::{ScpCommandChannel, ScpTransport, ScpTransportSession};
pub use types::*;
pub use uploader::ScpUploader;
