// ── ScpUploader – session lifecycle for one upload ───────────────────────────

use crate::scp::error::ScpResult;
use crate::scp::listener::{NoopLogListener, ScpLogListener};
use crate::scp::ssh::Ssh2Transport;
use crate::scp::transfer::ScpSink;
use crate::scp::transport::*;
use crate::scp::types::*;
use log::{debug, info, Level};
use std::path::Path;
use std::sync::Arc;

/// Uploads local files into `config.remote_directory` on `config.host`.
///
/// Every call to [`upload`](Self::upload) opens its own session and channel and
/// releases both before returning, so one uploader may serve concurrent calls.
pub struct ScpUploader<T: ScpTransport> {
    config: ScpConfig,
    transport: T,
    listener: Arc<dyn ScpLogListener>,
}

impl ScpUploader<Ssh2Transport> {
    /// Uploader on the libssh2 transport configured from `config`.
    pub fn ssh2(config: ScpConfig, listener: Arc<dyn ScpLogListener>) -> ScpResult<Self> {
        let transport = Ssh2Transport::from_config(&config);
        Ok(Self::new(config, transport)?.with_listener(listener))
    }
}

impl<T: ScpTransport> ScpUploader<T> {
    pub fn new(config: ScpConfig, transport: T) -> ScpResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            listener: Arc::new(NoopLogListener),
        })
    }

    /// Receives both transport and transfer events.
    pub fn with_listener(mut self, listener: Arc<dyn ScpLogListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn config(&self) -> &ScpConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Push `local_path` to the remote directory.
    ///
    /// The local file is checked before any connection is made. Channel and
    /// session are released, in that order, on every exit path.
    pub fn upload(&self, local_path: impl AsRef<Path>) -> ScpResult<ScpTransferStatistics> {
        let request = ScpTransferRequest::new(
            local_path.as_ref(),
            self.config.remote_directory.clone(),
            self.config.verbose,
        );
        request.validate_local()?;
        request.file_name()?;

        info!(
            "SCP upload {} -> {}@{}:{}:{}",
            request.local_path.display(),
            self.config.username,
            self.config.host,
            self.config.port,
            request.remote_directory
        );

        let mut session = SessionGuard::new(self.transport.open_session(
            &self.config.auth_context(),
            &self.config.host,
            self.config.port,
            self.listener.as_ref(),
        )?);

        let command = request.remote_command();
        self.listener
            .log(Level::Debug, &format!("Executing remote command: {}", command));
        let mut channel = ChannelGuard::new(session.open_command_channel(&command)?);

        let result = ScpSink::new(self.listener.as_ref()).execute(&mut *channel, &request);

        drop(channel);
        drop(session);
        debug!("SCP channel and session released");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scp::listener::FacadeLogListener;
    use crate::scp::ScpErrorKind;
    use std::sync::Mutex;

    #[test]
    fn test_ssh2_uploader_rejects_invalid_config() {
        let err = ScpUploader::ssh2(ScpConfig::new("", "u"), Arc::new(NoopLogListener))
            .err()
            .unwrap();
        assert_eq!(err.kind, ScpErrorKind::InvalidConfig);
    }

    #[test]
    fn test_missing_file_fails_before_connecting() {
        // TEST-NET-1 address; the local check must fail before any connect.
        let mut cfg = ScpConfig::new("192.0.2.1", "u");
        cfg.timeout_secs = 1;
        let uploader = ScpUploader::ssh2(cfg, Arc::new(FacadeLogListener)).unwrap();
        let err = uploader.upload("/nonexistent/file.txt").unwrap_err();
        assert_eq!(err.kind, ScpErrorKind::InvalidInput);
        assert_eq!(uploader.config().remote_directory, ".");
    }

    #[test]
    fn test_ssh2_transport_logs_through_uploader_listener() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, b"x").unwrap();

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener = move |_level: Level, msg: &str| sink.lock().unwrap().push(msg.to_string());

        let mut cfg = ScpConfig::new("host.invalid", "u");
        cfg.timeout_secs = 1;
        let transport = Ssh2Transport::from_config(&cfg);
        let err = ScpUploader::new(cfg, transport)
            .unwrap()
            .with_listener(Arc::new(listener))
            .upload(&path)
            .unwrap_err();

        assert_eq!(err.kind, ScpErrorKind::ConnectionFailed);
        assert!(seen
            .lock()
            .unwrap()
            .contains(&"Connecting to host.invalid:22".to_string()));
    }
}
