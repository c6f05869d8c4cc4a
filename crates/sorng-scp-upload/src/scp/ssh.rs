// ── Ssh2Transport – libssh2 sessions and exec channels ──────────────────────

use crate::scp::error::{ScpError, ScpResult};
use crate::scp::listener::ScpLogListener;
use crate::scp::transport::*;
use crate::scp::types::*;
use base64::Engine;
use log::{debug, info, warn, Level};
use ssh2::{CheckResult, HashType, KnownHostFileKind, Session};
use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

/// Production transport: TCP + SSH handshake + host key check + auth.
///
/// Messages go to the listener handed to [`ScpTransport::open_session`], the
/// same one the uploader reports transfer events to.
#[derive(Debug, Default, Clone)]
pub struct Ssh2Transport {
    timeout: Option<Duration>,
    verbose: bool,
}

impl Ssh2Transport {
    pub fn from_config(config: &ScpConfig) -> Self {
        Self {
            timeout: (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs)),
            verbose: config.verbose,
        }
    }

    /// Session-level detail, only forwarded in verbose mode.
    fn trace(&self, listener: &dyn ScpLogListener, message: &str) {
        debug!("{}", message);
        if self.verbose {
            listener.log(Level::Debug, message);
        }
    }

    fn connect_tcp(&self, host: &str, port: u16) -> ScpResult<TcpStream> {
        let addr = format!("{}:{}", host, port);
        let resolved = addr
            .to_socket_addrs()
            .map_err(|e| ScpError::connection_failed(format!("Invalid address '{}': {}", addr, e)))?;
        let tcp = connect_any(&addr, resolved, self.timeout)?;

        tcp.set_nonblocking(false)
            .map_err(|e| ScpError::connection_failed(format!("Failed to set blocking mode: {}", e)))?;
        Ok(tcp)
    }

    fn verify_host_key(
        &self,
        listener: &dyn ScpLogListener,
        session: &Session,
        auth: &ScpAuthContext,
        host: &str,
        port: u16,
    ) -> ScpResult<()> {
        let (key, _) = session
            .host_key()
            .ok_or_else(|| ScpError::connection_failed("Server presented no host key"))?;

        if let Some(hash) = session.host_key_hash(HashType::Sha256) {
            let encoded = base64::engine::general_purpose::STANDARD.encode(hash);
            self.trace(listener, &format!("Host key fingerprint for {}: SHA256:{}", host, encoded));
        }

        if auth.trust_unknown_hosts {
            self.trace(listener, &format!("Trusting host key of {} without verification", host));
            return Ok(());
        }

        let known_hosts_path = auth
            .known_hosts_path
            .clone()
            .or_else(default_known_hosts)
            .ok_or_else(|| {
                ScpError::auth_failed("No known hosts file available to verify the host key")
            })?;
        self.trace(listener, &format!("Using known hosts: {}", known_hosts_path.display()));

        let mut known_hosts = session
            .known_hosts()
            .map_err(|e| ScpError::connection_failed(format!("Known hosts init failed: {}", e)))?;
        if known_hosts_path.exists() {
            known_hosts
                .read_file(&known_hosts_path, KnownHostFileKind::OpenSSH)
                .map_err(|e| {
                    ScpError::auth_failed(format!(
                        "Cannot read known hosts '{}': {}",
                        known_hosts_path.display(),
                        e
                    ))
                })?;
        }

        match known_hosts.check_port(host, port, key) {
            CheckResult::Match => Ok(()),
            CheckResult::Mismatch => Err(ScpError::auth_failed(format!(
                "Host key mismatch for {} (known hosts: {})",
                host,
                known_hosts_path.display()
            ))),
            CheckResult::NotFound => Err(ScpError::auth_failed(format!(
                "Unknown host {}: no entry in {}",
                host,
                known_hosts_path.display()
            ))),
            CheckResult::Failure => Err(ScpError::auth_failed(format!(
                "Host key check failed for {}",
                host
            ))),
        }
    }

    fn authenticate(&self, session: &Session, auth: &ScpAuthContext) -> ScpResult<&'static str> {
        if let Some(ref key_path) = auth.private_key_path {
            let passphrase = auth.private_key_passphrase.as_deref();
            if session
                .userauth_pubkey_file(&auth.username, None, key_path, passphrase)
                .is_ok()
                && session.authenticated()
            {
                return Ok("publickey-file");
            }
            warn!("SCP publickey-file auth failed for {}", auth.username);
        }

        if let Some(ref password) = auth.password {
            if session.userauth_password(&auth.username, password).is_ok() && session.authenticated() {
                return Ok("password");
            }
            warn!("SCP password auth failed for {}", auth.username);
        }

        Err(ScpError::auth_failed(format!(
            "All authentication methods exhausted for user '{}'",
            auth.username
        )))
    }
}

/// Try each resolved address in turn; the last failure is reported.
fn connect_any(
    addr: &str,
    candidates: impl IntoIterator<Item = SocketAddr>,
    timeout: Option<Duration>,
) -> ScpResult<TcpStream> {
    let mut last_error = None;
    for candidate in candidates {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&candidate, timeout),
            None => TcpStream::connect(candidate),
        };
        match attempt {
            Ok(tcp) => return Ok(tcp),
            Err(e) => {
                debug!("SCP connect to {} ({}) failed: {}", addr, candidate, e);
                last_error = Some(e);
            }
        }
    }
    Err(match last_error {
        Some(e) => ScpError::connection_failed(format!("TCP connection to {} failed: {}", addr, e)),
        None => ScpError::connection_failed(format!("'{}' did not resolve to any address", addr)),
    })
}

fn default_known_hosts() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ssh").join("known_hosts"))
}

impl ScpTransport for Ssh2Transport {
    type Session = Ssh2Session;

    fn open_session(
        &self,
        auth: &ScpAuthContext,
        host: &str,
        port: u16,
        listener: &dyn ScpLogListener,
    ) -> ScpResult<Ssh2Session> {
        let peer = format!("{}:{}", host, port);
        info!("SCP connecting to {}", peer);
        listener.log(Level::Info, &format!("Connecting to {}", peer));

        let tcp = self.connect_tcp(host, port)?;

        let mut session = Session::new()
            .map_err(|e| ScpError::connection_failed(format!("Failed to create SSH session: {}", e)))?;
        if let Some(timeout) = self.timeout {
            session.set_timeout(timeout.as_millis().min(u32::MAX as u128) as u32);
        }
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| ScpError::connection_failed(format!("SSH handshake failed: {}", e)))?;

        self.verify_host_key(listener, &session, auth, host, port)?;

        let method = self.authenticate(&session, auth)?;
        info!("SCP authenticated to {} via {}", peer, method);
        self.trace(listener, &format!("Authenticated as {} via {}", auth.username, method));

        Ok(Ssh2Session {
            session,
            peer,
            disconnected: false,
        })
    }
}

/// Authenticated libssh2 session.
pub struct Ssh2Session {
    session: Session,
    peer: String,
    disconnected: bool,
}

impl ScpTransportSession for Ssh2Session {
    type Channel = Ssh2Channel;

    fn open_command_channel(&mut self, command: &str) -> ScpResult<Ssh2Channel> {
        let channel = self
            .session
            .channel_session()
            .map_err(|e| ScpError::channel_failed(format!("Failed to open channel: {}", e)))?;
        Ok(Ssh2Channel {
            channel,
            command: command.to_string(),
            closed: false,
        })
    }

    fn disconnect(&mut self) {
        if self.disconnected {
            return;
        }
        self.disconnected = true;
        info!("SCP disconnecting from {}", self.peer);
        if let Err(e) = self.session.disconnect(None, "Client disconnecting", None) {
            warn!("SCP disconnect from {} failed: {}", self.peer, e);
        }
    }
}

/// Outbound half of an exec channel.
///
/// libssh2 has handed the bytes over by the time `write` returns, and
/// `Stream::flush` drops unread inbound data instead of pushing outbound
/// data, so `flush` is a no-op here.
pub struct Ssh2Writer<W = ssh2::Stream>(W);

impl<W: Write> Write for Ssh2Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Exec channel; both directions use stream 0 (stdin/stdout).
pub struct Ssh2Channel {
    channel: ssh2::Channel,
    command: String,
    closed: bool,
}

impl ScpCommandChannel for Ssh2Channel {
    type Input = ssh2::Stream;
    type Output = Ssh2Writer;

    fn output_stream(&mut self) -> ScpResult<Ssh2Writer> {
        Ok(Ssh2Writer(self.channel.stream(0)))
    }

    fn input_stream(&mut self) -> ScpResult<ssh2::Stream> {
        Ok(self.channel.stream(0))
    }

    fn connect(&mut self) -> ScpResult<()> {
        self.channel.exec(&self.command).map_err(|e| {
            ScpError::channel_failed(format!("Failed to execute command '{}': {}", self.command, e))
        })
    }

    fn disconnect(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // Best effort: the remote may already have exited.
        let _ = self.channel.send_eof();
        if let Err(e) = self.channel.close() {
            warn!("SCP channel close failed: {}", e);
            return;
        }
        if let Err(e) = self.channel.wait_close() {
            debug!("SCP channel wait_close failed: {}", e);
        }
    }
}
