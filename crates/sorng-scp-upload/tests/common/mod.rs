//! Scripted in-memory transport for driving the uploader without a network.

#![allow(dead_code)]

use sorng_scp_upload::scp::*;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct TrackerState {
    pub sessions_opened: u32,
    pub commands: Vec<String>,
    pub written: Vec<u8>,
    pub channel_disconnects: u32,
    pub session_disconnects: u32,
    /// Lifecycle calls in order: "session", "channel", "connect",
    /// "channel-disconnect", "session-disconnect".
    pub events: Vec<&'static str>,
    pub last_auth: Option<(String, String, u16)>,
}

/// Shared view of everything the mock saw.
#[derive(Debug, Clone, Default)]
pub struct Tracker(Arc<Mutex<TrackerState>>);

impl Tracker {
    pub fn state(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        self.0.lock().unwrap()
    }
}

pub struct MockTransport {
    pub replies: Vec<u8>,
    pub tracker: Tracker,
    pub session_error: Option<ScpError>,
    pub channel_error: Option<ScpError>,
    /// Remote stdin breaks after this many successful writes.
    pub fail_after_writes: Option<usize>,
}

impl MockTransport {
    /// Remote replies `replies` byte-for-byte, then closes its stream.
    pub fn replying(replies: &[u8]) -> Self {
        Self {
            replies: replies.to_vec(),
            tracker: Tracker::default(),
            session_error: None,
            channel_error: None,
            fail_after_writes: None,
        }
    }
}

impl ScpTransport for MockTransport {
    type Session = MockSession;

    fn open_session(
        &self,
        auth: &ScpAuthContext,
        host: &str,
        port: u16,
        listener: &dyn ScpLogListener,
    ) -> ScpResult<MockSession> {
        listener.log(log::Level::Info, &format!("Connecting to {}:{}", host, port));
        {
            let mut st = self.tracker.state();
            st.last_auth = Some((auth.username.clone(), host.to_string(), port));
        }
        if let Some(e) = &self.session_error {
            return Err(e.clone());
        }
        let mut st = self.tracker.state();
        st.sessions_opened += 1;
        st.events.push("session");
        Ok(MockSession {
            replies: self.replies.clone(),
            tracker: self.tracker.clone(),
            channel_error: self.channel_error.clone(),
            fail_after_writes: self.fail_after_writes,
        })
    }
}

pub struct MockSession {
    replies: Vec<u8>,
    tracker: Tracker,
    channel_error: Option<ScpError>,
    fail_after_writes: Option<usize>,
}

impl ScpTransportSession for MockSession {
    type Channel = MockChannel;

    fn open_command_channel(&mut self, command: &str) -> ScpResult<MockChannel> {
        self.tracker.state().commands.push(command.to_string());
        if let Some(e) = &self.channel_error {
            return Err(e.clone());
        }
        self.tracker.state().events.push("channel");
        Ok(MockChannel {
            replies: self.replies.clone(),
            tracker: self.tracker.clone(),
            fail_after_writes: self.fail_after_writes,
        })
    }

    fn disconnect(&mut self) {
        let mut st = self.tracker.state();
        st.session_disconnects += 1;
        st.events.push("session-disconnect");
    }
}

pub struct MockChannel {
    replies: Vec<u8>,
    tracker: Tracker,
    fail_after_writes: Option<usize>,
}

impl ScpCommandChannel for MockChannel {
    type Input = Cursor<Vec<u8>>;
    type Output = RecordingWriter;

    fn output_stream(&mut self) -> ScpResult<RecordingWriter> {
        Ok(RecordingWriter {
            tracker: self.tracker.clone(),
            remaining_writes: self.fail_after_writes,
        })
    }

    fn input_stream(&mut self) -> ScpResult<Cursor<Vec<u8>>> {
        Ok(Cursor::new(self.replies.clone()))
    }

    fn connect(&mut self) -> ScpResult<()> {
        self.tracker.state().events.push("connect");
        Ok(())
    }

    fn disconnect(&mut self) {
        let mut st = self.tracker.state();
        st.channel_disconnects += 1;
        st.events.push("channel-disconnect");
    }
}

/// Appends everything sent to the remote into the tracker.
pub struct RecordingWriter {
    tracker: Tracker,
    remaining_writes: Option<usize>,
}

impl Write for RecordingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.remaining_writes.as_mut() {
            Some(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "pipe gone",
                ))
            }
            Some(n) => *n -= 1,
            None => {}
        }
        self.tracker.state().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Listener collecting every message.
#[derive(Default)]
pub struct CollectingListener(pub Mutex<Vec<(log::Level, String)>>);

impl ScpLogListener for CollectingListener {
    fn log(&self, level: log::Level, message: &str) {
        self.0.lock().unwrap().push((level, message.to_string()));
    }
}

pub fn config(remote_directory: &str) -> ScpConfig {
    let mut cfg = ScpConfig::new("files.example", "deploy");
    cfg.remote_directory = remote_directory.to_string();
    cfg
}

pub fn local_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
