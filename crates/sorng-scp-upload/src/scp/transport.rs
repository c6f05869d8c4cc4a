// ── Transport seam – sessions and exec channels consumed by the uploader ─────
//
// The uploader never talks to SSH directly.  It asks a transport for an
// authenticated session, asks the session for a channel bound to one remote
// command, and drives the channel's byte streams.  `Ssh2Transport` is the
// production implementation; tests plug in scripted doubles.

use crate::scp::error::ScpResult;
use crate::scp::listener::ScpLogListener;
use crate::scp::types::ScpAuthContext;
use std::io::{Read, Write};
use std::ops::{Deref, DerefMut};

/// Factory for authenticated sessions.
pub trait ScpTransport {
    type Session: ScpTransportSession;

    /// Connect and authenticate; fails with `ConnectionFailed` or `AuthFailed`.
    ///
    /// Connection progress is reported to `listener`.
    fn open_session(
        &self,
        auth: &ScpAuthContext,
        host: &str,
        port: u16,
        listener: &dyn ScpLogListener,
    ) -> ScpResult<Self::Session>;
}

/// An authenticated session able to run remote commands.
pub trait ScpTransportSession {
    type Channel: ScpCommandChannel;

    /// Fails with `ChannelFailed`.
    fn open_command_channel(&mut self, command: &str) -> ScpResult<Self::Channel>;

    fn disconnect(&mut self);
}

/// A channel bound to a single remote command invocation.
pub trait ScpCommandChannel {
    type Input: Read;
    type Output: Write;

    /// Bytes flowing to the remote command's stdin.
    fn output_stream(&mut self) -> ScpResult<Self::Output>;

    /// Bytes flowing from the remote command's stdout.
    fn input_stream(&mut self) -> ScpResult<Self::Input>;

    /// Start the remote command.
    fn connect(&mut self) -> ScpResult<()>;

    fn disconnect(&mut self);
}

// ── Scoped release ───────────────────────────────────────────────────────────

/// Disconnects the wrapped session exactly once when dropped.
pub(crate) struct SessionGuard<S: ScpTransportSession>(S);

impl<S: ScpTransportSession> SessionGuard<S> {
    pub(crate) fn new(session: S) -> Self {
        Self(session)
    }
}

impl<S: ScpTransportSession> Deref for SessionGuard<S> {
    type Target = S;
    fn deref(&self) -> &S {
        &self.0
    }
}

impl<S: ScpTransportSession> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.0
    }
}

impl<S: ScpTransportSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.0.disconnect();
    }
}

/// Disconnects the wrapped channel exactly once when dropped.
pub(crate) struct ChannelGuard<C: ScpCommandChannel>(C);

impl<C: ScpCommandChannel> ChannelGuard<C> {
    pub(crate) fn new(channel: C) -> Self {
        Self(channel)
    }
}

impl<C: ScpCommandChannel> Deref for ChannelGuard<C> {
    type Target = C;
    fn deref(&self) -> &C {
        &self.0
    }
}

impl<C: ScpCommandChannel> DerefMut for ChannelGuard<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.0
    }
}

impl<C: ScpCommandChannel> Drop for ChannelGuard<C> {
    fn drop(&mut self) {
        self.0.disconnect();
    }
}
