// ── Transfer engine – one file pushed into a remote `scp -t` sink ────────────

use crate::scp::ack::{send_ack, wait_for_ack};
use crate::scp::error::{ScpError, ScpResult};
use crate::scp::listener::ScpLogListener;
use crate::scp::transport::ScpCommandChannel;
use crate::scp::types::*;
use chrono::Utc;
use log::{debug, info, warn, Level};
use std::fs::File;
use std::io::{Read, Write};

/// Payload chunk size; any size reproduces the file byte-for-byte.
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// `C0644 <len> <name>\n`
pub fn file_header(file_name: &str, len: u64) -> String {
    format!("C{} {} {}\n", SCP_FILE_MODE, len, file_name)
}

/// Drives the sink side of the SCP protocol over an already opened channel.
pub struct ScpSink<'a> {
    listener: &'a dyn ScpLogListener,
    buffer_size: usize,
}

impl<'a> ScpSink<'a> {
    pub fn new(listener: &'a dyn ScpLogListener) -> Self {
        Self {
            listener,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Open the channel's streams, start the remote command and upload
    /// `request.local_path`.
    pub fn execute<C: ScpCommandChannel>(
        &self,
        channel: &mut C,
        request: &ScpTransferRequest,
    ) -> ScpResult<ScpTransferStatistics> {
        let file_name = request.file_name()?;
        let mut local_file = File::open(&request.local_path).map_err(|e| {
            ScpError::io_error(format!(
                "Cannot open '{}': {}",
                request.local_path.display(),
                e
            ))
        })?;
        let len = local_file
            .metadata()
            .map_err(|e| ScpError::io_error(format!("Cannot stat local file: {}", e)))?
            .len();

        let mut out = channel.output_stream()?;
        let mut input = channel.input_stream()?;
        channel.connect()?;

        self.send_file(
            &mut input,
            &mut out,
            &mut local_file,
            &file_name,
            len,
            request.verbose,
        )
    }

    /// The protocol proper: ready ack, header, header ack, payload, trailing
    /// ack, final ack.  Each step aborts the upload on failure.
    pub fn send_file<R, W, F>(
        &self,
        input: &mut R,
        out: &mut W,
        source: &mut F,
        file_name: &str,
        len: u64,
        verbose: bool,
    ) -> ScpResult<ScpTransferStatistics>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
        F: Read + ?Sized,
    {
        wait_for_ack(input)?;

        let header = file_header(file_name, len);
        out.write_all(header.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| ScpError::io_error(format!("SCP write error: {}", e)))?;
        debug!(">>> {}", header.trim_end());

        wait_for_ack(input)?;

        if verbose {
            self.listener
                .log(Level::Info, &format!("Sending: {} : {}", file_name, len));
        }

        let started_at = Utc::now();
        let total_bytes = self.stream_payload(source, out)?;
        if total_bytes != len {
            warn!(
                "SCP header declared {} bytes for {} but {} were read",
                len, file_name, total_bytes
            );
        }

        send_ack(out)?;
        wait_for_ack(input)?;
        let finished_at = Utc::now();

        let stats = ScpTransferStatistics {
            file_name: file_name.to_string(),
            started_at,
            finished_at,
            total_bytes,
        };
        info!("SCP uploaded {} bytes of {}", total_bytes, file_name);
        if verbose {
            self.listener.log(Level::Info, &stats.summary());
        }
        Ok(stats)
    }

    fn stream_payload<F, W>(&self, source: &mut F, out: &mut W) -> ScpResult<u64>
    where
        F: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut buffer = vec![0u8; self.buffer_size];
        let mut transferred: u64 = 0;
        loop {
            let n = match source.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ScpError::io_error(format!("Local read error: {}", e))),
            };
            out.write_all(&buffer[..n])
                .map_err(|e| ScpError::io_error(format!("SCP write error: {}", e)))?;
            transferred += n as u64;
        }
        out.flush()
            .map_err(|e| ScpError::io_error(format!("SCP flush error: {}", e)))?;
        Ok(transferred)
    }
}
