//! Single-byte acknowledgement handshake used at every SCP sink checkpoint.
//!
//! The sink answers each step with one code byte:
//! - `0` ok
//! - `1` error, followed by a diagnostic line
//! - `2` fatal error, followed by a diagnostic line
//!
//! Anything else, or a closed stream, is a protocol violation.

use crate::scp::error::{ScpError, ScpResult};
use std::io::{self, Read, Write};

const ACK: [u8; 1] = [0];

/// Decoded acknowledgement byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckCode {
    Ok,
    Error,
    FatalError,
    Unknown(u8),
}

impl From<u8> for AckCode {
    fn from(b: u8) -> Self {
        match b {
            0 => AckCode::Ok,
            1 => AckCode::Error,
            2 => AckCode::FatalError,
            other => AckCode::Unknown(other),
        }
    }
}

/// Write one zero byte and flush; the remote blocks until it arrives.
pub fn send_ack<W: Write + ?Sized>(out: &mut W) -> ScpResult<()> {
    out.write_all(&ACK)?;
    out.flush()?;
    log::trace!(">>> ack");
    Ok(())
}

/// Read one acknowledgement, failing with the remote's diagnostic on anything but `0`.
pub fn wait_for_ack<R: Read + ?Sized>(input: &mut R) -> ScpResult<()> {
    let code = match read_byte(input)? {
        Some(b) => b,
        None => return Err(ScpError::no_response()),
    };
    if AckCode::from(code) == AckCode::Ok {
        log::trace!("<<< ack");
        return Ok(());
    }

    let message = read_diagnostic(input, code)?;
    log::debug!("<<< code {} {:?}", code, message);
    Err(ScpError::from_ack(code, &message))
}

/// Collect bytes up to (not including) `\n`.
fn read_diagnostic<R: Read + ?Sized>(input: &mut R, code: u8) -> ScpResult<String> {
    let mut line = Vec::new();
    loop {
        match read_byte(input)? {
            Some(b'\n') => break,
            Some(b) => line.push(b),
            None => {
                return Err(ScpError::truncated(
                    code,
                    &String::from_utf8_lossy(&line),
                ))
            }
        }
    }
    Ok(String::from_utf8_lossy(&line).into_owned())
}

fn read_byte<R: Read + ?Sized>(input: &mut R) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
