//! Single-line readiness handshake
//!
//! The contract is deliberately minimal: the first line of the remote role's
//! output is authoritative, and everything after it is ignored. There are no
//! retries and no structured error codes.

use std::io::Write;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::cookie::Cookie;
use crate::error::ProtocolError;

/// Prefix of the readiness line
pub const READY_MARKER: &str = "Cookie:";

/// Outcome of reading the remote role's first output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    /// Remote session is ready and shares this cookie
    Ready(Cookie),
    /// Remote side reported an error; the message is passed through verbatim
    Failed(String),
}

/// Write the readiness line and flush it
pub fn announce<W: Write + ?Sized>(out: &mut W, cookie: &Cookie) -> Result<(), ProtocolError> {
    writeln!(out, "{}{}", READY_MARKER, cookie)?;
    out.flush()?;
    Ok(())
}

/// Interpret the remote role's first output line
///
/// A line starting with the readiness marker and carrying a valid cookie is
/// `Ready`. Anything else, including a marker with a malformed cookie, is
/// surfaced as `Failed` with the line content.
pub fn parse_first_line(line: &str) -> Handshake {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.strip_prefix(READY_MARKER) {
        Some(rest) => match Cookie::new(rest) {
            Ok(cookie) => Handshake::Ready(cookie),
            Err(_) => Handshake::Failed(line.to_string()),
        },
        None if line.trim().is_empty() => {
            Handshake::Failed("remote coordinator produced an empty first line".to_string())
        }
        None => Handshake::Failed(line.to_string()),
    }
}

/// Read exactly the first line from `reader`, bounded by `timeout`
///
/// Returns `Ok(None)` if the timeout elapses before a line is available.
/// End of stream without any output is reported as `Failed`.
pub async fn read_handshake<R>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Option<Handshake>, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    match tokio::time::timeout(timeout, reader.read_line(&mut line)).await {
        Err(_) => Ok(None),
        Ok(Err(e)) => Err(e.into()),
        Ok(Ok(0)) => Ok(Some(Handshake::Failed(
            "remote coordinator exited without output".to_string(),
        ))),
        Ok(Ok(_)) => {
            tracing::debug!("Received first line from remote coordinator");
            Ok(Some(parse_first_line(&line)))
        }
    }
}
