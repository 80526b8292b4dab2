//! Control channel codec (RFC 959 §4.2)
//!
//! Sends CRLF-terminated commands and reads single and multi-line replies.

use log::trace;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;

use crate::error::{TransportError, TransportResult};
use crate::transport::results::Reply;
use crate::utils::logging::redact_command;

/// Command/reply codec over any byte stream
pub struct Codec<S> {
    stream: BufReader<S>,
    timeout: Duration,
}

impl<S> Codec<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self {
            stream: BufReader::new(stream),
            timeout,
        }
    }

    /// Give back the underlying stream, e.g. for a TLS upgrade.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }

    pub fn get_mut(&mut self) -> &mut S {
        self.stream.get_mut()
    }

    /// Send a command; the CRLF terminator is appended here.
    pub async fn send(&mut self, cmd: &str) -> TransportResult<()> {
        trace!(">>> {}", redact_command(cmd));
        let line = format!("{}\r\n", cmd);
        let writer = self.stream.get_mut();
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> TransportResult<String> {
        let mut buf = Vec::new();
        let n = timeout(self.timeout, self.stream.read_until(b'\n', &mut buf))
            .await
            .map_err(|_| TransportError::timeout("no reply from server"))??;
        if n == 0 {
            return Err(TransportError::disconnected("server closed the control connection"));
        }
        let line = String::from_utf8_lossy(&buf);
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read one complete reply.
    pub async fn read_reply(&mut self) -> TransportResult<Reply> {
        let first = self.read_line().await?;
        let code = parse_code(&first)?;
        let mut lines = vec![first];

        if lines[0].as_bytes().get(3) == Some(&b'-') {
            let terminator = format!("{} ", code);
            loop {
                let next = self.read_line().await?;
                let done = next.starts_with(&terminator) || next == code.to_string();
                lines.push(next);
                if done {
                    break;
                }
            }
        }

        let reply = Reply { code, lines };
        trace!("<<< {}", reply.lines.last().map(String::as_str).unwrap_or(""));
        Ok(reply)
    }

    /// Send a command and read its reply.
    pub async fn execute(&mut self, cmd: &str) -> TransportResult<Reply> {
        self.send(cmd).await?;
        self.read_reply().await
    }

    /// Send a command and require a reply of the given class (1..=5).
    pub async fn expect(&mut self, cmd: &str, class: u16) -> TransportResult<Reply> {
        let reply = self.execute(cmd).await?;
        if reply.code / 100 != class {
            return Err(TransportError::from_reply(reply.code, &reply.text()));
        }
        Ok(reply)
    }

    /// Send a command and require a 2xx reply.
    pub async fn expect_ok(&mut self, cmd: &str) -> TransportResult<Reply> {
        self.expect(cmd, 2).await
    }
}

fn parse_code(line: &str) -> TransportResult<u16> {
    line.get(..3)
        .and_then(|c| c.parse::<u16>().ok())
        .filter(|c| (100..600).contains(c))
        .ok_or_else(|| TransportError::protocol(format!("invalid reply: '{}'", line)))
}
