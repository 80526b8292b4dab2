//! FTP/FTPS transport over tokio sockets
//!
//! Lifecycle: TCP connect → banner → optional `AUTH TLS` upgrade → login.
//! Each transfer negotiates a fresh data connection.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info};
use std::io;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_native_tls::TlsConnector;

use crate::error::{TransportError, TransportResult};
use crate::transfer::TransferMode;
use crate::transfer::modes::{from_network_ascii, to_network_ascii};
use crate::transport::codec::Codec;
use crate::transport::data_channel::{self, PendingData};
use crate::transport::results::Reply;
use crate::transport::{Connector, Endpoint, FtpTransport, NetStream, tls};

/// An open control connection
pub struct TcpTransport {
    codec: Codec<Box<dyn NetStream>>,
    host: String,
    peer_ip: IpAddr,
    local_ip: IpAddr,
    tls: Option<TlsConnector>,
    passive: bool,
    timeout: Duration,
    current_type: Option<TransferMode>,
}

impl TcpTransport {
    /// Dial the endpoint, read the banner, and secure the channel if requested.
    pub async fn connect(endpoint: &Endpoint) -> TransportResult<Self> {
        let addr = endpoint.address();
        let tcp = timeout(endpoint.timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| TransportError::timeout(format!("connect to {} timed out", addr)))?
            .map_err(|e| TransportError::connect_failed(format!("connect to {}: {}", addr, e)))?;
        tcp.set_nodelay(true).ok();
        let peer_ip = tcp.peer_addr()?.ip();
        let local_ip = tcp.local_addr()?.ip();

        let mut plain = Codec::new(tcp, endpoint.timeout);
        let banner = plain.read_reply().await?;
        if !banner.is_completion() {
            return Err(TransportError::connect_failed(format!(
                "server refused session: {}",
                banner.text()
            )));
        }
        info!("Connected to {}: {}", addr, banner.message());

        let (codec, tls) = if endpoint.secure {
            plain
                .expect_ok("AUTH TLS")
                .await
                .map_err(|e| TransportError::tls(format!("AUTH TLS rejected: {}", e)))?;
            let connector = tls::build_connector()?;
            let secured = tls::wrap(&connector, &endpoint.host, plain.into_inner()).await?;
            let stream: Box<dyn NetStream> = Box::new(secured);
            let mut codec = Codec::new(stream, endpoint.timeout);
            codec.expect_ok("PBSZ 0").await?;
            codec.expect_ok("PROT P").await?;
            debug!("Control channel to {} secured", addr);
            (codec, Some(connector))
        } else {
            let stream: Box<dyn NetStream> = Box::new(plain.into_inner());
            (Codec::new(stream, endpoint.timeout), None)
        };

        Ok(Self {
            codec,
            host: endpoint.host.clone(),
            peer_ip,
            local_ip,
            tls,
            passive: true,
            timeout: endpoint.timeout,
            current_type: None,
        })
    }

    async fn set_type(&mut self, mode: TransferMode) -> TransportResult<()> {
        if self.current_type != Some(mode) {
            self.codec
                .expect_ok(&format!("TYPE {}", mode.type_code()))
                .await?;
            self.current_type = Some(mode);
        }
        Ok(())
    }

    /// Negotiate a data connection and issue the transfer command on it.
    async fn open_data(&mut self, command: &str) -> TransportResult<Box<dyn NetStream>> {
        let pending = if self.passive {
            data_channel::negotiate_passive(&mut self.codec, self.peer_ip, self.timeout).await?
        } else {
            data_channel::negotiate_active(&mut self.codec, self.local_ip).await?
        };

        let reply = self.codec.execute(command).await?;
        if !reply.is_preliminary() {
            return Err(TransportError::from_reply(reply.code, &reply.text()));
        }

        match self.attach(pending).await {
            Ok(stream) => Ok(stream),
            Err(e) => {
                // The command was accepted, so its completion reply is still owed.
                self.codec.read_reply().await?;
                Err(e)
            }
        }
    }

    async fn attach(&mut self, pending: PendingData) -> TransportResult<Box<dyn NetStream>> {
        let tcp = pending.establish(self.timeout).await?;
        let stream: Box<dyn NetStream> = match &self.tls {
            Some(connector) => Box::new(tls::wrap(connector, &self.host, tcp).await?),
            None => Box::new(tcp),
        };
        Ok(stream)
    }

    /// Read the completion reply that follows a closed data connection.
    async fn finish_transfer(&mut self) -> TransportResult<Reply> {
        let reply = self.codec.read_reply().await?;
        if !reply.is_completion() {
            return Err(TransportError::from_reply(reply.code, &reply.text()));
        }
        Ok(reply)
    }

    /// Read the completion reply even when the data stream failed.
    ///
    /// A negative reply wins over the stream error it usually explains.
    async fn conclude(&mut self, streamed: io::Result<()>) -> TransportResult<Reply> {
        let finished = self.finish_transfer().await;
        match (streamed, finished) {
            (_, Err(e)) => Err(e),
            (Err(e), Ok(_)) => Err(TransportError::data_channel(format!("data transfer: {}", e))),
            (Ok(()), Ok(reply)) => Ok(reply),
        }
    }

    async fn read_listing(&mut self, command: &str) -> TransportResult<Vec<String>> {
        self.set_type(TransferMode::Ascii).await?;
        let mut stream = self.open_data(command).await?;
        let mut buf = Vec::new();
        let streamed = stream.read_to_end(&mut buf).await.map(|_| ());
        drop(stream);
        self.conclude(streamed).await?;

        Ok(String::from_utf8_lossy(&buf)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Send a query whose 4xx/5xx answer means "unknown" rather than failure.
    async fn query(&mut self, cmd: &str) -> TransportResult<Option<Reply>> {
        let reply = self.codec.execute(cmd).await?;
        match reply.code {
            421 => Err(TransportError::from_reply(reply.code, &reply.text())),
            200..=299 => Ok(Some(reply)),
            400..=599 => Ok(None),
            _ => Err(TransportError::protocol(format!(
                "unexpected reply to {}: {}",
                cmd,
                reply.text()
            ))),
        }
    }
}

#[async_trait]
impl FtpTransport for TcpTransport {
    async fn login(&mut self, user: Option<&str>, password: Option<&str>) -> TransportResult<()> {
        let user = user.unwrap_or("anonymous");
        let mut reply = self.codec.execute(&format!("USER {}", user)).await?;
        if reply.is_intermediate() {
            reply = self
                .codec
                .execute(&format!("PASS {}", password.unwrap_or("")))
                .await?;
        }
        if !reply.is_completion() {
            return Err(TransportError::auth_rejected(reply.code, &reply.text()));
        }
        info!("Logged in to {} as {}", self.host, user);
        Ok(())
    }

    async fn set_passive(&mut self, passive: bool) -> TransportResult<()> {
        self.passive = passive;
        Ok(())
    }

    async fn pwd(&mut self) -> TransportResult<String> {
        let reply = self.codec.expect_ok("PWD").await?;
        parse_quoted_path(reply.message())
            .ok_or_else(|| TransportError::protocol(format!("cannot parse PWD reply: {}", reply.text())))
    }

    async fn chdir(&mut self, path: &str) -> TransportResult<()> {
        self.codec.expect_ok(&format!("CWD {}", path)).await?;
        Ok(())
    }

    async fn mkdir(&mut self, path: &str) -> TransportResult<()> {
        self.codec.expect_ok(&format!("MKD {}", path)).await?;
        Ok(())
    }

    async fn alloc(&mut self, size: u64) -> TransportResult<()> {
        let reply = self.codec.execute(&format!("ALLO {}", size)).await?;
        match reply.code {
            200..=299 => Ok(()),
            500 | 502 | 504 => {
                debug!("ALLO not supported by {}: {}", self.host, reply.message());
                Ok(())
            }
            _ => Err(TransportError::from_reply(reply.code, &reply.text())),
        }
    }

    async fn put(&mut self, local: &Path, remote: &str, mode: TransferMode) -> TransportResult<u64> {
        let data = fs::read(local).await?;
        let sent = data.len() as u64;
        let payload = match mode {
            TransferMode::Ascii => to_network_ascii(&data),
            TransferMode::Binary => data,
        };

        self.set_type(mode).await?;
        let mut stream = self.open_data(&format!("STOR {}", remote)).await?;
        let streamed = async {
            stream.write_all(&payload).await?;
            stream.shutdown().await
        }
        .await;
        drop(stream);
        self.conclude(streamed).await?;

        debug!("Stored {} ({} bytes, {})", remote, sent, mode);
        Ok(sent)
    }

    async fn get(&mut self, remote: &str, local: &Path, mode: TransferMode) -> TransportResult<u64> {
        self.set_type(mode).await?;
        let mut stream = self.open_data(&format!("RETR {}", remote)).await?;
        let mut buf = Vec::new();
        let streamed = stream.read_to_end(&mut buf).await.map(|_| ());
        drop(stream);
        self.conclude(streamed).await?;

        let data = match mode {
            TransferMode::Ascii => from_network_ascii(&buf),
            TransferMode::Binary => buf,
        };
        fs::write(local, &data).await?;

        debug!("Retrieved {} ({} bytes, {})", remote, data.len(), mode);
        Ok(data.len() as u64)
    }

    async fn rename(&mut self, from: &str, to: &str) -> TransportResult<()> {
        self.codec.expect(&format!("RNFR {}", from), 3).await?;
        self.codec.expect_ok(&format!("RNTO {}", to)).await?;
        Ok(())
    }

    async fn delete(&mut self, path: &str) -> TransportResult<()> {
        self.codec.expect_ok(&format!("DELE {}", path)).await?;
        Ok(())
    }

    async fn rmdir(&mut self, path: &str) -> TransportResult<()> {
        self.codec.expect_ok(&format!("RMD {}", path)).await?;
        Ok(())
    }

    async fn nlist(&mut self, path: &str) -> TransportResult<Vec<String>> {
        self.read_listing(&format!("NLST {}", path)).await
    }

    async fn raw_list(&mut self, path: &str) -> TransportResult<Vec<String>> {
        self.read_listing(&format!("LIST {}", path)).await
    }

    async fn size(&mut self, path: &str) -> TransportResult<Option<u64>> {
        self.set_type(TransferMode::Binary).await?;
        match self.query(&format!("SIZE {}", path)).await? {
            Some(reply) => reply
                .message()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| TransportError::protocol(format!("bad SIZE reply: {}", reply.text()))),
            None => Ok(None),
        }
    }

    async fn mdtm(&mut self, path: &str) -> TransportResult<Option<DateTime<Utc>>> {
        match self.query(&format!("MDTM {}", path)).await? {
            Some(reply) => parse_mdtm(reply.message())
                .map(Some)
                .ok_or_else(|| TransportError::protocol(format!("bad MDTM reply: {}", reply.text()))),
            None => Ok(None),
        }
    }

    async fn chmod(&mut self, path: &str, mode: u32) -> TransportResult<()> {
        self.codec
            .expect_ok(&format!("SITE CHMOD {:o} {}", mode, path))
            .await?;
        Ok(())
    }

    async fn systype(&mut self) -> TransportResult<String> {
        let reply = self.codec.expect_ok("SYST").await?;
        Ok(reply.message().to_string())
    }

    async fn close(&mut self) -> TransportResult<()> {
        let result = self.codec.execute("QUIT").await;
        let _ = self.codec.get_mut().shutdown().await;
        info!("Disconnected from {}", self.host);
        result.map(|_| ())
    }
}

/// Dials [`TcpTransport`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn open(&self, endpoint: &Endpoint) -> TransportResult<Box<dyn FtpTransport>> {
        let transport: Box<dyn FtpTransport> = Box::new(TcpTransport::connect(endpoint).await?);
        Ok(transport)
    }
}

/// Extract the quoted path of a 257 reply; `""` inside quotes is a literal quote.
fn parse_quoted_path(message: &str) -> Option<String> {
    let start = message.find('"')? + 1;
    let mut path = String::new();
    let mut chars = message[start..].chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                path.push('"');
            } else {
                return Some(path);
            }
        } else {
            path.push(c);
        }
    }
    None
}

/// Parse `YYYYMMDDHHMMSS[.sss]` as UTC.
fn parse_mdtm(message: &str) -> Option<DateTime<Utc>> {
    let stamp = message.get(..14)?;
    NaiveDateTime::parse_from_str(stamp, "%Y%m%d%H%M%S")
        .ok()
        .map(|t| t.and_utc())
}
