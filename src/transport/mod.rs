//! FTP transport primitives
//!
//! The client core only sequences calls to an [`FtpTransport`]; opening a
//! transport for an [`Endpoint`] is the job of a [`Connector`]. The default
//! implementation speaks FTP/FTPS over tokio sockets.

pub mod codec;
pub mod data_channel;
pub mod results;
pub mod tcp;
pub mod tls;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::TransportResult;
use crate::transfer::TransferMode;

pub use results::Reply;
pub use tcp::{TcpConnector, TcpTransport};

/// Byte stream usable as a control or data channel, plain or TLS.
pub trait NetStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> NetStream for T {}

/// Where and how to dial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Explicit FTPS (`AUTH TLS`)
    pub secure: bool,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One authenticated FTP session's primitive operations.
///
/// Every method maps to one protocol exchange; failures are reported as
/// `TransportError` and interpreted by the client layer.
#[async_trait]
pub trait FtpTransport: Send {
    async fn login(&mut self, user: Option<&str>, password: Option<&str>) -> TransportResult<()>;

    /// Choose passive (`PASV`) or active (`PORT`) data connections.
    async fn set_passive(&mut self, passive: bool) -> TransportResult<()>;

    async fn pwd(&mut self) -> TransportResult<String>;

    async fn chdir(&mut self, path: &str) -> TransportResult<()>;

    async fn mkdir(&mut self, path: &str) -> TransportResult<()>;

    /// Ask the server to reserve `size` bytes for the next upload.
    async fn alloc(&mut self, size: u64) -> TransportResult<()>;

    /// Upload a local file; returns the number of local bytes sent.
    async fn put(&mut self, local: &Path, remote: &str, mode: TransferMode) -> TransportResult<u64>;

    /// Download to a local file; returns the number of local bytes written.
    async fn get(&mut self, remote: &str, local: &Path, mode: TransferMode) -> TransportResult<u64>;

    async fn rename(&mut self, from: &str, to: &str) -> TransportResult<()>;

    async fn delete(&mut self, path: &str) -> TransportResult<()>;

    async fn rmdir(&mut self, path: &str) -> TransportResult<()>;

    /// Names under `path` (`NLST`).
    async fn nlist(&mut self, path: &str) -> TransportResult<Vec<String>>;

    /// Unparsed `LIST` lines.
    async fn raw_list(&mut self, path: &str) -> TransportResult<Vec<String>>;

    /// Size in bytes, `None` when the server cannot report it.
    async fn size(&mut self, path: &str) -> TransportResult<Option<u64>>;

    /// Last modification time, `None` when the server cannot report it.
    async fn mdtm(&mut self, path: &str) -> TransportResult<Option<DateTime<Utc>>>;

    async fn chmod(&mut self, path: &str, mode: u32) -> TransportResult<()>;

    async fn systype(&mut self) -> TransportResult<String>;

    async fn close(&mut self) -> TransportResult<()>;
}

/// Opens transports; the seam the connection manager dials through.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, endpoint: &Endpoint) -> TransportResult<Box<dyn FtpTransport>>;
}
