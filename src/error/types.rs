//! Error types
//!
//! Defines the transport-level error and the client-facing error taxonomy.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Classification of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// TCP connect or DNS resolution failure
    ConnectFailed,
    /// AUTH TLS rejected or TLS handshake failure
    Tls,
    /// USER/PASS rejected
    AuthRejected,
    /// Server answered a command with a 4xx/5xx reply
    Rejected,
    /// PASV/PORT data connection could not be set up
    DataChannel,
    /// Reply could not be parsed
    Protocol,
    /// Server closed the control connection
    Disconnected,
    /// No reply within the configured timeout
    Timeout,
    /// Local I/O failure during a transfer
    Io,
}

/// Failure reported by an `FtpTransport` primitive
#[derive(Debug, Clone)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    /// FTP reply code that triggered the error, if any
    pub code: Option<u16>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    pub fn connect_failed(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::ConnectFailed, message)
    }

    pub fn tls(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Tls, message)
    }

    pub fn data_channel(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::DataChannel, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Protocol, message)
    }

    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Disconnected, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    /// Login rejected with the given reply.
    pub fn auth_rejected(code: u16, text: &str) -> Self {
        Self {
            kind: TransportErrorKind::AuthRejected,
            message: text.to_string(),
            code: Some(code),
        }
    }

    /// Classify an FTP reply into a transport error.
    pub fn from_reply(code: u16, text: &str) -> Self {
        let kind = match code {
            421 => TransportErrorKind::Disconnected,
            425 | 426 => TransportErrorKind::DataChannel,
            430 | 530 | 532 => TransportErrorKind::AuthRejected,
            _ => TransportErrorKind::Rejected,
        };
        Self {
            kind,
            message: text.to_string(),
            code: Some(code),
        }
    }

    /// Whether the control connection is unusable after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Disconnected
                | TransportErrorKind::Timeout
                | TransportErrorKind::ConnectFailed
        )
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{:?} {}] {}", self.kind, code, self.message),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::TimedOut => Self::timeout(error.to_string()),
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::disconnected(error.to_string()),
            _ => Self::new(TransportErrorKind::Io, error.to_string()),
        }
    }
}

impl From<native_tls::Error> for TransportError {
    fn from(error: native_tls::Error) -> Self {
        Self::tls(error.to_string())
    }
}

/// Client-facing error taxonomy
#[derive(Debug)]
pub enum FtpClientError {
    /// Missing or invalid configuration
    Configuration(String),
    /// Transport could not be opened, or the handle is gone
    Connection(String),
    /// Login rejected by the server
    Authentication(String),
    /// A single remote operation failed
    Operation {
        operation: &'static str,
        path: String,
        reason: String,
    },
    /// Local source file missing at upload time
    SourceNotFound(PathBuf),
    /// Server rejected space pre-allocation
    Allocation(String),
    /// Local filesystem failure
    Io(io::Error),
}

impl FtpClientError {
    pub fn operation(
        operation: &'static str,
        path: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        FtpClientError::Operation {
            operation,
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Short label for the error kind, used in log lines.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FtpClientError::Configuration(_) => "configuration",
            FtpClientError::Connection(_) => "connection",
            FtpClientError::Authentication(_) => "authentication",
            FtpClientError::Operation { .. } => "operation",
            FtpClientError::SourceNotFound(_) => "source-not-found",
            FtpClientError::Allocation(_) => "allocation",
            FtpClientError::Io(_) => "io",
        }
    }
}

impl fmt::Display for FtpClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpClientError::Configuration(msg) => write!(f, "FTP configuration error: {}", msg),
            FtpClientError::Connection(msg) => write!(f, "FTP connection error: {}", msg),
            FtpClientError::Authentication(msg) => write!(f, "FTP unable to login: {}", msg),
            FtpClientError::Operation {
                operation,
                path,
                reason,
            } => write!(f, "FTP unable to {} {}: {}", operation, path, reason),
            FtpClientError::SourceNotFound(p) => {
                write!(f, "FTP no source file: {}", p.display())
            }
            FtpClientError::Allocation(msg) => write!(
                f,
                "Unable to allocate space on server. Server said: {}",
                msg
            ),
            FtpClientError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for FtpClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FtpClientError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FtpClientError {
    fn from(error: io::Error) -> Self {
        FtpClientError::Io(error)
    }
}

impl From<config::ConfigError> for FtpClientError {
    fn from(error: config::ConfigError) -> Self {
        FtpClientError::Configuration(error.to_string())
    }
}

pub type FtpResult<T> = Result<T, FtpClientError>;
pub type TransportResult<T> = Result<T, TransportError>;
