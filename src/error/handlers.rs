//! Error handlers
//!
//! Logging and classification helpers shared by the client layers.

use crate::error::types::{FtpClientError, TransportError, TransportErrorKind};
use log::{error, warn};

/// Log a hard client error.
pub fn handle_error(err: &FtpClientError) {
    error!("FTP client error ({}): {}", err.kind_name(), err);
}

/// Log an error that the caller chose to tolerate.
pub fn handle_tolerated(context: &str, err: &FtpClientError) {
    warn!("{}: {}", context, err);
}

/// Map a transport failure raised while opening or authenticating a session.
pub fn session_error(err: TransportError) -> FtpClientError {
    match err.kind {
        TransportErrorKind::AuthRejected => FtpClientError::Authentication(err.to_string()),
        _ => FtpClientError::Connection(err.to_string()),
    }
}

/// Map a transport failure raised by a single remote operation.
pub fn operation_error(operation: &'static str, path: &str, err: TransportError) -> FtpClientError {
    if err.is_fatal() {
        FtpClientError::Connection(format!("{} {}: {}", operation, path, err))
    } else {
        FtpClientError::operation(operation, path, err)
    }
}
