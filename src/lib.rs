//! RAX FTP Client
//!
//! An async FTP/FTPS client with lazily connected named sessions, single
//! remote operations, and recursive mirror/delete over one connection.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod transfer;
pub mod transport;
pub mod traversal;
pub mod utils;

pub use client::{ConnectionRegistry, FtpConfig, FtpConnection, FtpOption, SharedConnection};
pub use config::Settings;
pub use context::AppContext;
pub use error::{FtpClientError, FtpResult};
pub use transfer::{ModeSelection, TransferMode};
pub use traversal::{DeleteReport, MirrorPolicy, MirrorReport, Outcome, Precondition};
