//! Client connection management
//!
//! Connection configuration, lifecycle, single remote operations, and the
//! registry of named connections.

pub mod operations;
pub mod options;
pub mod registry;
pub mod state;

pub use options::{FtpConfig, FtpOption};
pub use registry::{ConnectionRegistry, SharedConnection};
pub use state::FtpConnection;
