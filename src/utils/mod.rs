//! Utility functions
//!
//! Logging setup, size formatting, and remote path helpers.

pub mod format;
pub mod logging;
pub mod path;
