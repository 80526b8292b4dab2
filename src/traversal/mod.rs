//! Recursive traversal engine
//!
//! Tree-level operations built on top of a single `FtpConnection`.

pub mod operations;
pub mod results;

pub use results::{
    DeleteReport, MirrorFailure, MirrorPolicy, MirrorReport, Outcome, Precondition,
};
