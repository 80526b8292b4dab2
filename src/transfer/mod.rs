//! Transfer mode handling
//!
//! Chooses ascii or binary transfers and translates line endings.

pub mod modes;

pub use modes::{ModeSelection, TransferMode, mode_for_path};
