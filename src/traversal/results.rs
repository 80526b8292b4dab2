//! Result types for traversal operations

use std::fmt;
use std::path::PathBuf;

/// Outcome of a traversal that can be declined before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    /// A precondition did not hold; nothing was changed on this level.
    Declined(Precondition),
}

impl<T> Outcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Declined(_) => None,
        }
    }

    pub fn declined(&self) -> Option<&Precondition> {
        match self {
            Outcome::Completed(_) => None,
            Outcome::Declined(reason) => Some(reason),
        }
    }
}

/// Precondition that made a traversal decline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The session could not be established.
    NotConnected(String),
    /// The local directory could not be enumerated.
    LocalUnreadable(PathBuf),
    /// The remote directory could neither be entered nor created.
    RemoteUnavailable(String),
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::NotConnected(reason) => write!(f, "not connected: {}", reason),
            Precondition::LocalUnreadable(path) => {
                write!(f, "cannot read local directory {}", path.display())
            }
            Precondition::RemoteUnavailable(path) => {
                write!(f, "cannot enter or create remote directory {}", path)
            }
        }
    }
}

/// What `mirror` does when a single entry fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MirrorPolicy {
    /// Log the failure, record it in the report, and carry on.
    #[default]
    Continue,
    /// Stop and return the first failure as an error.
    AbortOnFirst,
}

/// One entry that could not be mirrored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorFailure {
    /// Remote target of the entry
    pub path: String,
    pub reason: String,
}

/// Result of a completed `mirror`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    pub files_uploaded: usize,
    pub bytes_uploaded: u64,
    pub directories_created: usize,
    pub failures: Vec<MirrorFailure>,
}

impl MirrorReport {
    /// True when every entry made it across.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of a completed `delete_dir`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub files_deleted: usize,
    /// Includes the requested directory itself
    pub directories_removed: usize,
}
