//! FTP transfer modes
//!
//! Selects ascii or binary transfer from file extensions and performs the
//! newline translation ascii transfers require.

use std::fmt;
use std::path::Path;

/// Extensions transferred in ascii mode.
const TEXT_TYPES: &[&str] = &[
    "txt", "text", "php", "phps", "php4", "js", "css", "htm", "html", "phtml", "shtml", "log",
    "xml",
];

/// Representation type used on the data channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Ascii,
    Binary,
}

impl TransferMode {
    /// Argument of the `TYPE` command for this mode.
    pub fn type_code(self) -> &'static str {
        match self {
            TransferMode::Ascii => "A",
            TransferMode::Binary => "I",
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferMode::Ascii => write!(f, "ascii"),
            TransferMode::Binary => write!(f, "binary"),
        }
    }
}

/// Mode requested by a caller of `upload`/`download`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeSelection {
    #[default]
    Auto,
    Ascii,
    Binary,
}

impl ModeSelection {
    /// Resolve against the path being transferred.
    pub fn resolve(self, path: &str) -> TransferMode {
        match self {
            ModeSelection::Auto => mode_for_path(path),
            ModeSelection::Ascii => TransferMode::Ascii,
            ModeSelection::Binary => TransferMode::Binary,
        }
    }
}

/// Extension of the final path component; names without a dot count as `txt`.
pub fn extension_of(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());

    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => "txt".to_string(),
    }
}

/// Transfer mode for a file, chosen by extension.
pub fn mode_for_path(path: &str) -> TransferMode {
    let ext = extension_of(path);
    if TEXT_TYPES.contains(&ext.as_str()) {
        TransferMode::Ascii
    } else {
        TransferMode::Binary
    }
}

/// Convert local line endings to the network CRLF form.
pub fn to_network_ascii(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 32);
    let mut prev = 0u8;
    for &b in data {
        if b == b'\n' && prev != b'\r' {
            out.push(b'\r');
        }
        out.push(b);
        prev = b;
    }
    out
}

/// Convert network CRLF line endings to local `\n`.
pub fn from_network_ascii(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter().peekable();
    while let Some(&b) = iter.next() {
        if b == b'\r' && iter.peek() == Some(&&b'\n') {
            continue;
        }
        out.push(b);
    }
    out
}
