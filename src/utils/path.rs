//! Remote path helpers
//!
//! Remote paths are always `/`-separated regardless of the local platform.

/// Ensure exactly one trailing `/`.
pub fn with_trailing_slash(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("{}/", trimmed)
    }
}

/// Join a remote directory and an entry name.
pub fn join_remote(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        return name.to_string();
    }
    format!("{}{}", with_trailing_slash(dir), name.trim_start_matches('/'))
}

/// Resolve a remote path against a working directory.
pub fn absolutize(cwd: &str, path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        join_remote(cwd, path)
    }
}

/// Turn an NLST entry into a path usable from the listed directory.
///
/// Servers answer either with bare names or with names prefixed by the
/// requested path; `None` marks the `.`/`..` pseudo entries.
pub fn listed_entry_path(dir: &str, entry: &str) -> Option<String> {
    let entry = entry.trim_end_matches('/');
    let name = entry.rsplit('/').next().unwrap_or(entry);
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    let dir = with_trailing_slash(dir);
    if entry.starts_with('/') || entry.starts_with(&dir) {
        Some(entry.to_string())
    } else {
        Some(format!("{}{}", dir, entry))
    }
}
