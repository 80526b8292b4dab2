//! Logging utilities
//!
//! Provides logging setup and configuration.

/// Setup logging for the client.
///
/// Honours `RUST_LOG`; calling it more than once is harmless.
pub fn setup_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Mask the argument of a `PASS` command before it reaches a log line.
pub fn redact_command(cmd: &str) -> String {
    if cmd.get(..4).is_some_and(|verb| verb.eq_ignore_ascii_case("PASS")) {
        "PASS ****".to_string()
    } else {
        cmd.to_string()
    }
}
