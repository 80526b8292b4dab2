//! Connection options
//!
//! Holds the recognized configuration keys of one named connection and
//! resolves them into an [`Endpoint`] at connect time.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{FtpClientError, FtpResult};
use crate::transport::Endpoint;

pub const DEFAULT_PORT: u16 = 21;
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// One recognized configuration option with a typed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FtpOption {
    Host(String),
    User(String),
    Password(String),
    Port(u16),
    Passive(bool),
    /// Explicit FTPS
    Ssh(bool),
    /// Seconds
    Timeout(u64),
}

impl FtpOption {
    /// Parse a `key = value` pair; unknown keys and unparsable values are rejected.
    pub fn parse(key: &str, value: &str) -> FtpResult<Self> {
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "host" => Ok(FtpOption::Host(value.to_string())),
            "user" => Ok(FtpOption::User(value.to_string())),
            "password" => Ok(FtpOption::Password(value.to_string())),
            "port" => value
                .parse::<u16>()
                .map(FtpOption::Port)
                .map_err(|_| invalid_value(key, value)),
            "passive" => parse_bool(value)
                .map(FtpOption::Passive)
                .ok_or_else(|| invalid_value(key, value)),
            "ssh" => parse_bool(value)
                .map(FtpOption::Ssh)
                .ok_or_else(|| invalid_value(key, value)),
            "timeout" => value
                .parse::<u64>()
                .map(FtpOption::Timeout)
                .map_err(|_| invalid_value(key, value)),
            other => Err(FtpClientError::Configuration(format!(
                "unrecognized FTP option '{}'",
                other
            ))),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            FtpOption::Host(_) => "host",
            FtpOption::User(_) => "user",
            FtpOption::Password(_) => "password",
            FtpOption::Port(_) => "port",
            FtpOption::Passive(_) => "passive",
            FtpOption::Ssh(_) => "ssh",
            FtpOption::Timeout(_) => "timeout",
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid_value(key: &str, value: &str) -> FtpClientError {
    FtpClientError::Configuration(format!("invalid value '{}' for FTP option '{}'", value, key))
}

/// Configuration of one connection; unset fields fall back to defaults at connect time
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FtpConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    pub passive: Option<bool>,
    pub ssh: Option<bool>,
    /// Seconds
    pub timeout: Option<u64>,
}

impl FtpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no option has been set at all.
    pub fn is_empty(&self) -> bool {
        *self == FtpConfig::default()
    }

    /// Apply one option.
    pub fn apply(&mut self, option: FtpOption) {
        match option {
            FtpOption::Host(v) => self.host = Some(v),
            FtpOption::User(v) => self.user = Some(v),
            FtpOption::Password(v) => self.password = Some(v),
            FtpOption::Port(v) => self.port = Some(v),
            FtpOption::Passive(v) => self.passive = Some(v),
            FtpOption::Ssh(v) => self.ssh = Some(v),
            FtpOption::Timeout(v) => self.timeout = Some(v),
        }
    }

    /// Apply every `key => value` pair; stops at the first unrecognized key.
    pub fn apply_map<K, V>(&mut self, values: &HashMap<K, V>) -> FtpResult<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parsed = Vec::with_capacity(values.len());
        for (key, value) in values {
            parsed.push(FtpOption::parse(key.as_ref(), value.as_ref())?);
        }
        for option in parsed {
            self.apply(option);
        }
        Ok(())
    }

    // --------------------
    // Builder-style setters
    // --------------------

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn passive(mut self, passive: bool) -> Self {
        self.passive = Some(passive);
        self
    }

    pub fn ssh(mut self, ssh: bool) -> Self {
        self.ssh = Some(ssh);
        self
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }

    // --------------------
    // Resolution
    // --------------------

    /// Passive mode unless explicitly disabled.
    pub fn passive_mode(&self) -> bool {
        self.passive.unwrap_or(true)
    }

    /// Credentials with empty strings treated as absent.
    pub fn credentials(&self) -> (Option<&str>, Option<&str>) {
        fn non_empty(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|s| !s.is_empty())
        }
        (non_empty(&self.user), non_empty(&self.password))
    }

    /// Validate and fill in defaults for port, timeout, and ssh.
    pub fn endpoint(&self) -> FtpResult<Endpoint> {
        if self.is_empty() {
            return Err(FtpClientError::Configuration("FTP config not set".into()));
        }
        let host = self
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| FtpClientError::Configuration("FTP host not set".into()))?;
        if self.port == Some(0) {
            return Err(FtpClientError::Configuration("FTP port cannot be 0".into()));
        }
        if self.timeout == Some(0) {
            return Err(FtpClientError::Configuration("FTP timeout cannot be 0".into()));
        }

        Ok(Endpoint {
            host: host.to_string(),
            port: self.port.unwrap_or(DEFAULT_PORT),
            secure: self.ssh.unwrap_or(false),
            timeout: Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_options() {
        assert_eq!(
            FtpOption::parse("host", "ftp.example.com").unwrap(),
            FtpOption::Host("ftp.example.com".into())
        );
        assert_eq!(FtpOption::parse("PORT", "2121").unwrap(), FtpOption::Port(2121));
        assert_eq!(
            FtpOption::parse("passive", "false").unwrap(),
            FtpOption::Passive(false)
        );
        assert_eq!(FtpOption::parse("ssh", "1").unwrap(), FtpOption::Ssh(true));
        assert_eq!(FtpOption::parse("timeout", "30").unwrap(), FtpOption::Timeout(30));
    }

    #[test]
    fn test_parse_rejects_unknown_key() {
        let err = FtpOption::parse("hostname", "x").unwrap_err();
        assert!(matches!(err, FtpClientError::Configuration(_)));
    }

    #[test]
    fn test_parse_rejects_bad_value() {
        assert!(FtpOption::parse("port", "eighty").is_err());
        assert!(FtpOption::parse("passive", "maybe").is_err());
    }

    #[test]
    fn test_apply_map_is_all_or_nothing() {
        let mut config = FtpConfig::new();
        let mut values = HashMap::new();
        values.insert("host", "ftp.example.com");
        values.insert("colour", "blue");
        assert!(config.apply_map(&values).is_err());
        assert!(config.is_empty());
    }

    #[test]
    fn test_endpoint_defaults() {
        let endpoint = FtpConfig::new().host("ftp.example.com").endpoint().unwrap();
        assert_eq!(endpoint.port, 21);
        assert_eq!(endpoint.timeout, Duration::from_secs(90));
        assert!(!endpoint.secure);
        assert_eq!(endpoint.address(), "ftp.example.com:21");
    }

    #[test]
    fn test_endpoint_requires_config_and_host() {
        let empty = FtpConfig::new().endpoint().unwrap_err();
        assert!(empty.to_string().contains("config not set"));

        let no_host = FtpConfig::new().user("alice").endpoint().unwrap_err();
        assert!(no_host.to_string().contains("host not set"));
    }

    #[test]
    fn test_passive_default_and_credentials() {
        let config = FtpConfig::new().host("h").user("").password("pw");
        assert!(config.passive_mode());
        assert_eq!(config.credentials(), (None, Some("pw")));
        assert!(!config.passive(false).passive_mode());
    }

    #[test]
    fn test_credentials_absent_when_unset() {
        assert_eq!(FtpConfig::new().host("h").credentials(), (None, None));
        let config = FtpConfig::new().user("alice").password("");
        assert_eq!(config.credentials(), (Some("alice"), None));
    }
}
