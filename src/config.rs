//! Configuration management for RAX FTP Client
//!
//! Named connection groups are read from a TOML file, with environment
//! overrides of the form `RAX_FTP_<GROUP>__<KEY>`, e.g.
//! `RAX_FTP_DEFAULT__HOST=ftp.example.com`.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::client::FtpConfig;

/// Environment prefix for overrides
pub const ENV_PREFIX: &str = "RAX_FTP";

/// All configured connection groups, keyed by name
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    groups: HashMap<String, FtpConfig>,
}

impl Settings {
    /// Load `path` (optional) plus environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_groups(groups: HashMap<String, FtpConfig>) -> Self {
        Self { groups }
    }

    /// Configuration of `name`; an unknown name yields an empty configuration.
    pub fn group(&self, name: &str) -> FtpConfig {
        self.groups.get(name).cloned().unwrap_or_default()
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Validation for all configured groups
    fn validate(&self) -> Result<(), config::ConfigError> {
        for (name, group) in &self.groups {
            if group.port == Some(0) {
                return Err(config::ConfigError::Message(format!(
                    "[{}] port cannot be 0",
                    name
                )));
            }

            if group.timeout == Some(0) {
                return Err(config::ConfigError::Message(format!(
                    "[{}] timeout must be greater than 0",
                    name
                )));
            }

            if group.host.as_deref().is_some_and(|h| h.trim().is_empty()) {
                return Err(config::ConfigError::Message(format!(
                    "[{}] host cannot be empty",
                    name
                )));
            }
        }

        Ok(())
    }
}
