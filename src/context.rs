//! Application context
//!
//! Owns the connection registry for the lifetime of the application.
//! Construct one at startup and pass it (or an `Arc` of it) to consumers.

use log::info;
use std::path::Path;
use std::sync::Arc;

use crate::client::{ConnectionRegistry, SharedConnection};
use crate::config::Settings;
use crate::error::handlers::handle_error;
use crate::error::{FtpClientError, FtpResult};
use crate::transport::{Connector, TcpConnector};

pub struct AppContext {
    registry: ConnectionRegistry,
}

impl AppContext {
    pub fn new(settings: Settings, connector: Arc<dyn Connector>) -> Self {
        Self {
            registry: ConnectionRegistry::new(settings, connector),
        }
    }

    /// Load settings from `path` and dial over TCP.
    pub fn from_config_file(path: impl AsRef<Path>) -> FtpResult<Self> {
        let path = path.as_ref();
        let settings = Settings::load(path).map_err(|e| {
            let err = FtpClientError::from(e);
            handle_error(&err);
            err
        })?;
        info!("Loaded FTP settings from {}", path.display());
        Ok(Self::new(settings, Arc::new(TcpConnector)))
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Shorthand for `registry().instance(name)`.
    pub async fn connection(&self, name: &str) -> SharedConnection {
        self.registry.instance(name).await
    }

    /// Close every registered connection.
    pub async fn shutdown(&self) {
        self.registry.close_all().await;
    }
}
