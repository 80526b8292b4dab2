//! Module `state`
//!
//! Defines the `FtpConnection` struct: the configuration of one named
//! connection plus the transport it owns once connected.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::client::options::{FtpConfig, FtpOption};
use crate::error::handlers::session_error;
use crate::error::{FtpClientError, FtpResult};
use crate::transport::{Connector, FtpTransport, TcpConnector};

/// One logical FTP session.
///
/// The connection is established lazily by the first operation and is
/// connected exactly while it owns a transport.
pub struct FtpConnection {
    name: String,
    config: FtpConfig,
    connector: Arc<dyn Connector>,
    transport: Option<Box<dyn FtpTransport>>,
}

impl FtpConnection {
    pub fn new(config: FtpConfig, connector: Arc<dyn Connector>) -> Self {
        Self::named("default", config, connector)
    }

    pub fn named(name: impl Into<String>, config: FtpConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            name: name.into(),
            config,
            connector,
            transport: None,
        }
    }

    /// A connection dialing over plain TCP or explicit FTPS.
    pub fn with_tcp(config: FtpConfig) -> Self {
        Self::new(config, Arc::new(TcpConnector))
    }

    // --------------------
    // Getter methods
    // --------------------

    /// Configuration name this connection was created for.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &FtpConfig {
        &self.config
    }

    /// Returns whether a transport is currently held.
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    // --------------------
    // Configuration
    // --------------------

    /// Set one option; takes effect on the next `connect`.
    pub fn configure(&mut self, option: FtpOption) -> &mut Self {
        if self.is_connected() {
            debug!(
                "Option '{}' changed on live connection {}; applies after reconnect",
                option.key(),
                self.name
            );
        }
        self.config.apply(option);
        self
    }

    /// Set several options from string pairs, rejecting unrecognized keys.
    pub fn configure_all<K, V>(&mut self, values: &HashMap<K, V>) -> FtpResult<&mut Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.config.apply_map(values)?;
        Ok(self)
    }

    // --------------------
    // Lifecycle
    // --------------------

    /// Open and authenticate the session; a no-op while already connected.
    pub async fn connect(&mut self) -> FtpResult<bool> {
        if self.transport.is_some() {
            return Ok(true);
        }

        let endpoint = self.config.endpoint()?;
        info!(
            "Connecting {} to {}{}",
            self.name,
            endpoint.address(),
            if endpoint.secure { " (FTPS)" } else { "" }
        );

        let mut transport = self.connector.open(&endpoint).await.map_err(|e| {
            let how = if endpoint.secure { "ssh connect" } else { "connect" };
            FtpClientError::Connection(format!("FTP unable to {} to {}: {}", how, endpoint.address(), e))
        })?;

        let (user, password) = self.config.credentials();
        if let Err(e) = transport.login(user, password).await {
            let _ = transport.close().await;
            return Err(session_error(e));
        }

        transport
            .set_passive(self.config.passive_mode())
            .await
            .map_err(session_error)?;

        self.transport = Some(transport);
        info!("Connection {} established", self.name);
        Ok(true)
    }

    /// Connect if needed and hand out the live transport.
    pub async fn ensure_connected(&mut self) -> FtpResult<&mut Box<dyn FtpTransport>> {
        self.connect().await?;
        self.transport
            .as_mut()
            .ok_or_else(|| FtpClientError::Connection("FTP no connection".into()))
    }

    /// Close the transport; returns false when there was nothing to close.
    pub async fn close(&mut self) -> bool {
        let Some(mut transport) = self.transport.take() else {
            return false;
        };
        if let Err(e) = transport.close().await {
            warn!("Error while closing connection {}: {}", self.name, e);
        }
        info!("Connection {} closed", self.name);
        true
    }
}

impl Drop for FtpConnection {
    fn drop(&mut self) {
        if self.transport.take().is_some() {
            debug!("Connection {} dropped while connected; sockets closed", self.name);
        }
    }
}
