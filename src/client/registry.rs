//! Connection registry
//!
//! Maps configuration names to shared connections. One connection per name
//! is cached for the lifetime of the registry; `factory` hands out fresh,
//! uncached ones.

use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::client::FtpConnection;
use crate::config::Settings;
use crate::transport::Connector;

/// Connection shared between tasks; the mutex serializes requests on it.
pub type SharedConnection = Arc<Mutex<FtpConnection>>;

/// Registry for named connections
pub struct ConnectionRegistry {
    settings: Settings,
    connector: Arc<dyn Connector>,
    connections: Mutex<HashMap<String, SharedConnection>>,
}

impl ConnectionRegistry {
    pub fn new(settings: Settings, connector: Arc<dyn Connector>) -> Self {
        Self {
            settings,
            connector,
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Cached connection for `name`, created on first use.
    pub async fn instance(&self, name: &str) -> SharedConnection {
        let mut connections = self.connections.lock().await;
        if let Some(existing) = connections.get(name) {
            return Arc::clone(existing);
        }

        debug!("Registering connection {}", name);
        let connection = Arc::new(Mutex::new(self.factory(name)));
        connections.insert(name.to_string(), Arc::clone(&connection));
        connection
    }

    /// Fresh connection for `name` that is not cached.
    pub fn factory(&self, name: &str) -> FtpConnection {
        FtpConnection::named(name, self.settings.group(name), Arc::clone(&self.connector))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.connections.lock().await.contains_key(name)
    }

    /// Drop the cached connection for `name`; other holders keep their handle.
    pub async fn remove(&self, name: &str) -> Option<SharedConnection> {
        self.connections.lock().await.remove(name)
    }

    /// Close and forget every cached connection; returns how many were open.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<SharedConnection> = {
            let mut connections = self.connections.lock().await;
            connections.drain().map(|(_, c)| c).collect()
        };

        let mut closed = 0;
        for connection in drained {
            if connection.lock().await.close().await {
                closed += 1;
            }
        }
        info!("Closed {} registered connection(s)", closed);
        closed
    }
}
