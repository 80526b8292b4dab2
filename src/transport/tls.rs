//! TLS helpers for explicit FTPS (RFC 4217)

use tokio::net::TcpStream;
use tokio_native_tls::{TlsConnector, TlsStream};

use crate::error::{TransportError, TransportResult};

/// Build the connector shared by the control and data channels.
pub fn build_connector() -> TransportResult<TlsConnector> {
    let connector = native_tls::TlsConnector::builder().build()?;
    Ok(TlsConnector::from(connector))
}

/// Run the client side of a TLS handshake over `tcp`.
pub async fn wrap(
    connector: &TlsConnector,
    host: &str,
    tcp: TcpStream,
) -> TransportResult<TlsStream<TcpStream>> {
    connector
        .connect(host, tcp)
        .await
        .map_err(|e| TransportError::tls(format!("TLS handshake with {}: {}", host, e)))
}
