//! Data channel setup
//!
//! Passive mode (`PASV`): the server listens and we connect.
//! Active mode (`PORT`): we listen and the server connects back.

use log::debug;
use regex::Regex;
use std::net::{IpAddr, SocketAddr};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use crate::error::{TransportError, TransportResult};
use crate::transport::codec::Codec;

static PASV_REPLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+),(\d+),(\d+),(\d+),(\d+),(\d+)").expect("PASV pattern is valid")
});

/// A data connection negotiated on the control channel
pub enum PendingData {
    /// Already connected to the server's passive port
    Passive(TcpStream),
    /// Waiting for the server to connect back
    Active(TcpListener),
}

impl PendingData {
    /// Finish opening the data connection once the transfer command has been accepted.
    pub async fn establish(self, wait: Duration) -> TransportResult<TcpStream> {
        match self {
            PendingData::Passive(stream) => Ok(stream),
            PendingData::Active(listener) => {
                let (stream, peer) = timeout(wait, listener.accept())
                    .await
                    .map_err(|_| TransportError::data_channel("PORT accept timed out"))?
                    .map_err(|e| TransportError::data_channel(format!("PORT accept: {}", e)))?;
                debug!("Data connection from {}", peer);
                Ok(stream)
            }
        }
    }
}

/// Issue `PASV` and connect to the announced address.
///
/// The connection is opened before the transfer command is sent, since some
/// servers only answer that command once the data connection exists. An
/// unspecified address in the reply is replaced by the control peer.
pub async fn negotiate_passive<S>(
    codec: &mut Codec<S>,
    peer: IpAddr,
    wait: Duration,
) -> TransportResult<PendingData>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let reply = codec.expect_ok("PASV").await?;
    let mut addr = parse_pasv(&reply.text())?;
    if addr.ip().is_unspecified() {
        addr.set_ip(peer);
    }
    debug!("Passive data address {}", addr);

    let stream = timeout(wait, TcpStream::connect(addr))
        .await
        .map_err(|_| TransportError::data_channel("PASV data connect timed out"))?
        .map_err(|e| TransportError::data_channel(format!("PASV connect {}: {}", addr, e)))?;
    Ok(PendingData::Passive(stream))
}

/// Bind a listener on the control connection's local address and announce it with `PORT`.
pub async fn negotiate_active<S>(codec: &mut Codec<S>, local: IpAddr) -> TransportResult<PendingData>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let IpAddr::V4(ip) = local else {
        return Err(TransportError::data_channel("PORT requires an IPv4 control connection"));
    };
    let listener = TcpListener::bind(SocketAddr::new(local, 0))
        .await
        .map_err(|e| TransportError::data_channel(format!("PORT bind: {}", e)))?;
    let port = listener.local_addr()?.port();

    codec.expect_ok(&format_port(ip.octets(), port)).await?;
    Ok(PendingData::Active(listener))
}

/// Parse `h1,h2,h3,h4,p1,p2` out of a 227 reply.
pub fn parse_pasv(text: &str) -> TransportResult<SocketAddr> {
    let caps = PASV_REPLY
        .captures(text)
        .ok_or_else(|| TransportError::protocol(format!("cannot parse PASV reply: {}", text)))?;

    let mut nums = [0u8; 6];
    for (i, slot) in nums.iter_mut().enumerate() {
        *slot = caps[i + 1]
            .parse::<u8>()
            .map_err(|_| TransportError::protocol(format!("PASV value out of range: {}", text)))?;
    }

    let ip = IpAddr::from([nums[0], nums[1], nums[2], nums[3]]);
    let port = u16::from(nums[4]) * 256 + u16::from(nums[5]);
    Ok(SocketAddr::new(ip, port))
}

fn format_port(octets: [u8; 4], port: u16) -> String {
    format!(
        "PORT {},{},{},{},{},{}",
        octets[0],
        octets[1],
        octets[2],
        octets[3],
        port / 256,
        port % 256
    )
}
