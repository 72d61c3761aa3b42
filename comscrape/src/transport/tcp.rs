//! TCP transport to a serial-over-TCP bridge.

use log::info;
use tokio::net::TcpStream;

use super::config::TcpConfig;
use super::io::IoTransport;
use crate::error::{Result, TransportError};

/// Console stream over a TCP connection to a bridge.
pub type TcpTransport = IoTransport<TcpStream>;

/// Connect to the bridge, failing after `connect_timeout`.
pub async fn connect_tcp(config: &TcpConfig) -> Result<TcpTransport> {
    let stream = tokio::time::timeout(
        config.connect_timeout,
        TcpStream::connect((config.host.as_str(), config.port)),
    )
    .await
    .map_err(|_| TransportError::Timeout(config.connect_timeout))?
    .map_err(|source| TransportError::ConnectionFailed {
        host: config.host.clone(),
        port: config.port,
        source,
    })?;

    // Commands are tiny; don't let Nagle hold them back
    stream.set_nodelay(true).map_err(TransportError::Io)?;

    info!("Connected to console bridge at {}", config.socket_addr());
    Ok(IoTransport::new(stream, config.read_timeout))
}
