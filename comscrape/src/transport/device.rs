//! Transport selected at runtime from a [`TransportConfig`].

use super::config::TransportConfig;
use super::serial::{SerialTransport, open_serial};
use super::tcp::{TcpTransport, connect_tcp};
use super::ByteStream;
use crate::error::Result;

/// Either a serial port or a bridge connection.
pub enum DeviceTransport {
    /// Local serial device.
    Serial(SerialTransport),

    /// Serial-over-TCP bridge.
    Tcp(TcpTransport),
}

impl DeviceTransport {
    /// Open the stream described by `config`.
    pub async fn connect(config: &TransportConfig) -> Result<Self> {
        match config {
            TransportConfig::Serial(c) => Ok(Self::Serial(open_serial(c)?)),
            TransportConfig::Tcp(c) => Ok(Self::Tcp(connect_tcp(c).await?)),
        }
    }
}

impl ByteStream for DeviceTransport {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Self::Serial(t) => t.read(buf).await,
            Self::Tcp(t) => t.read(buf).await,
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        match self {
            Self::Serial(t) => t.write(data).await,
            Self::Tcp(t) => t.write(data).await,
        }
    }

    async fn flush(&mut self) -> Result<()> {
        match self {
            Self::Serial(t) => t.flush().await,
            Self::Tcp(t) => t.flush().await,
        }
    }

    async fn close(self) -> Result<()> {
        match self {
            Self::Serial(t) => t.close().await,
            Self::Tcp(t) => t.close().await,
        }
    }
}
