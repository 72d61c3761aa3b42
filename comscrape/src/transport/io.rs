//! [`ByteStream`] adapter over any tokio I/O object.

use std::io;
use std::time::Duration;

use log::trace;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::ByteStream;
use crate::error::{Result, TransportError};

/// Wraps an async reader/writer and bounds every read with a timeout.
///
/// An elapsed timeout is reported as `Ok(0)`. End-of-stream from the
/// underlying object means the peer is gone and is reported as
/// [`TransportError::Disconnected`].
#[derive(Debug)]
pub struct IoTransport<T> {
    io: T,
    read_timeout: Duration,
}

impl<T> IoTransport<T> {
    /// Wrap `io`, bounding each read by `read_timeout`.
    pub fn new(io: T, read_timeout: Duration) -> Self {
        Self { io, read_timeout }
    }
}

impl<T> ByteStream for IoTransport<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match tokio::time::timeout(self.read_timeout, self.io.read(buf)).await {
            Err(_) => Ok(0),
            Ok(Ok(0)) => Err(TransportError::Disconnected.into()),
            Ok(Ok(n)) => {
                trace!("read {} bytes", n);
                Ok(n)
            }
            // Some serial drivers surface their own read timeout
            Ok(Err(e)) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Ok(Err(e)) => Err(TransportError::Io(e).into()),
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.io.write(data).await.map_err(TransportError::Io)?)
    }

    async fn flush(&mut self) -> Result<()> {
        self.io.flush().await.map_err(TransportError::Io)?;
        Ok(())
    }

    async fn close(mut self) -> Result<()> {
        match self.io.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TransportError::Io(e).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_write_then_read() {
        let mock = Builder::new()
            .write(b"display device\r\n")
            .read(b"Slot 1 Normal\r\n<H3C>")
            .build();
        let mut transport = IoTransport::new(mock, Duration::from_secs(1));

        let n = transport.write(b"display device\r\n").await.unwrap();
        assert_eq!(n, 16);
        transport.flush().await.unwrap();

        let mut buf = [0u8; 64];
        let n = transport.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"Slot 1 Normal\r\n<H3C>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_read_returns_zero() {
        let (_device, host) = tokio::io::duplex(64);
        let mut transport = IoTransport::new(host, Duration::from_secs(1));

        let mut buf = [0u8; 16];
        assert_eq!(transport.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_end_of_stream_is_disconnect() {
        let mock = Builder::new().read(b"bye").build();
        let mut transport = IoTransport::new(mock, Duration::from_secs(1));

        let mut buf = [0u8; 16];
        assert_eq!(transport.read(&mut buf).await.unwrap(), 3);
        let err = transport.read(&mut buf).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_read_error_propagates() {
        let mock = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "device gone"))
            .build();
        let mut transport = IoTransport::new(mock, Duration::from_secs(1));

        let mut buf = [0u8; 16];
        let err = transport.read(&mut buf).await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Io(_))));
    }

    #[tokio::test]
    async fn test_close_shuts_down() {
        let (mut device, host) = tokio::io::duplex(64);
        let transport = IoTransport::new(host, Duration::from_secs(1));
        transport.close().await.unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(device.read(&mut buf).await.unwrap(), 0);
    }
}
