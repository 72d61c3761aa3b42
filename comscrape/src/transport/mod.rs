//! Byte stream transports for console sessions.
//!
//! The protocol core never opens a device itself. It is handed something
//! implementing [`ByteStream`]: a serial port, a TCP connection to a
//! serial-over-TCP bridge, or a simulated stream in tests.

pub mod config;
mod device;
mod io;
mod serial;
mod tcp;

pub use config::{SerialConfig, TcpConfig, TransportConfig};
pub use device::DeviceTransport;
pub use io::IoTransport;
pub use serial::{SerialTransport, open_serial, open_serial_stream};
pub use tcp::{TcpTransport, connect_tcp};

use std::future::Future;

use crate::error::Result;

/// Duplex byte channel to a device console.
///
/// Reads are bounded by a per-call timeout configured on the stream itself.
/// A read that returns `Ok(0)` means "nothing arrived within this call's
/// timeout", never end-of-stream. A dead stream is reported as an error.
pub trait ByteStream: Send {
    /// Read whatever the device produced into `buf`, waiting at most the
    /// stream's read timeout.
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize>> + Send;

    /// Write some bytes, returning how many were accepted.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<usize>> + Send;

    /// Block until written bytes have been handed to the device.
    fn flush(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Release the underlying device handle.
    fn close(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}
