//! Serial port transport using tokio-serial.

use log::info;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

use super::config::SerialConfig;
use super::io::IoTransport;
use crate::error::{Result, TransportError};

/// Console stream over a local serial device.
pub type SerialTransport = IoTransport<SerialStream>;

/// Open the serial device raw, 8N1, no flow control.
///
/// Must be called from within a tokio runtime.
pub fn open_serial_stream(config: &SerialConfig) -> Result<SerialStream> {
    let stream = tokio_serial::new(&config.path, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(config.read_timeout)
        .open_native_async()
        .map_err(|source| TransportError::OpenFailed {
            path: config.path.clone(),
            source,
        })?;

    info!("Opened serial port {} at {} baud", config.path, config.baud_rate);
    Ok(stream)
}

/// Open the serial device as a console [`ByteStream`](super::ByteStream).
pub fn open_serial(config: &SerialConfig) -> Result<SerialTransport> {
    let stream = open_serial_stream(config)?;
    Ok(IoTransport::new(stream, config.read_timeout))
}
