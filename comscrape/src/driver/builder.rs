//! Builder for creating console drivers.

use std::time::Duration;

use super::console::ConsoleDriver;
use crate::channel::ReaderConfig;
use crate::error::{DriverError, Result};
use crate::platform::PlatformDefinition;
use crate::platform::vendors::h3c_comware;
use crate::transport::{ByteStream, DeviceTransport, SerialConfig, TcpConfig, TransportConfig};

/// Builder for constructing console drivers.
///
/// Defaults to the H3C Comware platform and the reference timing
/// (2 idle reads to drain, 10 idle reads 100 ms apart to give up on the
/// prompt, 1 s per read).
///
/// # Example
///
/// ```rust,no_run
/// use comscrape::{Driver, DriverBuilder};
///
/// # async fn example() -> Result<(), comscrape::Error> {
/// let mut driver = DriverBuilder::serial("/dev/ttyUSB0")
///     .baud_rate(9600)
///     .connect()
///     .await?;
///
/// driver.open().await?;
/// let response = driver.send_command("display device").await?;
/// println!("{}", response.result);
/// driver.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DriverBuilder {
    transport: TransportConfig,
    platform: PlatformDefinition,
    reader: ReaderConfig,
}

impl DriverBuilder {
    /// Create a builder for the given transport.
    pub fn new(transport: TransportConfig) -> Self {
        Self {
            transport,
            platform: h3c_comware::platform(),
            reader: ReaderConfig::default(),
        }
    }

    /// Create a builder for a local serial device.
    pub fn serial(path: impl Into<String>) -> Self {
        Self::new(TransportConfig::Serial(SerialConfig::new(path)))
    }

    /// Create a builder for a console shared by a serial-over-TCP bridge.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::new(TransportConfig::Tcp(TcpConfig::new(host, port)))
    }

    /// Set the serial line speed. Ignored for TCP.
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        if let TransportConfig::Serial(config) = &mut self.transport {
            config.baud_rate = baud_rate;
        }
        self
    }

    /// Set the upper bound for a single read.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.transport.set_read_timeout(timeout);
        self
    }

    /// Set the TCP connect timeout. Ignored for serial.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        if let TransportConfig::Tcp(config) = &mut self.transport {
            config.connect_timeout = timeout;
        }
        self
    }

    /// Set a custom platform definition.
    pub fn platform(mut self, platform: PlatformDefinition) -> Self {
        self.platform = platform;
        self
    }

    /// Set the prompt (the device sysname in angle brackets).
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.platform.prompt = prompt.into();
        self
    }

    /// Set the whole reader configuration.
    pub fn reader_config(mut self, config: ReaderConfig) -> Self {
        self.reader = config;
        self
    }

    /// Set how many consecutive empty reads end a drain.
    pub fn drain_idle_reads(mut self, reads: u32) -> Self {
        self.reader.drain_idle_reads = reads;
        self
    }

    /// Set how many consecutive empty reads end a prompt search.
    pub fn prompt_idle_reads(mut self, reads: u32) -> Self {
        self.reader.prompt_idle_reads = reads;
        self
    }

    /// Set the sleep between empty reads while searching for the prompt.
    pub fn idle_backoff(mut self, backoff: Duration) -> Self {
        self.reader.idle_backoff = backoff;
        self
    }

    /// Get the transport configuration.
    pub fn transport_config(&self) -> &TransportConfig {
        &self.transport
    }

    fn validate(&self) -> Result<()> {
        self.platform.validate()?;
        self.reader.validate()?;

        if self.transport.read_timeout().is_zero() {
            return Err(DriverError::InvalidConfig {
                message: "read timeout must be non-zero".to_string(),
            }
            .into());
        }
        if let TransportConfig::Serial(config) = &self.transport {
            if config.baud_rate == 0 {
                return Err(DriverError::InvalidConfig {
                    message: "baud rate must be non-zero".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Open the configured transport and build the driver.
    ///
    /// This opens the device but does not talk to it. Call `open()` on the
    /// returned driver to wake the console.
    pub async fn connect(self) -> Result<ConsoleDriver<DeviceTransport>> {
        self.validate()?;
        let stream = DeviceTransport::connect(&self.transport).await?;
        ConsoleDriver::new(stream, self.platform, self.reader)
    }

    /// Build a driver over a stream the caller already opened.
    ///
    /// The transport settings of the builder are not used.
    pub fn build_with_stream<S: ByteStream>(self, stream: S) -> Result<ConsoleDriver<S>> {
        self.validate()?;
        ConsoleDriver::new(stream, self.platform, self.reader)
    }
}
