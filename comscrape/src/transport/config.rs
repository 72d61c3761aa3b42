//! Transport configuration.

use std::fmt;
use std::time::Duration;

/// Baud rate of the H3C console port.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Per-read timeout, the equivalent of `VTIME=10` on a raw tty.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Port the serial-over-TCP bridge listens on.
pub const DEFAULT_BRIDGE_PORT: u16 = 4000;

/// Serial device configuration.
///
/// The port is always opened raw, 8N1, without flow control.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path (e.g. `/dev/ttyUSB0`, `COM17`).
    pub path: String,

    /// Line speed.
    pub baud_rate: u32,

    /// Upper bound for a single read call.
    pub read_timeout: Duration,
}

impl SerialConfig {
    /// Create a serial configuration with default line settings.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Configuration for reaching a console through a serial-over-TCP bridge.
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Bridge host (hostname or IP address).
    pub host: String,

    /// Bridge port (default: 4000).
    pub port: u16,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Upper bound for a single read call.
    pub read_timeout: Duration,
}

impl TcpConfig {
    /// Create a TCP configuration with default timeouts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(10),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where the console byte stream comes from.
#[derive(Debug, Clone)]
pub enum TransportConfig {
    /// A local serial device.
    Serial(SerialConfig),

    /// A remote serial port shared by a bridge.
    Tcp(TcpConfig),
}

impl TransportConfig {
    /// Per-read timeout of the configured stream.
    pub fn read_timeout(&self) -> Duration {
        match self {
            Self::Serial(c) => c.read_timeout,
            Self::Tcp(c) => c.read_timeout,
        }
    }

    /// Override the per-read timeout.
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        match self {
            Self::Serial(c) => c.read_timeout = timeout,
            Self::Tcp(c) => c.read_timeout = timeout,
        }
    }
}

impl fmt::Display for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial(c) => write!(f, "serial {} @ {} baud", c.path, c.baud_rate),
            Self::Tcp(c) => write!(f, "tcp {}", c.socket_addr()),
        }
    }
}
