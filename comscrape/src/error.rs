//! Error types for comscrape.

use std::io;
use thiserror::Error;

/// Main error type for comscrape operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors (serial device, TCP bridge)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel read errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform definition errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Transport layer errors (opening the device, moving bytes).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to open or configure the serial device
    #[error("Failed to open serial device {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },

    /// Failed to connect to a serial-over-TCP bridge
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The peer closed the stream
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (reading a response off the stream).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Prompt string is unusable for matching
    #[error("Invalid prompt: {0:?}")]
    InvalidPrompt(String),
}

/// Driver layer errors (session lifecycle, command execution).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not open
    #[error("Driver not connected - call open() first")]
    NotConnected,

    /// Driver already open
    #[error("Driver already open")]
    AlreadyOpen,

    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Platform definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },
}

/// Result type alias using comscrape's Error.
pub type Result<T> = std::result::Result<T, Error>;
