//! # Comscrape
//!
//! Async serial console scraper for H3C Comware switches.
//!
//! A console port has no response framing: the switch just prints text and
//! eventually shows its prompt again. Comscrape sends a command, then reads
//! until the prompt (e.g. `<H3C>`) appears or the line goes quiet for a
//! bounded number of reads, so a dead or misbehaving device never hangs the
//! caller.
//!
//! ## Features
//!
//! - Serial ports via tokio-serial, or a remote port through the built-in
//!   serial-over-TCP bridge
//! - Prompt-or-silence response detection as an explicit state machine
//! - Paging disabled on open (`screen-length disable`)
//! - MAC address table parsing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use comscrape::{DriverBuilder, Report, collect_report};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), comscrape::Error> {
//!     let driver = DriverBuilder::serial("/dev/ttyUSB0")
//!         .baud_rate(9600)
//!         .connect()
//!         .await?;
//!
//!     let report = collect_report(driver, Report::MacAddress).await?;
//!     for (mac, port) in report.mac_table.unwrap_or_default() {
//!         println!("{mac} -> {port}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod channel;
pub mod driver;
pub mod error;
pub mod parse;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use channel::{Prompt, ReadOutcome, ReadState, ReaderConfig};
pub use driver::{ConsoleDriver, DeviceReport, Driver, DriverBuilder, Response, collect_report};
pub use error::Error;
pub use parse::{MacTable, parse_mac_address_table};
pub use platform::PlatformDefinition;
pub use platform::vendors::h3c_comware::Report;
pub use transport::{ByteStream, DeviceTransport, SerialConfig, TcpConfig, TransportConfig};
