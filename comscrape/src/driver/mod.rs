//! High-level driver for console sessions.
//!
//! The driver layer provides the main API for waking a console, sending
//! commands and collecting the fixed device reports.

mod builder;
mod console;
mod report;
pub(crate) mod response;

pub use builder::DriverBuilder;
pub use console::ConsoleDriver;
pub use report::{DeviceReport, collect_report};
pub use response::Response;

use std::future::Future;

use crate::error::Result;

/// Trait for device drivers.
pub trait Driver: Send {
    /// Wake the console and run the platform's on-open commands.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Release the console stream.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send a command and wait for the prompt.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Check if the session is open.
    fn is_open(&self) -> bool;
}
