//! The fixed report script: open, one query, close.

use log::{debug, warn};
use serde::Serialize;

use super::Driver;
use super::console::ConsoleDriver;
use super::response::Response;
use crate::error::Result;
use crate::parse::{MacTable, parse_mac_address_table};
use crate::platform::vendors::h3c_comware::Report;
use crate::transport::ByteStream;

/// A collected report.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    /// Which report was requested.
    pub report: Report,

    /// The device's response to the report command.
    pub response: Response,

    /// Parsed table, for reports that carry one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_table: Option<MacTable>,
}

/// Run the whole script against `driver` and close it.
///
/// The stream is closed on every path. A close error is logged, not
/// returned: it never hides the report or the script's own error.
pub async fn collect_report<S: ByteStream>(
    mut driver: ConsoleDriver<S>,
    report: Report,
) -> Result<DeviceReport> {
    let collected = run_report(&mut driver, report).await;
    let closed = driver.close().await;

    if let Err(e) = closed {
        warn!("failed to close console: {}", e);
    }
    collected
}

async fn run_report<S: ByteStream>(
    driver: &mut ConsoleDriver<S>,
    report: Report,
) -> Result<DeviceReport> {
    if !driver.is_open() {
        driver.open().await?;
    }

    let response = driver.send_command(report.command()).await?;

    let mac_table = report
        .has_mac_table()
        .then(|| parse_mac_address_table(&response.raw_result));
    if let Some(table) = &mac_table {
        debug!("parsed {} MAC table entries", table.len());
    }

    Ok(DeviceReport {
        report,
        response,
        mac_table,
    })
}
