//! MAC address table extraction from `display mac-address` output.
//!
//! ```text
//! MAC ADDR         VLAN ID  STATE      PORT INDEX                 AGING TIME(s)
//! 000b-0e0f-00ed   1        Learned    GigabitEthernet1/0/2       AGING
//! ```
//!
//! Extraction is best-effort: lines that don't look like a table row are
//! skipped, never reported.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Hardware address to interface name.
///
/// Iteration follows first appearance in the report. Keys keep the casing
/// the device printed, so `000B-...` and `000b-...` are different entries.
pub type MacTable = IndexMap<String, String>;

// Address, VLAN, state, then the port token. Only the line start is anchored.
// ASCII classes only: a non-ASCII digit or space never makes a row.
static MAC_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?-u)^\s*([0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4})\s+\d+\s+\w+\s+([A-Za-z0-9/]+)",
    )
    .expect("MAC table row pattern is valid")
});

/// Parse a MAC address table report.
///
/// A later row for the same address replaces the earlier one.
pub fn parse_mac_address_table(text: &str) -> MacTable {
    let mut table = MacTable::new();
    for line in text.lines() {
        if let Some(caps) = MAC_ROW.captures(line) {
            table.insert(caps[1].to_string(), caps[2].to_string());
        }
    }
    table
}
