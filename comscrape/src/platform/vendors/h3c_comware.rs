//! H3C Comware platform definition.
//!
//! Comware prints the sysname in angle brackets in user view. A factory
//! default switch shows `<H3C>`:
//!
//! ```text
//! <H3C>display device
//! Slot Type             State    Subslot  Soft Ver             Patch Ver
//! 1    S5130S-28S-EI    Master   0        S5130S_EI-R1118P02   None
//! <H3C>
//! ```

use serde::Serialize;

use crate::platform::PlatformDefinition;

/// Prompt of a switch that still has the factory sysname.
pub const DEFAULT_PROMPT: &str = "<H3C>";

/// Turns off `---- More ----` paging for the session.
pub const DISABLE_PAGING: &str = "screen-length disable";

/// Hardware inventory report.
pub const DISPLAY_DEVICE: &str = "display device";

/// MAC address table report.
pub const DISPLAY_MAC_ADDRESS: &str = "display mac-address";

/// Create the H3C Comware platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new("h3c_comware", DEFAULT_PROMPT)
        .with_wake_sequence("\r\n")
        .with_line_ending("\r\n")
        .with_on_open_command(DISABLE_PAGING)
        .with_failure_pattern("% Unrecognized command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Too many parameters")
        .with_failure_pattern("% Wrong parameter")
}

/// The fixed reports the driver knows how to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Report {
    /// `display device`, returned as text.
    Device,

    /// `display mac-address`, returned as text plus a parsed table.
    MacAddress,
}

impl Report {
    /// The CLI command for this report.
    pub fn command(self) -> &'static str {
        match self {
            Self::Device => DISPLAY_DEVICE,
            Self::MacAddress => DISPLAY_MAC_ADDRESS,
        }
    }

    /// Whether the output is a MAC address table.
    pub fn has_mac_table(self) -> bool {
        matches!(self, Self::MacAddress)
    }
}
