//! Structured views over device report text.

mod mac_table;

pub use mac_table::{MacTable, parse_mac_address_table};
