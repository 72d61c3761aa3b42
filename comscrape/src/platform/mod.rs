//! Platform definitions.
//!
//! A platform describes a device's console dialect: the prompt, how to
//! wake the console, what to run on open, and how errors look.

mod definition;
pub mod vendors;

pub use definition::PlatformDefinition;
