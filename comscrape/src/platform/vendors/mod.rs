//! Built-in vendor platforms.

pub mod h3c_comware;
