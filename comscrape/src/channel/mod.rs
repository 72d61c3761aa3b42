//! Channel layer: sending commands and detecting when a response is done.
//!
//! Console output has no framing, so a response is complete when the prompt
//! shows up again or the device stays quiet long enough.

mod buffer;
mod console;
mod prompt;
mod reader;

pub use buffer::ResponseBuffer;
pub use console::ConsoleChannel;
pub use prompt::Prompt;
pub use reader::{
    Drain, PromptSeek, ReadOutcome, ReadState, ReaderConfig, drain, read_until_prompt,
};

#[cfg(test)]
pub(crate) use reader::tests::{ScriptedStream, Step};
