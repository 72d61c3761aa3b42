//! Response buffer for one command/response cycle.
//!
//! The buffer only grows while a response is being read. Prompt detection
//! only rescans the newly appended bytes (plus a small overlap), so reading
//! a large table costs one pass over the output, not one pass per chunk.

use std::ops::Range;

use bytes::{Bytes, BytesMut};

use super::prompt::Prompt;

/// Accumulates console output across reads.
#[derive(Debug)]
pub struct ResponseBuffer {
    buffer: BytesMut,
}

impl ResponseBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Append newly read bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Find the first occurrence of `prompt` starting at or after `from`.
    ///
    /// The returned range is relative to the start of the whole buffer.
    pub fn find_prompt_from(&self, from: usize, prompt: &Prompt) -> Option<Range<usize>> {
        let from = from.min(self.buffer.len());
        prompt
            .find(&self.buffer[from..])
            .map(|m| (from + m.start)..(from + m.end))
    }

    /// Freeze the contents, ending the cycle.
    pub fn freeze(self) -> Bytes {
        self.buffer.freeze()
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new()
    }
}
