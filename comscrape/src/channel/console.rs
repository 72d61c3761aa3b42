//! Console channel: a byte stream plus the response-detection settings.

use log::trace;

use super::prompt::Prompt;
use super::reader::{self, ReadOutcome, ReaderConfig};
use crate::error::{Result, TransportError};
use crate::transport::ByteStream;

/// Owns the console stream for the length of a session.
///
/// This is the only place bytes are written to or read from the device.
#[derive(Debug)]
pub struct ConsoleChannel<S> {
    stream: S,
    config: ReaderConfig,
}

impl<S: ByteStream> ConsoleChannel<S> {
    /// Create a channel over an already opened stream.
    pub fn new(stream: S, config: ReaderConfig) -> Self {
        Self { stream, config }
    }

    /// Write all of `data` and flush it to the device.
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < data.len() {
            let n = self.stream.write(&data[written..]).await?;
            if n == 0 {
                return Err(TransportError::Disconnected.into());
            }
            written += n;
        }
        self.stream.flush().await?;
        trace!("sent {} bytes", data.len());
        Ok(())
    }

    /// Discard unsolicited output until the device goes quiet.
    pub async fn drain(&mut self) -> Result<usize> {
        reader::drain(&mut self.stream, &self.config).await
    }

    /// Collect output until `prompt` appears or the device goes quiet.
    pub async fn read_until_prompt(&mut self, prompt: &Prompt) -> Result<ReadOutcome> {
        reader::read_until_prompt(&mut self.stream, prompt, &self.config).await
    }

    /// Get a reference to the underlying stream.
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Close the underlying stream.
    pub async fn close(self) -> Result<()> {
        self.stream.close().await
    }
}
