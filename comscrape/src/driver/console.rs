//! Console driver: one command, one prompt-terminated response.

use std::fmt;
use std::time::Instant;

use log::debug;

use super::Driver;
use super::response::Response;
use crate::channel::{ConsoleChannel, Prompt, ReaderConfig};
use crate::error::{DriverError, Result};
use crate::platform::PlatformDefinition;
use crate::transport::ByteStream;

/// Driver for a device console reached over a [`ByteStream`].
///
/// The session goes through three phases:
/// - `open()` wakes the console and runs the platform's on-open commands,
///   draining the output of each
/// - `send_command()` sends a command and reads until the prompt or a quiet
///   timeout
/// - `close()` releases the stream
pub struct ConsoleDriver<S> {
    /// Platform definition.
    platform: PlatformDefinition,

    /// Compiled prompt.
    prompt: Prompt,

    /// Console channel (None once closed).
    channel: Option<ConsoleChannel<S>>,

    /// Whether the on-open handshake has run.
    opened: bool,
}

impl<S: ByteStream> ConsoleDriver<S> {
    /// Create a driver over an already opened stream.
    pub fn new(stream: S, platform: PlatformDefinition, config: ReaderConfig) -> Result<Self> {
        platform.validate()?;
        config.validate()?;
        let prompt = Prompt::new(platform.prompt.clone())?;

        Ok(Self {
            platform,
            prompt,
            channel: Some(ConsoleChannel::new(stream, config)),
            opened: false,
        })
    }

    /// Get a reference to the platform definition.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Get the prompt the driver waits for.
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    /// Get a reference to the stream, unless the driver was closed.
    pub fn stream(&self) -> Option<&S> {
        self.channel.as_ref().map(ConsoleChannel::stream)
    }
}

impl<S> fmt::Debug for ConsoleDriver<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleDriver")
            .field("platform", &self.platform.name)
            .field("prompt", &self.prompt)
            .field("connected", &self.channel.is_some())
            .field("opened", &self.opened)
            .finish()
    }
}

impl<S: ByteStream> Driver for ConsoleDriver<S> {
    async fn open(&mut self) -> Result<()> {
        if self.opened {
            return Err(DriverError::AlreadyOpen.into());
        }
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;

        channel.send(self.platform.wake_sequence.as_bytes()).await?;
        let drained = channel.drain().await?;
        debug!("wake: drained {} bytes", drained);

        for command in &self.platform.on_open_commands {
            channel
                .send(self.platform.command_line(command).as_bytes())
                .await?;
            let drained = channel.drain().await?;
            debug!("on_open {:?}: drained {} bytes", command, drained);
        }

        self.opened = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.opened = false;
        if let Some(channel) = self.channel.take() {
            channel.close().await?;
            debug!("console stream closed");
        }
        Ok(())
    }

    async fn send_command(&mut self, command: &str) -> Result<Response> {
        if !self.opened {
            return Err(DriverError::NotConnected.into());
        }
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;

        let start = Instant::now();

        channel
            .send(self.platform.command_line(command).as_bytes())
            .await?;
        debug!("sent command {:?}", command);

        let outcome = channel.read_until_prompt(&self.prompt).await?;
        let elapsed = start.elapsed();

        let raw_result = outcome.as_str_lossy().into_owned();
        let body = String::from_utf8_lossy(outcome.before_prompt());
        let result = self.platform.normalize_output(&body, command);

        let response = Response::new(command, result, raw_result, outcome.state, elapsed);

        match self.platform.detect_failure(&response.result) {
            Some(pattern) => {
                debug!("command {:?} failed: {:?}", command, pattern);
                Ok(response.with_failure(pattern))
            }
            None => Ok(response),
        }
    }

    fn is_open(&self) -> bool {
        self.opened && self.channel.is_some()
    }
}
