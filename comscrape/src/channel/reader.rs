//! Response completion detection for unframed console output.
//!
//! A console gives no end-of-response marker, so completion is inferred:
//! either the prompt shows up again, or the device goes quiet for a bounded
//! number of reads. Both paths are bounded so a dead or chatty device can't
//! hang the caller.
//!
//! The termination rules live in two small state machines, [`Drain`] and
//! [`PromptSeek`], which are fed "data" and "idle" events and do no I/O.
//! [`drain`] and [`read_until_prompt`] drive them from a [`ByteStream`].

use std::borrow::Cow;
use std::ops::Range;
use std::time::Duration;

use bytes::Bytes;
use log::{debug, trace, warn};
use serde::Serialize;

use super::buffer::ResponseBuffer;
use super::prompt::Prompt;
use crate::error::{DriverError, Result};
use crate::transport::ByteStream;

/// Timing model for response detection.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Consecutive empty reads that end a drain.
    pub drain_idle_reads: u32,

    /// Consecutive empty reads that end a prompt search.
    pub prompt_idle_reads: u32,

    /// Sleep between empty reads while searching for the prompt.
    pub idle_backoff: Duration,

    /// Bytes requested per read.
    pub chunk_size: usize,
}

impl ReaderConfig {
    /// Reject settings that would end a read before it starts.
    pub fn validate(&self) -> std::result::Result<(), DriverError> {
        let invalid = |message: &str| DriverError::InvalidConfig {
            message: message.to_string(),
        };
        if self.drain_idle_reads == 0 {
            return Err(invalid("drain_idle_reads must be at least 1"));
        }
        if self.prompt_idle_reads == 0 {
            return Err(invalid("prompt_idle_reads must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(invalid("chunk_size must be at least 1"));
        }
        Ok(())
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            drain_idle_reads: 2,
            prompt_idle_reads: 10,
            idle_backoff: Duration::from_millis(100),
            chunk_size: 512,
        }
    }
}

/// State of a prompt search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadState {
    /// Still waiting for the prompt.
    Reading,

    /// The prompt appeared in the buffer.
    PromptMatched,

    /// The device went quiet without printing the prompt.
    TimedOut,
}

impl ReadState {
    /// Whether the search has ended.
    pub fn is_finished(self) -> bool {
        !matches!(self, Self::Reading)
    }
}

/// Idle counter for pure drain mode. Keeps no data.
#[derive(Debug)]
pub struct Drain {
    idle: u32,
    threshold: u32,
    discarded: usize,
    reads: usize,
}

impl Drain {
    /// Start a drain that ends after `threshold` consecutive empty reads.
    pub fn new(threshold: u32) -> Self {
        Self {
            idle: 0,
            threshold,
            discarded: 0,
            reads: 0,
        }
    }

    /// Record a read that returned `n > 0` bytes.
    pub fn on_data(&mut self, n: usize) {
        self.reads += 1;
        self.discarded += n;
        self.idle = 0;
    }

    /// Record a read that returned nothing.
    pub fn on_idle(&mut self) {
        self.reads += 1;
        self.idle += 1;
    }

    /// Whether enough consecutive empty reads have happened.
    pub fn is_finished(&self) -> bool {
        self.idle >= self.threshold
    }

    /// Total bytes thrown away.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Total reads performed.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

/// Prompt search over accumulated output.
///
/// `Reading` moves to `PromptMatched` on the first data event that
/// completes a prompt occurrence, or to `TimedOut` once `threshold`
/// consecutive idle events have been seen. Data resets the idle count.
/// Events after a terminal state are ignored.
#[derive(Debug)]
pub struct PromptSeek<'p> {
    prompt: &'p Prompt,
    buffer: ResponseBuffer,
    idle: u32,
    threshold: u32,
    state: ReadState,
    prompt_match: Option<Range<usize>>,
    reads: usize,
}

impl<'p> PromptSeek<'p> {
    /// Start searching for `prompt`, giving up after `threshold` idle reads.
    pub fn new(prompt: &'p Prompt, threshold: u32) -> Self {
        Self {
            prompt,
            buffer: ResponseBuffer::new(),
            idle: 0,
            threshold,
            state: ReadState::Reading,
            prompt_match: None,
            reads: 0,
        }
    }

    /// Append a chunk and check for the prompt.
    pub fn on_data(&mut self, chunk: &[u8]) -> ReadState {
        if self.state.is_finished() {
            return self.state;
        }
        self.reads += 1;

        // Everything before `searched` is known prompt-free; back up enough
        // to catch a prompt split across reads.
        let searched = self.buffer.len();
        self.buffer.extend(chunk);
        let from = searched.saturating_sub(self.prompt.len() - 1);

        match self.buffer.find_prompt_from(from, self.prompt) {
            Some(range) => {
                self.prompt_match = Some(range);
                self.state = ReadState::PromptMatched;
            }
            None => self.idle = 0,
        }
        self.state
    }

    /// Record a read that returned nothing.
    pub fn on_idle(&mut self) -> ReadState {
        if self.state.is_finished() {
            return self.state;
        }
        self.reads += 1;
        self.idle += 1;
        if self.idle >= self.threshold {
            self.state = ReadState::TimedOut;
        }
        self.state
    }

    /// Current state.
    pub fn state(&self) -> ReadState {
        self.state
    }

    /// Bytes accumulated so far.
    pub fn buffer(&self) -> &ResponseBuffer {
        &self.buffer
    }

    /// End the search and hand over the buffer.
    pub fn finish(self) -> ReadOutcome {
        ReadOutcome {
            data: self.buffer.freeze(),
            state: self.state,
            prompt_match: self.prompt_match,
            reads: self.reads,
        }
    }
}

/// Result of a prompt search.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    /// Every byte received during the cycle.
    pub data: Bytes,

    /// How the search ended.
    pub state: ReadState,

    /// Position of the first prompt occurrence, if matched.
    pub prompt_match: Option<Range<usize>>,

    /// Number of reads performed, empty ones included.
    pub reads: usize,
}

impl ReadOutcome {
    /// Whether the prompt was seen.
    pub fn prompt_matched(&self) -> bool {
        self.state == ReadState::PromptMatched
    }

    /// Output up to and including the first prompt, or everything on timeout.
    pub fn through_prompt(&self) -> &[u8] {
        match &self.prompt_match {
            Some(range) => &self.data[..range.end],
            None => &self.data,
        }
    }

    /// Output before the first prompt, or everything on timeout.
    pub fn before_prompt(&self) -> &[u8] {
        match &self.prompt_match {
            Some(range) => &self.data[..range.start],
            None => &self.data,
        }
    }

    /// The data as a string (lossy UTF-8).
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

/// Read and discard until the device has been quiet for
/// `drain_idle_reads` consecutive reads. Returns the number of bytes dropped.
pub async fn drain<S: ByteStream>(stream: &mut S, config: &ReaderConfig) -> Result<usize> {
    let mut scratch = vec![0u8; config.chunk_size];
    let mut state = Drain::new(config.drain_idle_reads);

    while !state.is_finished() {
        let n = stream.read(&mut scratch).await?;
        if n > 0 {
            state.on_data(n);
        } else {
            state.on_idle();
        }
    }

    debug!(
        "drained {} bytes in {} reads",
        state.discarded(),
        state.reads()
    );
    Ok(state.discarded())
}

/// Accumulate output until `prompt` appears or the device stays quiet for
/// `prompt_idle_reads` consecutive reads.
///
/// A timeout is not an error: the outcome carries whatever arrived, with
/// [`ReadState::TimedOut`].
pub async fn read_until_prompt<S: ByteStream>(
    stream: &mut S,
    prompt: &Prompt,
    config: &ReaderConfig,
) -> Result<ReadOutcome> {
    let mut scratch = vec![0u8; config.chunk_size];
    let mut seek = PromptSeek::new(prompt, config.prompt_idle_reads);

    loop {
        let n = stream.read(&mut scratch).await?;
        let state = if n > 0 {
            trace!("chunk: {} bytes, buffer: {} bytes", n, seek.buffer().len() + n);
            seek.on_data(&scratch[..n])
        } else {
            seek.on_idle()
        };

        match state {
            ReadState::Reading if n == 0 => tokio::time::sleep(config.idle_backoff).await,
            ReadState::Reading => {}
            ReadState::PromptMatched => {
                debug!("prompt {:?} matched after {} bytes", prompt.as_str(), seek.buffer().len());
                break;
            }
            ReadState::TimedOut if seek.buffer().is_empty() => {
                warn!(
                    "device silent for {} reads, prompt {:?} never seen",
                    config.prompt_idle_reads,
                    prompt.as_str()
                );
                break;
            }
            ReadState::TimedOut => {
                warn!(
                    "prompt {:?} not seen after {} idle reads, keeping {} bytes",
                    prompt.as_str(),
                    config.prompt_idle_reads,
                    seek.buffer().len()
                );
                break;
            }
        }
    }

    Ok(seek.finish())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::io;

    use super::*;
    use crate::error::{Error, TransportError};

    /// One scripted read result.
    #[derive(Debug)]
    pub(crate) enum Step {
        Data(&'static [u8]),
        Quiet,
        Fail,
    }

    /// In-memory console: replays scripted reads, records writes.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedStream {
        pub steps: VecDeque<Step>,
        pub reads: usize,
        pub written: Vec<u8>,
        pub flushes: usize,
        pub closed: Option<std::sync::Arc<std::sync::atomic::AtomicBool>>,
        pub fail_close: bool,
    }

    impl ScriptedStream {
        pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                steps: steps.into_iter().collect(),
                ..Default::default()
            }
        }
    }

    impl ByteStream for ScriptedStream {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            self.reads += 1;
            match self.steps.pop_front() {
                Some(Step::Data(data)) => {
                    assert!(data.len() <= buf.len(), "scripted chunk larger than read");
                    buf[..data.len()].copy_from_slice(data);
                    Ok(data.len())
                }
                Some(Step::Fail) => Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "device unplugged",
                ))
                .into()),
                // Running off the script looks like a silent device
                Some(Step::Quiet) | None => Ok(0),
            }
        }

        async fn write(&mut self, data: &[u8]) -> Result<usize> {
            self.written.extend_from_slice(data);
            Ok(data.len())
        }

        async fn flush(&mut self) -> Result<()> {
            self.flushes += 1;
            Ok(())
        }

        async fn close(self) -> Result<()> {
            if let Some(flag) = &self.closed {
                flag.store(true, std::sync::atomic::Ordering::SeqCst);
            }
            if self.fail_close {
                return Err(TransportError::Io(io::Error::other("close failed")).into());
            }
            Ok(())
        }
    }

    fn prompt() -> Prompt {
        Prompt::new("<H3C>").unwrap()
    }

    #[test]
    fn test_drain_needs_consecutive_idle() {
        let mut drain = Drain::new(2);
        drain.on_idle();
        assert!(!drain.is_finished());
        drain.on_data(10);
        drain.on_idle();
        assert!(!drain.is_finished());
        drain.on_idle();
        assert!(drain.is_finished());
        assert_eq!(drain.discarded(), 10);
        assert_eq!(drain.reads(), 4);
    }

    #[test]
    fn test_seek_state_machine() {
        let prompt = prompt();
        let mut seek = PromptSeek::new(&prompt, 3);
        assert_eq!(seek.state(), ReadState::Reading);
        assert_eq!(seek.on_idle(), ReadState::Reading);
        assert_eq!(seek.on_idle(), ReadState::Reading);
        // Data resets the idle count
        assert_eq!(seek.on_data(b"Slot 1"), ReadState::Reading);
        assert_eq!(seek.on_idle(), ReadState::Reading);
        assert_eq!(seek.on_idle(), ReadState::Reading);
        assert_eq!(seek.on_data(b"\r\n<H3C>"), ReadState::PromptMatched);
        // Terminal states are sticky
        assert_eq!(seek.on_idle(), ReadState::PromptMatched);
        assert_eq!(seek.on_data(b"more"), ReadState::PromptMatched);

        let outcome = seek.finish();
        assert_eq!(&outcome.data[..], b"Slot 1\r\n<H3C>");
        assert_eq!(outcome.prompt_match, Some(8..13));
        assert_eq!(outcome.reads, 6);
    }

    #[test]
    fn test_seek_prompt_split_across_reads() {
        let prompt = prompt();
        let mut seek = PromptSeek::new(&prompt, 10);
        assert_eq!(seek.on_data(b"done\r\n<H"), ReadState::Reading);
        assert_eq!(seek.on_data(b"3"), ReadState::Reading);
        assert_eq!(seek.on_data(b"C>"), ReadState::PromptMatched);
        assert_eq!(seek.finish().prompt_match, Some(6..11));
    }

    #[test]
    fn test_seek_reports_first_occurrence() {
        let prompt = prompt();
        let mut seek = PromptSeek::new(&prompt, 10);
        seek.on_data(b"a<H3C>b<H3C>");
        let outcome = seek.finish();
        assert_eq!(outcome.prompt_match, Some(1..6));
        assert_eq!(outcome.through_prompt(), b"a<H3C>");
        assert_eq!(outcome.before_prompt(), b"a");
        // Nothing received is thrown away
        assert_eq!(&outcome.data[..], b"a<H3C>b<H3C>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_stops_on_matching_read() {
        let mut stream = ScriptedStream::new([
            Step::Data(b"display device\r\n"),
            Step::Quiet,
            Step::Data(b"Slot 1  Normal\r\n"),
            Step::Data(b"<H3C>"),
            Step::Data(b"never read"),
        ]);

        let outcome = read_until_prompt(&mut stream, &prompt(), &ReaderConfig::default())
            .await
            .unwrap();

        assert_eq!(outcome.state, ReadState::PromptMatched);
        assert_eq!(
            &outcome.data[..],
            b"display device\r\nSlot 1  Normal\r\n<H3C>"
        );
        assert_eq!(stream.reads, 4);
        assert_eq!(stream.steps.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_times_out_with_partial_output() {
        let mut stream = ScriptedStream::new([
            Step::Data(b"Slot 1"),
            Step::Quiet,
            Step::Data(b" Normal"),
        ]);
        let config = ReaderConfig::default();

        let start = tokio::time::Instant::now();
        let outcome = read_until_prompt(&mut stream, &prompt(), &config)
            .await
            .unwrap();

        assert_eq!(outcome.state, ReadState::TimedOut);
        assert_eq!(&outcome.data[..], b"Slot 1 Normal");
        assert_eq!(outcome.prompt_match, None);
        assert_eq!(outcome.through_prompt(), b"Slot 1 Normal");
        // 3 data-ish reads then 10 consecutive empty ones
        assert_eq!(stream.reads, 13);
        // One backoff for the early gap, nine before the final empty read
        assert_eq!(start.elapsed(), config.idle_backoff * 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_times_out_empty() {
        let mut stream = ScriptedStream::new([]);
        let outcome = read_until_prompt(&mut stream, &prompt(), &ReaderConfig::default())
            .await
            .unwrap();

        assert_eq!(outcome.state, ReadState::TimedOut);
        assert!(outcome.data.is_empty());
        assert_eq!(stream.reads, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_error_is_fatal() {
        let mut stream = ScriptedStream::new([Step::Data(b"Slot"), Step::Fail]);
        let err = read_until_prompt(&mut stream, &prompt(), &ReaderConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Io(_))));
    }

    #[tokio::test]
    async fn test_drain_stops_after_two_empty_reads() {
        let mut stream = ScriptedStream::new([
            Step::Data(b"\r\n<H3C>"),
            Step::Quiet,
            Step::Data(b"screen-length disable\r\n"),
            Step::Data(b"<H3C>"),
            Step::Quiet,
            Step::Quiet,
            Step::Data(b"left for the next command"),
        ]);

        let discarded = drain(&mut stream, &ReaderConfig::default()).await.unwrap();

        assert_eq!(discarded, 35);
        assert_eq!(stream.reads, 6);
        assert_eq!(stream.steps.len(), 1);
    }

    #[tokio::test]
    async fn test_drain_on_silent_device() {
        let mut stream = ScriptedStream::new([]);
        let discarded = drain(&mut stream, &ReaderConfig::default()).await.unwrap();
        assert_eq!(discarded, 0);
        assert_eq!(stream.reads, 2);
    }

    #[test]
    fn test_config_validation() {
        assert!(ReaderConfig::default().validate().is_ok());

        let config = ReaderConfig {
            prompt_idle_reads: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DriverError::InvalidConfig { .. })
        ));
    }
}
