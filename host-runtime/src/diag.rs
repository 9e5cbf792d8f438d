//! Diagnostic channel
//!
//! Formats and emits error/info text through an [`OutputSink`] supplied by
//! the embedder. Emission never fails and never allocates past a bounded
//! message length: overly long text is truncated, not overflowed.

use crate::config::DIAG_TRUNCATE_AT;

/// Output channel selector, mirroring the stdout/stderr split of the
/// embedder's write primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Informational text
    Info,
    /// Error text
    Error,
}

/// Character-output sink provided by the embedding host
///
/// Implementations must not panic; the returned count is the number of
/// bytes actually consumed and is currently only informational.
pub trait OutputSink {
    /// Write `bytes` to the given channel, returning the count consumed
    fn write(&mut self, channel: Channel, bytes: &[u8]) -> usize;
}

/// Sink that routes diagnostics to the `log` facade
///
/// The default sink for embedders that already carry a logger.
#[derive(Debug, Default)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn write(&mut self, channel: Channel, bytes: &[u8]) -> usize {
        let text = String::from_utf8_lossy(bytes);
        match channel {
            Channel::Info => log::info!("{text}"),
            Channel::Error => log::error!("{text}"),
        }
        bytes.len()
    }
}

/// Sink that captures emitted messages in memory
///
/// Useful for tests and for embedders that forward diagnostics elsewhere.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Captured (channel, message) pairs in emission order
    pub entries: Vec<(Channel, String)>,
}

impl OutputSink for MemorySink {
    fn write(&mut self, channel: Channel, bytes: &[u8]) -> usize {
        self.entries
            .push((channel, String::from_utf8_lossy(bytes).into_owned()));
        bytes.len()
    }
}

/// Bounded formatter in front of an [`OutputSink`]
pub struct DiagnosticChannel {
    sink: Box<dyn OutputSink>,
    truncate_at: usize,
}

impl DiagnosticChannel {
    /// Creates a channel over `sink`, truncating messages at `truncate_at` bytes
    pub fn new(sink: Box<dyn OutputSink>, truncate_at: usize) -> Self {
        Self { sink, truncate_at }
    }

    /// Emit error text
    pub fn error(&mut self, message: &str) {
        self.emit(Channel::Error, message);
    }

    /// Emit informational text
    pub fn info(&mut self, message: &str) {
        self.emit(Channel::Info, message);
    }

    fn emit(&mut self, channel: Channel, message: &str) {
        let mut end = self.truncate_at.min(message.len());
        // Back off to a char boundary so truncation stays valid UTF-8
        while end > 0 && !message.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        self.sink.write(channel, message[..end].as_bytes());
    }
}

impl Default for DiagnosticChannel {
    fn default() -> Self {
        Self::new(Box::new(LogSink), DIAG_TRUNCATE_AT)
    }
}
