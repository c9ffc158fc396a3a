//! Trait abstraction for line-oriented telemetry sources to enable testing

use async_trait::async_trait;
use bytes::BytesMut;
use std::io;

/// Trait for reading framed text lines from the telemetry link
#[async_trait]
pub trait LineSource: Send {
    /// Next complete line, `None` once the source is exhausted.
    ///
    /// Implementations must be cancel-safe: dropping the returned future
    /// may not lose bytes that already arrived.
    async fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Splits a raw byte stream into trimmed text lines.
///
/// Bytes are appended as they arrive from the transport; a line pops once
/// its `\n` terminator is in. Carriage returns and surrounding whitespace
/// are trimmed away. Invalid UTF-8 is replaced instead of rejected so one
/// mangled byte cannot stall the stream.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: BytesMut,
}

impl LineFramer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
        }
    }

    /// Append raw bytes from the transport.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Buffer for the transport to read into directly.
    pub fn buffer(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Pop the next complete line, if one is buffered.
    pub fn pop_line(&mut self) -> Option<String> {
        let newline = self.buf.iter().position(|&b| b == b'\n')?;
        let raw = self.buf.split_to(newline + 1);
        Some(String::from_utf8_lossy(&raw).trim().to_string())
    }

    /// Drain whatever is left as a final unterminated line.
    ///
    /// Used at end of stream; returns `None` when only whitespace remains.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let raw = self.buf.split();
        let line = String::from_utf8_lossy(&raw).trim().to_string();
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Mock line source for testing
    #[derive(Clone)]
    pub struct MockLineSource {
        pub lines: Arc<Mutex<VecDeque<String>>>,
        pub final_error: Arc<Mutex<Option<String>>>,
    }

    impl MockLineSource {
        pub fn with_lines(lines: Vec<&str>) -> Self {
            Self {
                lines: Arc::new(Mutex::new(
                    lines.into_iter().map(String::from).collect(),
                )),
                final_error: Arc::new(Mutex::new(None)),
            }
        }

        /// Report a read error once the scripted lines run out,
        /// instead of a clean end of stream.
        pub fn fail_after_lines(&mut self, message: &str) {
            *self.final_error.lock().unwrap() = Some(message.to_string());
        }
    }

    #[async_trait]
    impl LineSource for MockLineSource {
        async fn next_line(&mut self) -> io::Result<Option<String>> {
            if let Some(line) = self.lines.lock().unwrap().pop_front() {
                return Ok(Some(line));
            }
            if let Some(message) = self.final_error.lock().unwrap().take() {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, message));
            }
            Ok(None)
        }
    }
}
