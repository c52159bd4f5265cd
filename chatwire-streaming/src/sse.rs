//! Server-Sent Events (SSE) line parsing.
//!
//! Completion endpoints send one `data: <json>` line per event and a final
//! `data: [DONE]` sentinel. Parsing is line-oriented: each complete line is
//! turned into at most one [`SseFrame`], and a line whose payload is not
//! valid JSON becomes [`SseFrame::Malformed`] instead of an error.

use crate::error::{StreamError, StreamResult};
use bytes::{Bytes, BytesMut};
use futures::{ready, Stream};
use pin_project_lite::pin_project;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Default bound on the unterminated line buffer.
pub const MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;

const DONE_MARKER: &str = "[DONE]";

/// One parsed SSE data line.
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    /// The `[DONE]` sentinel.
    Done,
    /// The payload was not valid JSON.
    Malformed {
        /// Parser error message.
        error: String,
        /// The offending payload.
        data: String,
    },
    /// A parsed JSON event.
    Event(Value),
}

impl SseFrame {
    /// Check if this is the `[DONE]` sentinel.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// The JSON payload, if this frame carries one.
    #[must_use]
    pub fn event(&self) -> Option<&Value> {
        match self {
            Self::Event(value) => Some(value),
            _ => None,
        }
    }
}

/// Parse one line of an SSE body.
///
/// Returns `None` for blank lines, comments and non-`data:` fields.
pub fn parse_sse_line(line: &str) -> Option<SseFrame> {
    let payload = line.trim().strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }
    if payload == DONE_MARKER {
        return Some(SseFrame::Done);
    }

    match serde_json::from_str(payload) {
        Ok(value) => Some(SseFrame::Event(value)),
        Err(e) => {
            tracing::warn!("Failed to parse SSE chunk: {} - data: {}", e, payload);
            Some(SseFrame::Malformed {
                error: e.to_string(),
                data: payload.to_string(),
            })
        }
    }
}

/// Rolling buffer that splits incoming chunks into complete lines.
///
/// Bytes are kept undecoded until a newline arrives, so a multi-byte UTF-8
/// sequence split across chunks is decoded intact.
#[derive(Debug)]
pub struct SseLineBuffer {
    buffer: BytesMut,
    /// Prefix of `buffer` already known to hold no newline.
    scanned: usize,
    max_size: usize,
}

impl Default for SseLineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SseLineBuffer {
    /// Create a buffer with the default bound.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_size(MAX_BUFFER_SIZE)
    }

    /// Create a buffer with a custom bound.
    #[must_use]
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            scanned: 0,
            max_size,
        }
    }

    /// Append a chunk and parse every line it completes.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::BufferOverflow`] when the unterminated tail
    /// grows past the bound.
    pub fn push(&mut self, chunk: &[u8]) -> StreamResult<Vec<SseFrame>> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let pos = self.scanned + offset;
            self.scanned = 0;
            let line = self.buffer.split_to(pos + 1);
            let text = String::from_utf8_lossy(&line[..pos]);
            if let Some(frame) = parse_sse_line(&text) {
                frames.push(frame);
            }
        }
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.max_size {
            self.buffer.clear();
            self.scanned = 0;
            return Err(StreamError::BufferOverflow { max: self.max_size });
        }

        Ok(frames)
    }

    /// Append a string chunk.
    ///
    /// # Errors
    ///
    /// Same as [`SseLineBuffer::push`].
    pub fn push_str(&mut self, chunk: &str) -> StreamResult<Vec<SseFrame>> {
        self.push(chunk.as_bytes())
    }

    /// Give any leftover text one last parse at end of stream.
    ///
    /// A leftover without its own `data:` prefix is parsed as
    /// `"data: " + leftover`.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        let text = String::from_utf8_lossy(&rest);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if text.starts_with("data:") {
            parse_sse_line(text)
        } else {
            parse_sse_line(&format!("data: {text}"))
        }
    }

    /// Number of buffered bytes not yet terminated by a newline.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

pin_project! {
    /// Stream adapter that turns a byte stream into SSE frames.
    ///
    /// The first transport error or buffer overflow is yielded once and
    /// ends the stream.
    pub struct SseFrameStream<S> {
        #[pin]
        inner: S,
        buffer: SseLineBuffer,
        pending: VecDeque<SseFrame>,
        finished: bool,
    }
}

impl<S> SseFrameStream<S> {
    /// Create a new frame stream from a byte stream.
    pub fn new(inner: S) -> Self {
        Self::with_buffer(inner, SseLineBuffer::new())
    }

    /// Create a frame stream with a preconfigured line buffer.
    pub fn with_buffer(inner: S, buffer: SseLineBuffer) -> Self {
        Self {
            inner,
            buffer,
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

impl<S> fmt::Debug for SseFrameStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseFrameStream")
            .field("buffer", &self.buffer)
            .field("pending", &self.pending.len())
            .field("finished", &self.finished)
            .finish()
    }
}

impl<S, E> Stream for SseFrameStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: fmt::Display,
{
    type Item = StreamResult<SseFrame>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(frame) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(frame)));
            }
            if *this.finished {
                return Poll::Ready(None);
            }

            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(bytes)) => match this.buffer.push(&bytes) {
                    Ok(frames) => this.pending.extend(frames),
                    Err(error) => {
                        *this.finished = true;
                        return Poll::Ready(Some(Err(error)));
                    }
                },
                Some(Err(e)) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(StreamError::transport(e))));
                }
                None => {
                    *this.finished = true;
                    this.pending.extend(this.buffer.finish());
                }
            }
        }
    }
}
