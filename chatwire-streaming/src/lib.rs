//! # chatwire-streaming
//!
//! SSE frame parsing for OpenAI-compatible completion streams.
//!
//! - [`parse_sse_line`] turns one `data:` line into an [`SseFrame`]
//! - [`SseLineBuffer`] splits arbitrary chunks into complete lines
//! - [`SseFrameStream`] adapts any `Stream<Item = Result<Bytes, E>>`
//!
//! ## Example
//!
//! ```rust
//! use chatwire_streaming::{SseFrame, SseLineBuffer};
//!
//! let mut buffer = SseLineBuffer::new();
//! let frames = buffer.push_str("data: {\"x\":1}\n\ndata: [DONE]\n").unwrap();
//! assert_eq!(frames.len(), 2);
//! assert!(frames[1].is_done());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod sse;

pub use error::{StreamError, StreamResult};
pub use sse::{parse_sse_line, SseFrame, SseFrameStream, SseLineBuffer, MAX_BUFFER_SIZE};
